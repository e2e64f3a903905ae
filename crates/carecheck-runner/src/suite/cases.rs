//! The case table: what each case calls and what it expects back

use std::collections::BTreeMap;

use carecheck_core::{ConfigError, Expectations, Operation, Params};
use serde_json::Value;

/// Inputs a case draws on to build its endpoint and expectations.
pub struct CaseContext<'a> {
    pub params: &'a Params,
    pub site_url: &'a str,
    pub expect: &'a BTreeMap<String, i64>,
}

impl CaseContext<'_> {
    fn param(&self, key: &str) -> Result<&str, ConfigError> {
        self.params.require(key)
    }

    fn site(&self, path: &str) -> String {
        format!("{}{path}", self.site_url.trim_end_matches('/'))
    }

    /// Expectation value for a parameter: a number when it parses as one.
    fn param_value(&self, key: &str) -> Option<Value> {
        let raw = self.params.get(key)?;
        Some(match raw.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(raw),
        })
    }
}

pub type EndpointFn = fn(&CaseContext<'_>) -> Result<String, ConfigError>;
pub type ExpectFn = fn(&CaseContext<'_>) -> Expectations;

pub enum Steps {
    /// One call, validated and asserted
    Single {
        operation: Operation,
        endpoint: EndpointFn,
        expect: ExpectFn,
    },
    /// Search a patient by name, then fetch that patient's clinical notes
    PatientNotes,
}

pub struct Case {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameters read from `[params]`
    pub params: &'static [&'static str],
    pub steps: Steps,
}

impl Case {
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        match &self.steps {
            Steps::Single { operation, .. } => vec![*operation],
            Steps::PatientNotes => vec![Operation::SearchPatient, Operation::GetPatientNotes],
        }
    }

    /// Endpoint of the first call.
    pub(crate) fn first_endpoint(&self, ctx: &CaseContext<'_>) -> Result<String, ConfigError> {
        match &self.steps {
            Steps::Single { endpoint, .. } => endpoint(ctx),
            Steps::PatientNotes => patient_search_endpoint(ctx),
        }
    }
}

/// `path?k=v&..` with keys and values form-encoded.
pub(crate) fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    // Only the query of the scratch URL is kept.
    match reqwest::Url::parse_with_params("http://localhost/", pairs) {
        Ok(url) => format!("{path}?{}", url.query().unwrap_or_default()),
        Err(_) => path.to_string(),
    }
}

fn nothing(_: &CaseContext<'_>) -> Expectations {
    Expectations::new()
}

pub(crate) fn patient_search_endpoint(ctx: &CaseContext<'_>) -> Result<String, ConfigError> {
    Ok(with_query(
        "/Patient/SearchRegisteredPatient",
        &[("search", ctx.param("patientName")?)],
    ))
}

pub(crate) fn patient_notes_endpoint(patient_id: i64) -> String {
    with_query("/Clinical/PatientNotes", &[("patientId", &patient_id.to_string())])
}

/// All cases in run order.
pub static CASES: [Case; 16] = [
    Case {
        name: "all_departments",
        description: "Every department has an id and a name",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetAllDepartments,
            endpoint: |_| Ok("/AssetReports/GetAllDepartments".into()),
            expect: nothing,
        },
    },
    Case {
        name: "all_items",
        description: "Every asset item has an id and a name",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetAllItems,
            endpoint: |_| Ok("/AssetReports/GetAllItems".into()),
            expect: nothing,
        },
    },
    Case {
        name: "incentive_summary",
        description: "Doctor incentive summary lists prescribers with amounts",
        params: &["IncSummFromDate", "IncSummToDate", "IsRefferalOnly"],
        steps: Steps::Single {
            operation: Operation::GetIncentiveSummaryReport,
            endpoint: |ctx| {
                Ok(ctx.site(&with_query(
                    "/BillingReports/INCTV_DocterSummary",
                    &[
                        ("FromDate", ctx.param("IncSummFromDate")?),
                        ("ToDate", ctx.param("IncSummToDate")?),
                        ("IsRefferalOnly", ctx.param("IsRefferalOnly")?),
                    ],
                )))
            },
            expect: nothing,
        },
    },
    Case {
        name: "incentive_referral_summary",
        description: "Referral incentive summary lists prescribers with amounts",
        params: &["IncFromDate", "IncToDate", "DocSumIsRefferalOnly"],
        steps: Steps::Single {
            operation: Operation::GetIncReffSummReport,
            endpoint: |ctx| {
                Ok(ctx.site(&with_query(
                    "/BillingReports/INCTV_DocterSummary",
                    &[
                        ("FromDate", ctx.param("IncFromDate")?),
                        ("ToDate", ctx.param("IncToDate")?),
                        ("IsRefferalOnly", ctx.param("DocSumIsRefferalOnly")?),
                    ],
                )))
            },
            expect: nothing,
        },
    },
    Case {
        name: "hospital_income_incentive",
        description: "Hospital income report has sales and income per service department",
        params: &["IncFromDate", "IncToDate", "ServiceDepartments"],
        steps: Steps::Single {
            operation: Operation::GetHospIncIncReport,
            endpoint: |ctx| {
                Ok(ctx.site(&with_query(
                    "/Reporting/HospitalIncomeIncentiveReport",
                    &[
                        ("FromDate", ctx.param("IncFromDate")?),
                        ("ToDate", ctx.param("IncToDate")?),
                        ("ServiceDepartments", ctx.param("ServiceDepartments")?),
                    ],
                )))
            },
            expect: nothing,
        },
    },
    Case {
        name: "employee_bill_items",
        description: "Incentive info of the requested employee",
        params: &["employeeId"],
        steps: Steps::Single {
            operation: Operation::GetEmpBillItem,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Incentive/EmployeeBillItems",
                    &[("employeeId", ctx.param("employeeId")?)],
                ))
            },
            expect: |ctx| {
                let mut e = Expectations::new();
                if let Some(v) = ctx.param_value("employeeId") {
                    e.insert("EmployeeId", v);
                }
                e
            },
        },
    },
    Case {
        name: "inventory_fiscal_years",
        description: "Fiscal years have names, dates and an active flag",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetInvntryFiscalYrs,
            endpoint: |_| Ok("/Inventory/InventoryFiscalYears".into()),
            expect: nothing,
        },
    },
    Case {
        name: "active_inventory",
        description: "Active stores have an id, a name and a description",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetActInventory,
            endpoint: |_| Ok("/ActivateInventory/".into()),
            expect: nothing,
        },
    },
    Case {
        name: "inventory_subcategories",
        description: "Inventory subcategories have an id and a name",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetInvSubCat,
            endpoint: |_| Ok("/Inventory/SubCategories".into()),
            expect: nothing,
        },
    },
    Case {
        name: "available_quantity",
        description: "Available quantity of the requested item in the requested store",
        params: &["itemId", "storeId"],
        steps: Steps::Single {
            operation: Operation::GetAvlQtyByStoreId,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Inventory/AvailableQuantityByItemIdAndStoreId",
                    &[
                        ("itemId", ctx.param("itemId")?),
                        ("storeId", ctx.param("storeId")?),
                    ],
                ))
            },
            expect: |ctx| {
                let mut e = Expectations::new();
                if let Some(v) = ctx.param_value("itemId") {
                    e.insert("ItemId", v);
                }
                if let Some(v) = ctx.param_value("storeId") {
                    e.insert("StoreId", v);
                }
                e
            },
        },
    },
    Case {
        name: "referrers",
        description: "Referring doctors are listed once each",
        params: &[],
        steps: Steps::Single {
            operation: Operation::GetReferrersFromEmployeeSettings,
            endpoint: |_| Ok("/EmployeeSettings/Referrers".into()),
            expect: nothing,
        },
    },
    Case {
        name: "lab_bill_items",
        description: "Service items of a department have unique price and department ids",
        params: &["departmentName"],
        steps: Steps::Single {
            operation: Operation::GetLabBillCfgItemsByDepartmentName,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Billing/LabBillCfgItems",
                    &[("departmentName", ctx.param("departmentName")?)],
                ))
            },
            expect: nothing,
        },
    },
    Case {
        name: "patient_visit_context",
        description: "Current visit context echoes the requested patient and visit",
        params: &["patientId", "visitId"],
        steps: Steps::Single {
            operation: Operation::GetPatientCurrentVisitContextByPatientIdAndVisitId,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Visit/PatientCurrentVisitContext",
                    &[
                        ("patientId", ctx.param("patientId")?),
                        ("visitId", ctx.param("visitId")?),
                    ],
                ))
            },
            expect: |ctx| {
                let mut e = Expectations::new();
                if let Some(v) = ctx.param_value("patientId") {
                    e.insert("PatientId", v);
                }
                if let Some(v) = ctx.param_value("visitId") {
                    e.insert("PatientVisitId", v);
                }
                e
            },
        },
    },
    Case {
        name: "patient_billing_context",
        description: "Billing context belongs to the expected patient",
        params: &["patientId"],
        steps: Steps::Single {
            operation: Operation::GetPatientBillingContextByPatientId,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Billing/PatientBillingContext",
                    &[("patientId", ctx.param("patientId")?)],
                ))
            },
            expect: |ctx| {
                let expected = match ctx.expect.get("billing_patient_id") {
                    Some(id) => Some(Value::from(*id)),
                    None => ctx.param_value("patientId"),
                };
                let mut e = Expectations::new();
                if let Some(v) = expected {
                    e.insert("PatientId", v);
                }
                e
            },
        },
    },
    Case {
        name: "patient_notes",
        description: "Clinical notes of the patient found by name",
        params: &["patientName"],
        steps: Steps::PatientNotes,
    },
    Case {
        name: "admitted_patients",
        description: "Admitted patients carry bed information with an admission or transfer action",
        params: &["admissionStatus"],
        steps: Steps::Single {
            operation: Operation::GetAdmittedPatientsData,
            endpoint: |ctx| {
                Ok(with_query(
                    "/Admission/AdmittedPatientsData",
                    &[("admissionStatus", ctx.param("admissionStatus")?)],
                ))
            },
            expect: nothing,
        },
    },
];

/// Every parameter any case reads, deduplicated.
#[must_use]
pub fn required_params() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = CASES.iter().flat_map(|c| c.params.iter().copied()).collect();
    names.sort_unstable();
    names.dedup();
    names
}
