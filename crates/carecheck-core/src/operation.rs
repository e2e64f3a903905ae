//! Operation catalog: every named GET call the suite knows about

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::response::ResultShape;

/// A named, pre-defined GET call with a known result shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Operation {
    GetAllDepartments,
    GetAllItems,
    GetIncentiveSummaryReport,
    GetIncReffSummReport,
    GetHospIncIncReport,
    GetEmpBillItem,
    GetInvntryFiscalYrs,
    GetActInventory,
    GetInvSubCat,
    GetAvlQtyByStoreId,
    GetReferrersFromEmployeeSettings,
    GetLabBillCfgItemsByDepartmentName,
    GetPatientCurrentVisitContextByPatientIdAndVisitId,
    GetPatientBillingContextByPatientId,
    SearchPatient,
    GetPatientNotes,
    GetAdmittedPatientsData,
}

impl Operation {
    pub const ALL: [Self; 17] = [
        Self::GetAllDepartments,
        Self::GetAllItems,
        Self::GetIncentiveSummaryReport,
        Self::GetIncReffSummReport,
        Self::GetHospIncIncReport,
        Self::GetEmpBillItem,
        Self::GetInvntryFiscalYrs,
        Self::GetActInventory,
        Self::GetInvSubCat,
        Self::GetAvlQtyByStoreId,
        Self::GetReferrersFromEmployeeSettings,
        Self::GetLabBillCfgItemsByDepartmentName,
        Self::GetPatientCurrentVisitContextByPatientIdAndVisitId,
        Self::GetPatientBillingContextByPatientId,
        Self::SearchPatient,
        Self::GetPatientNotes,
        Self::GetAdmittedPatientsData,
    ];

    /// Canonical name, used to look up the operation's schema rule.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetAllDepartments => "getAllDepartments",
            Self::GetAllItems => "getAllItems",
            Self::GetIncentiveSummaryReport => "getIncentiveSummaryReport",
            Self::GetIncReffSummReport => "getIncReffSummReport",
            Self::GetHospIncIncReport => "getHospIncIncReport",
            Self::GetEmpBillItem => "getEmpBillItem",
            Self::GetInvntryFiscalYrs => "getInvntryFiscalYrs",
            Self::GetActInventory => "getActInventory",
            Self::GetInvSubCat => "getInvSubCat",
            Self::GetAvlQtyByStoreId => "getAvlQtyByStoreId",
            Self::GetReferrersFromEmployeeSettings => "getReferrersFromEmployeeSettings",
            Self::GetLabBillCfgItemsByDepartmentName => "getLabBillCfgItemsByDepartmentName",
            Self::GetPatientCurrentVisitContextByPatientIdAndVisitId => {
                "getPatientCurrentVisitContextByPatientIdAndVisitId"
            }
            Self::GetPatientBillingContextByPatientId => "getPatientBillingContextByPatientId",
            Self::SearchPatient => "searchPatient",
            Self::GetPatientNotes => "getPatientNotes",
            Self::GetAdmittedPatientsData => "getAdmittedPatientsData",
        }
    }

    /// Name of the facade wrapper implementing this operation.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::GetAllDepartments => "get_all_departments",
            Self::GetAllItems => "get_all_items",
            Self::GetIncentiveSummaryReport => "get_incentive_summary_report",
            Self::GetIncReffSummReport => "get_inc_reff_summ_report",
            Self::GetHospIncIncReport => "get_hosp_inc_inc_report",
            Self::GetEmpBillItem => "get_emp_bill_item",
            Self::GetInvntryFiscalYrs => "get_invntry_fiscal_yrs",
            Self::GetActInventory => "get_act_inventory",
            Self::GetInvSubCat => "get_inv_sub_cat",
            Self::GetAvlQtyByStoreId => "get_avl_qty_by_store_id",
            Self::GetReferrersFromEmployeeSettings => "get_referrers_from_employee_settings",
            Self::GetLabBillCfgItemsByDepartmentName => {
                "get_lab_bill_cfg_items_by_department_name"
            }
            Self::GetPatientCurrentVisitContextByPatientIdAndVisitId => {
                "get_patient_current_visit_context_by_patient_id_and_visit_id"
            }
            Self::GetPatientBillingContextByPatientId => {
                "get_patient_billing_context_by_patient_id"
            }
            Self::SearchPatient => "search_patient",
            Self::GetPatientNotes => "get_patient_notes",
            Self::GetAdmittedPatientsData => "get_admitted_patients_data",
        }
    }

    /// How the payload's `Results` field is exposed.
    #[must_use]
    pub const fn shape(self) -> ResultShape {
        match self {
            Self::GetIncentiveSummaryReport | Self::GetIncReffSummReport => {
                ResultShape::EmbeddedList
            }
            Self::GetEmpBillItem
            | Self::GetAvlQtyByStoreId
            | Self::GetPatientCurrentVisitContextByPatientIdAndVisitId
            | Self::GetPatientBillingContextByPatientId => ResultShape::Record,
            _ => ResultShape::List,
        }
    }

    /// Look up an operation by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Operation {0} is not recognized")]
pub struct UnknownOperation(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn names_and_method_names_are_unique() {
        let names: HashSet<_> = Operation::ALL.iter().map(|op| op.name()).collect();
        let methods: HashSet<_> = Operation::ALL.iter().map(|op| op.method_name()).collect();
        assert_eq!(names.len(), Operation::ALL.len());
        assert_eq!(methods.len(), Operation::ALL.len());
    }

    #[test]
    fn unknown_name_is_error() {
        let err = "getEverything".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "Operation getEverything is not recognized");
    }

    #[test]
    fn incentive_summaries_are_embedded() {
        assert_eq!(
            Operation::GetIncentiveSummaryReport.shape(),
            ResultShape::EmbeddedList
        );
        assert_eq!(Operation::GetIncReffSummReport.shape(), ResultShape::EmbeddedList);
        assert_eq!(Operation::GetHospIncIncReport.shape(), ResultShape::List);
    }

    #[test]
    fn record_shaped_operations() {
        let records: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| op.shape() == ResultShape::Record)
            .map(Operation::name)
            .collect();
        assert_eq!(
            records,
            vec![
                "getEmpBillItem",
                "getAvlQtyByStoreId",
                "getPatientCurrentVisitContextByPatientIdAndVisitId",
                "getPatientBillingContextByPatientId",
            ]
        );
    }
}
