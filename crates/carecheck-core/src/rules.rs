//! Declarative per-operation schema rules
//!
//! One [`SchemaRule`] per operation name, held in a [`RuleRegistry`].
//! Supporting a new operation means inserting a new rule.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::operation::Operation;
use crate::response::{ResultShape, STATUS_FIELD};

/// Expected JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Integral JSON number
    Integer,
    /// Any JSON number
    Number,
    String,
    Bool,
    Array,
    Object,
}

impl ValueKind {
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type name of an arbitrary value, for diagnostics.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Constraints on one field of every result record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Field name; dotted for nested objects (`BedInformation.BedId`)
    pub path: String,
    /// Expected type, if any
    pub kind: Option<ValueKind>,
    /// Value must not repeat across records (list results only)
    pub unique: bool,
    /// Value must equal the caller-supplied expectation for this field
    pub match_expected: bool,
    /// Allowed values; empty means unrestricted
    pub one_of: Vec<Value>,
}

impl FieldRule {
    /// A field that must be present and non-null.
    pub fn required(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: None,
            unique: false,
            match_expected: false,
            one_of: Vec::new(),
        }
    }

    pub fn integer(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::Integer)
    }

    pub fn number(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::Number)
    }

    pub fn string(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::String)
    }

    pub fn boolean(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::Bool)
    }

    pub fn array(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::Array)
    }

    pub fn object(path: impl Into<String>) -> Self {
        Self::required(path).of_kind(ValueKind::Object)
    }

    #[must_use]
    pub fn of_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn match_expected(mut self) -> Self {
        self.match_expected = true;
        self
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Expected shape of one operation's response.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRule {
    pub operation: String,
    pub shape: ResultShape,
    /// Payload fields that must be present at the top level
    pub top_level: Vec<String>,
    /// Per-record field constraints
    pub fields: Vec<FieldRule>,
}

impl SchemaRule {
    /// A rule requiring only the `Status` top-level field.
    pub fn new(operation: impl Into<String>, shape: ResultShape) -> Self {
        Self {
            operation: operation.into(),
            shape,
            top_level: vec![STATUS_FIELD.to_string()],
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    #[must_use]
    pub fn fields(mut self, rules: impl IntoIterator<Item = FieldRule>) -> Self {
        self.fields.extend(rules);
        self
    }
}

/// Rule table keyed by operation name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, SchemaRule>,
}

impl RuleRegistry {
    /// One rule for every operation in the catalog.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for op in Operation::ALL {
            registry.insert(builtin_rule(op));
        }
        registry
    }

    /// Add or replace the rule for `rule.operation`.
    pub fn insert(&mut self, rule: SchemaRule) -> Option<SchemaRule> {
        self.rules.insert(rule.operation.clone(), rule)
    }

    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&SchemaRule> {
        self.rules.get(operation)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn builtin_rule(op: Operation) -> SchemaRule {
    let rule = SchemaRule::new(op.name(), op.shape());
    match op {
        Operation::GetAllDepartments => rule.fields([
            FieldRule::integer("DepartmentId"),
            FieldRule::string("DepartmentName"),
        ]),
        Operation::GetAllItems => {
            rule.fields([FieldRule::integer("ItemId"), FieldRule::string("ItemName")])
        }
        Operation::GetIncentiveSummaryReport | Operation::GetIncReffSummReport => rule.fields([
            FieldRule::string("PrescriberName"),
            FieldRule::integer("PrescriberId"),
            FieldRule::number("DocTotalAmount"),
            FieldRule::number("TDSAmount"),
            FieldRule::number("NetPayableAmount"),
        ]),
        Operation::GetHospIncIncReport => rule.fields([
            FieldRule::integer("ServiceDepartmentId"),
            FieldRule::string("ServiceDepartmentName"),
            FieldRule::number("NetSales"),
            FieldRule::number("ReferralCommission"),
            FieldRule::number("GrossIncome"),
            FieldRule::number("OtherIncentive"),
            FieldRule::number("HospitalNetIncome"),
        ]),
        Operation::GetEmpBillItem => rule.fields([
            FieldRule::integer("EmployeeIncentiveInfoId"),
            FieldRule::integer("EmployeeId").match_expected(),
            FieldRule::string("FullName"),
            FieldRule::number("TDSPercent"),
            FieldRule::number("EmpTDSPercent"),
            FieldRule::boolean("IsActive"),
            FieldRule::array("EmployeeBillItemsMap"),
        ]),
        Operation::GetInvntryFiscalYrs => rule.fields([
            FieldRule::integer("FiscalYearId"),
            FieldRule::string("FiscalYearName"),
            FieldRule::string("StartDate"),
            FieldRule::string("EndDate"),
            FieldRule::boolean("IsActive"),
        ]),
        Operation::GetActInventory => rule.fields([
            FieldRule::integer("StoreId"),
            FieldRule::string("Name"),
            FieldRule::string("StoreDescription"),
        ]),
        Operation::GetInvSubCat => rule.fields([
            FieldRule::integer("SubCategoryId"),
            FieldRule::string("SubCategoryName"),
        ]),
        Operation::GetAvlQtyByStoreId => rule.fields([
            FieldRule::integer("ItemId").match_expected(),
            FieldRule::number("AvailableQuantity"),
            FieldRule::integer("StoreId").match_expected(),
        ]),
        Operation::GetReferrersFromEmployeeSettings => rule.fields([
            FieldRule::integer("EmployeeId").unique(),
            FieldRule::string("FullName"),
        ]),
        Operation::GetLabBillCfgItemsByDepartmentName => rule.fields([
            FieldRule::integer("BillItemPriceId").unique(),
            FieldRule::integer("ServiceDepartmentId").unique(),
        ]),
        Operation::GetPatientCurrentVisitContextByPatientIdAndVisitId => rule.fields([
            FieldRule::integer("PatientId").match_expected(),
            FieldRule::integer("PatientVisitId").match_expected(),
            FieldRule::integer("PerformerId"),
            FieldRule::string("VisitDate"),
        ]),
        Operation::GetPatientBillingContextByPatientId => {
            rule.field(FieldRule::integer("PatientId").match_expected())
        }
        Operation::SearchPatient => rule.field(FieldRule::integer("PatientId")),
        Operation::GetPatientNotes => rule.fields([
            FieldRule::integer("PatientId").match_expected(),
            FieldRule::integer("NotesId"),
            FieldRule::required("CreatedOn"),
        ]),
        Operation::GetAdmittedPatientsData => rule.fields([
            FieldRule::required("PatientId"),
            FieldRule::required("PatientAdmissionId"),
            FieldRule::required("AdmittedDate"),
            FieldRule::required("Name"),
            FieldRule::required("Gender"),
            FieldRule::required("Department"),
            FieldRule::required("AdmittingDoctorName"),
            FieldRule::object("BedInformation"),
            FieldRule::required("BedInformation.BedId"),
            FieldRule::required("BedInformation.Ward"),
            FieldRule::required("BedInformation.BedCode"),
            FieldRule::string("BedInformation.Action").one_of(["Admission", "Transfer"]),
        ]),
    }
}
