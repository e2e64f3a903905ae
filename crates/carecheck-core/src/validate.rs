//! Schema validation of normalized responses
//!
//! Exhaustive, not short-circuiting: one call reports every missing,
//! duplicate, mismatched or mistyped field. Never panics on a malformed
//! response; the outcome is a [`ValidationReport`].

use std::collections::{BTreeMap, HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::{
    JSON_DATA_FIELD, NormalizedResponse, RESULTS_FIELD, ResultShape, embedded_json_data,
};
use crate::rules::{FieldRule, RuleRegistry, SchemaRule, json_type_name};
use crate::verdict::{Diagnostic, DiagnosticKind};

/// Externally supplied values that `match_expected` fields must equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations(BTreeMap<String, Value>);

impl Expectations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of validating one response against its operation's rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub operation: String,
    /// Records that were inspected field by field
    pub records_checked: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Validates responses by looking up the rule for the operation name.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: RuleRegistry,
}

impl Default for Validator {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Validator {
    #[must_use]
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Validator over the rules for every catalog operation.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(RuleRegistry::builtin())
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// Check `response` against the rule registered for `operation`.
    ///
    /// An unknown operation name yields a single `UnknownOperation`
    /// diagnostic.
    #[must_use]
    pub fn validate(
        &self,
        operation: &str,
        response: &NormalizedResponse,
        expectations: &Expectations,
    ) -> ValidationReport {
        let mut scan = Scan::new(operation);

        let Some(rule) = self.registry.get(operation) else {
            scan.push(Diagnostic::new(
                DiagnosticKind::UnknownOperation,
                format!("Method {operation} is not recognized for validation."),
            ));
            return scan.finish();
        };

        tracing::debug!(
            operation,
            status_code = response.status_code(),
            "validating response"
        );

        check_top_level(rule, response, &mut scan);
        match rule.shape {
            ResultShape::List | ResultShape::EmbeddedList => {
                check_list(rule, response, expectations, &mut scan);
            }
            ResultShape::Record => check_record(rule, response, expectations, &mut scan),
        }

        scan.finish()
    }

    /// Boolean form of [`Validator::validate`].
    #[must_use]
    pub fn check_schema(
        &self,
        operation: &str,
        response: &NormalizedResponse,
        expectations: &Expectations,
    ) -> bool {
        self.validate(operation, response, expectations).is_valid()
    }
}

/// Accumulates diagnostics for one validation pass.
struct Scan {
    operation: String,
    records_checked: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Scan {
    fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            records_checked: 0,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            operation = %self.operation,
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    fn finish(self) -> ValidationReport {
        ValidationReport {
            operation: self.operation,
            records_checked: self.records_checked,
            diagnostics: self.diagnostics,
        }
    }
}

fn check_top_level(rule: &SchemaRule, response: &NormalizedResponse, scan: &mut Scan) {
    for field in &rule.top_level {
        if response.payload().get(field).is_none_or(Value::is_null) {
            scan.push(
                Diagnostic::new(
                    DiagnosticKind::MissingTopLevelField,
                    format!("Missing field in response: {field}"),
                )
                .with_field(field.as_str()),
            );
        }
    }

    let message = match response.logical_status() {
        Some("OK") => return,
        Some(other) => format!("Status is {other:?}, expected \"OK\"."),
        None => "Status field is missing or invalid in the response.".to_string(),
    };
    scan.push(Diagnostic::new(DiagnosticKind::StatusNotOk, message).with_field("Status"));
}

fn check_list(
    rule: &SchemaRule,
    response: &NormalizedResponse,
    expectations: &Expectations,
    scan: &mut Scan,
) {
    let Some(records) = response.list_result() else {
        report_absent_results(rule.shape, response, scan);
        return;
    };
    if records.is_empty() {
        scan.push(
            Diagnostic::new(DiagnosticKind::MissingResults, "Results array is empty.")
                .with_field(RESULTS_FIELD),
        );
        return;
    }

    // First occurrence wins; later repeats are reported by value.
    let mut seen: HashMap<&str, HashSet<String>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(record) = record.as_object() else {
            scan.push(
                Diagnostic::new(
                    DiagnosticKind::UnexpectedType,
                    format!(
                        "Result at index {index} is {}, expected object",
                        json_type_name(record)
                    ),
                )
                .at_index(Some(index)),
            );
            continue;
        };
        scan.records_checked += 1;
        check_fields(rule, record, Some(index), expectations, Some(&mut seen), scan);
    }
}

fn check_record(
    rule: &SchemaRule,
    response: &NormalizedResponse,
    expectations: &Expectations,
    scan: &mut Scan,
) {
    let Some(record) = response.map_result() else {
        report_absent_results(rule.shape, response, scan);
        return;
    };
    if record.is_empty() {
        scan.push(
            Diagnostic::new(DiagnosticKind::MissingResults, "Results map is empty.")
                .with_field(RESULTS_FIELD),
        );
        return;
    }

    scan.records_checked += 1;
    check_fields(rule, record, None, expectations, None, scan);
}

/// Explain why no result body could be read from the payload.
fn report_absent_results(shape: ResultShape, response: &NormalizedResponse, scan: &mut Scan) {
    let payload = response.payload();
    let Some(results) = payload.get(RESULTS_FIELD).filter(|v| !v.is_null()) else {
        scan.push(
            Diagnostic::new(DiagnosticKind::MissingResults, "Results field is missing.")
                .with_field(RESULTS_FIELD),
        );
        return;
    };

    let diagnostic = match shape {
        ResultShape::List => Diagnostic::new(
            DiagnosticKind::UnexpectedType,
            format!("Results is {}, expected array", json_type_name(results)),
        )
        .with_field(RESULTS_FIELD),
        ResultShape::Record => Diagnostic::new(
            DiagnosticKind::UnexpectedType,
            format!("Results is {}, expected object", json_type_name(results)),
        )
        .with_field(RESULTS_FIELD),
        ResultShape::EmbeddedList => {
            let diagnostic = match (embedded_json_data(payload), results.get(JSON_DATA_FIELD)) {
                (Some(_), _) => Diagnostic::new(
                    DiagnosticKind::UnexpectedType,
                    "Results.JsonData does not hold a JSON array",
                ),
                (None, Some(data)) if !data.is_null() => Diagnostic::new(
                    DiagnosticKind::UnexpectedType,
                    format!("Results.JsonData is {}, expected string", json_type_name(data)),
                ),
                _ => Diagnostic::new(DiagnosticKind::MissingResults, "Results.JsonData is missing."),
            };
            diagnostic.with_field("Results.JsonData")
        }
    };
    scan.push(diagnostic);
}

fn check_fields<'r>(
    rule: &'r SchemaRule,
    record: &Map<String, Value>,
    index: Option<usize>,
    expectations: &Expectations,
    mut seen: Option<&mut HashMap<&'r str, HashSet<String>>>,
    scan: &mut Scan,
) {
    let location = match index {
        Some(i) => format!(" for object at index {i}"),
        None => String::new(),
    };

    for field in &rule.fields {
        let value = match lookup(record, &field.path) {
            Lookup::Found(value) => value,
            Lookup::ParentMissing => continue,
            Lookup::Missing => {
                scan.push(missing(field, index, &location));
                continue;
            }
        };

        if let Some(kind) = field.kind {
            if !kind.matches(value) {
                scan.push(
                    Diagnostic::new(
                        DiagnosticKind::UnexpectedType,
                        format!(
                            "{} is {}, expected {kind}{location}",
                            field.path,
                            json_type_name(value)
                        ),
                    )
                    .with_field(field.path.as_str())
                    .at_index(index),
                );
                continue;
            }
        }

        if field.unique {
            if let Some(seen) = seen.as_deref_mut() {
                let first = seen
                    .entry(field.path.as_str())
                    .or_default()
                    .insert(value.to_string());
                if !first {
                    scan.push(
                        Diagnostic::new(
                            DiagnosticKind::DuplicateValue,
                            format!("Duplicate {} found: {value}", field.path),
                        )
                        .with_field(field.path.as_str())
                        .at_index(index),
                    );
                }
            }
        }

        if !field.one_of.is_empty() && !field.one_of.contains(value) {
            let allowed = field
                .one_of
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            scan.push(
                Diagnostic::new(
                    DiagnosticKind::ValueNotAllowed,
                    format!(
                        "{} is {value}, expected one of [{allowed}]{location}",
                        field.path
                    ),
                )
                .with_field(field.path.as_str())
                .at_index(index),
            );
        }

        if field.match_expected {
            if let Some(expected) = expectations.get(&field.path) {
                if !values_equal(value, expected) {
                    scan.push(
                        Diagnostic::new(
                            DiagnosticKind::ValueMismatch,
                            format!(
                                "{} is {value}, expected {expected}{location}",
                                field.path
                            ),
                        )
                        .with_field(field.path.as_str())
                        .at_index(index),
                    );
                }
            }
        }
    }
}

fn missing(field: &FieldRule, index: Option<usize>, location: &str) -> Diagnostic {
    let message = if location.is_empty() {
        format!("{} is missing.", field.path)
    } else {
        format!("{} is missing{location}", field.path)
    };
    Diagnostic::new(DiagnosticKind::MissingField, message)
        .with_field(field.path.as_str())
        .at_index(index)
}

enum Lookup<'a> {
    Found(&'a Value),
    Missing,
    /// An enclosing object of a dotted path is absent or not an object
    ParentMissing,
}

fn lookup<'a>(record: &'a Map<String, Value>, path: &str) -> Lookup<'a> {
    let Some((parent, leaf)) = path.rsplit_once('.') else {
        return present(record.get(path));
    };
    match lookup(record, parent) {
        Lookup::Found(Value::Object(inner)) => present(inner.get(leaf)),
        _ => Lookup::ParentMissing,
    }
}

fn present(value: Option<&Value>) -> Lookup<'_> {
    match value {
        Some(v) if !v.is_null() => Lookup::Found(v),
        _ => Lookup::Missing,
    }
}

/// Numbers compare by value so `176` equals `176.0`.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::rules::FieldRule;
    use serde_json::json;

    fn list_response(op: Operation, results: Value) -> NormalizedResponse {
        NormalizedResponse::from_payload(200, json!({"Status": "OK", "Results": results}), op.shape())
    }

    fn validate(op: Operation, response: &NormalizedResponse) -> ValidationReport {
        Validator::builtin().validate(op.name(), response, &Expectations::new())
    }

    #[test]
    fn valid_departments() {
        let resp = list_response(
            Operation::GetAllDepartments,
            json!([
                {"DepartmentId": 1, "DepartmentName": "Cardiology"},
                {"DepartmentId": 2, "DepartmentName": "Neurology"}
            ]),
        );
        let report = validate(Operation::GetAllDepartments, &resp);
        assert!(report.is_valid(), "{:?}", report.diagnostics);
        assert_eq!(report.records_checked, 2);
    }

    #[test]
    fn unknown_operation_is_reported_not_raised() {
        let resp = list_response(Operation::GetAllItems, json!([]));
        let report = Validator::builtin().validate("getEverything", &resp, &Expectations::new());
        assert!(!report.is_valid());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnknownOperation);
        assert_eq!(
            report.diagnostics[0].message,
            "Method getEverything is not recognized for validation."
        );
    }

    #[test]
    fn status_not_ok_fails_even_when_records_are_valid() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "Failed", "Results": [{"ItemId": 1, "ItemName": "Bed"}]}),
            ResultShape::List,
        );
        let report = validate(Operation::GetAllItems, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::StatusNotOk);
    }

    #[test]
    fn missing_status_reports_field_and_status() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Results": [{"ItemId": 1, "ItemName": "Bed"}]}),
            ResultShape::List,
        );
        let report = validate(Operation::GetAllItems, &resp);
        assert_eq!(report.count(DiagnosticKind::MissingTopLevelField), 1);
        assert_eq!(report.count(DiagnosticKind::StatusNotOk), 1);
    }

    #[test]
    fn scan_is_exhaustive() {
        let resp = list_response(
            Operation::GetAllItems,
            json!([{"ItemId": 1}, {"ItemName": "Chair"}, {}]),
        );
        let report = validate(Operation::GetAllItems, &resp);
        let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "ItemName is missing for object at index 0",
                "ItemId is missing for object at index 1",
                "ItemId is missing for object at index 2",
                "ItemName is missing for object at index 2",
            ]
        );
        assert_eq!(report.records_checked, 3);
    }

    #[test]
    fn duplicate_reported_once_by_value() {
        let resp = list_response(
            Operation::GetReferrersFromEmployeeSettings,
            json!([
                {"EmployeeId": 5, "FullName": "A"},
                {"EmployeeId": 6, "FullName": "B"},
                {"EmployeeId": 5, "FullName": "C"}
            ]),
        );
        let report = validate(Operation::GetReferrersFromEmployeeSettings, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        let d = &report.diagnostics[0];
        assert_eq!(d.kind, DiagnosticKind::DuplicateValue);
        assert_eq!(d.message, "Duplicate EmployeeId found: 5");
        assert_eq!(d.index, Some(2));
    }

    #[test]
    fn unique_fields_tracked_independently() {
        let resp = list_response(
            Operation::GetLabBillCfgItemsByDepartmentName,
            json!([
                {"BillItemPriceId": 1, "ServiceDepartmentId": 10},
                {"BillItemPriceId": 2, "ServiceDepartmentId": 1}
            ]),
        );
        let report = validate(Operation::GetLabBillCfgItemsByDepartmentName, &resp);
        assert!(report.is_valid(), "{:?}", report.diagnostics);
    }

    #[test]
    fn empty_list_is_missing_results() {
        let resp = list_response(Operation::GetAllDepartments, json!([]));
        let report = validate(Operation::GetAllDepartments, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::MissingResults);
        assert_eq!(report.records_checked, 0);
    }

    #[test]
    fn absent_results_is_missing_results() {
        let resp = NormalizedResponse::from_payload(200, json!({"Status": "OK"}), ResultShape::Record);
        let report = validate(Operation::GetEmpBillItem, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::MissingResults);
    }

    #[test]
    fn wrongly_typed_results_is_unexpected_type() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": [1, 2]}),
            ResultShape::Record,
        );
        let report = validate(Operation::GetAvlQtyByStoreId, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].message, "Results is array, expected object");
    }

    #[test]
    fn non_object_list_element_is_unexpected_type() {
        let resp = list_response(
            Operation::GetInvSubCat,
            json!([{"SubCategoryId": 1, "SubCategoryName": "Linen"}, "junk"]),
        );
        let report = validate(Operation::GetInvSubCat, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnexpectedType);
        assert_eq!(report.diagnostics[0].index, Some(1));
        assert_eq!(report.records_checked, 1);
    }

    #[test]
    fn mistyped_field_is_reported_not_cast() {
        let resp = list_response(
            Operation::GetAllDepartments,
            json!([{"DepartmentId": "one", "DepartmentName": "Cardiology"}]),
        );
        let report = validate(Operation::GetAllDepartments, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].message,
            "DepartmentId is string, expected integer for object at index 0"
        );
    }

    #[test]
    fn integral_amounts_satisfy_number_fields() {
        let resp = list_response(
            Operation::GetHospIncIncReport,
            json!([{
                "ServiceDepartmentId": 3,
                "ServiceDepartmentName": "Radiology",
                "NetSales": 1200,
                "ReferralCommission": 0,
                "GrossIncome": 1200.5,
                "OtherIncentive": 0.0,
                "HospitalNetIncome": 1100
            }]),
        );
        assert!(validate(Operation::GetHospIncIncReport, &resp).is_valid());
    }

    #[test]
    fn record_never_checks_uniqueness() {
        let mut validator = Validator::builtin();
        validator.registry_mut().insert(
            SchemaRule::new("getWard", ResultShape::Record).field(FieldRule::integer("WardId").unique()),
        );
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": {"WardId": 1}}),
            ResultShape::Record,
        );
        let report = validator.validate("getWard", &resp, &Expectations::new());
        assert!(report.is_valid());
    }

    #[test]
    fn expectation_mismatch_on_record() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": {"PatientId": 177}}),
            ResultShape::Record,
        );
        let expectations = Expectations::new().with("PatientId", 176);
        let report = Validator::builtin().validate(
            Operation::GetPatientBillingContextByPatientId.name(),
            &resp,
            &expectations,
        );
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ValueMismatch);
        assert_eq!(report.diagnostics[0].message, "PatientId is 177, expected 176");
    }

    #[test]
    fn expectation_absent_skips_equality() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": {"PatientId": 177}}),
            ResultShape::Record,
        );
        let report = validate(Operation::GetPatientBillingContextByPatientId, &resp);
        assert!(report.is_valid());
    }

    #[test]
    fn float_expectation_equals_integer_value() {
        assert!(values_equal(&json!(176), &json!(176.0)));
        assert!(!values_equal(&json!(176), &json!("176")));
    }

    #[test]
    fn admitted_patient_nested_fields() {
        let patient = |action: &str| {
            json!({
                "PatientId": 1, "PatientAdmissionId": 2, "AdmittedDate": "2024-01-01",
                "Name": "Devid8 Roy8", "Gender": "Male", "Department": "Cardiology",
                "AdmittingDoctorName": "Dr. A",
                "BedInformation": {"BedId": 4, "Ward": "ICU", "BedCode": "ICU-4", "Action": action}
            })
        };
        let resp = list_response(
            Operation::GetAdmittedPatientsData,
            json!([patient("Admission"), patient("Transfer"), patient("Discharge")]),
        );
        let report = validate(Operation::GetAdmittedPatientsData, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ValueNotAllowed);
        assert_eq!(
            report.diagnostics[0].message,
            "BedInformation.Action is \"Discharge\", expected one of [\"Admission\", \"Transfer\"] for object at index 2"
        );
    }

    #[test]
    fn missing_parent_reports_only_parent() {
        let resp = list_response(
            Operation::GetAdmittedPatientsData,
            json!([{
                "PatientId": 1, "PatientAdmissionId": 2, "AdmittedDate": "2024-01-01",
                "Name": "N", "Gender": "F", "Department": "D", "AdmittingDoctorName": "Dr. B"
            }]),
        );
        let report = validate(Operation::GetAdmittedPatientsData, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].field.as_deref(), Some("BedInformation"));
    }

    #[test]
    fn embedded_json_data_not_array() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": {"JsonData": "not json"}}),
            ResultShape::EmbeddedList,
        );
        let report = validate(Operation::GetIncentiveSummaryReport, &resp);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnexpectedType);
        assert_eq!(report.diagnostics[0].field.as_deref(), Some("Results.JsonData"));
    }

    #[test]
    fn embedded_json_data_absent() {
        let resp = NormalizedResponse::from_payload(
            200,
            json!({"Status": "OK", "Results": {}}),
            ResultShape::EmbeddedList,
        );
        let report = validate(Operation::GetIncReffSummReport, &resp);
        assert_eq!(report.count(DiagnosticKind::MissingResults), 1);
    }

    #[test]
    fn non_json_body_fails_cleanly() {
        let resp = NormalizedResponse::from_body(500, "Internal Server Error", ResultShape::List);
        let report = validate(Operation::GetAllItems, &resp);
        assert_eq!(report.count(DiagnosticKind::MissingTopLevelField), 1);
        assert_eq!(report.count(DiagnosticKind::StatusNotOk), 1);
        assert_eq!(report.count(DiagnosticKind::MissingResults), 1);
    }
}
