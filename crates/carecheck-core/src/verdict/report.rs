//! Per-case outcomes and the suite report

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::policy::Verdict;
use crate::inspect::Inspection;
use crate::validate::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    /// An assertion did not hold
    Failed,
    /// The case could not run to completion (auth, transport, parameters)
    Errored,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
        })
    }
}

/// What happened to one operation call inside a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OperationResult {
    pub operation: String,
    /// Transport-level status code
    pub http_status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection: Option<Inspection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

/// Result of one suite case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseOutcome {
    /// Case name, e.g. `all_departments`
    pub case: String,
    pub status: CaseStatus,
    /// Failed assertions and errors, in the order they occurred
    pub messages: Vec<String>,
    pub operations: Vec<OperationResult>,
}

impl CaseOutcome {
    #[must_use]
    pub fn new(case: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            status: CaseStatus::Passed,
            messages: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Record a failed assertion. An errored case stays errored.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status != CaseStatus::Errored {
            self.status = CaseStatus::Failed;
        }
        self.messages.push(message.into());
    }

    /// Record an error that stopped the case.
    pub fn error(&mut self, message: impl Into<String>) {
        self.status = CaseStatus::Errored;
        self.messages.push(message.into());
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Everything a suite run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub verdict: Verdict,
    pub cases: Vec<CaseOutcome>,
}

impl SuiteReport {
    #[must_use]
    pub fn count(&self, status: CaseStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }
}

/// JSON Schema for [`SuiteReport`], as emitted by `--output json`.
#[must_use]
pub fn report_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(SuiteReport)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_does_not_downgrade_error() {
        let mut outcome = CaseOutcome::new("patient_notes");
        outcome.error("search returned no patients");
        outcome.fail("PatientId is missing.");
        assert_eq!(outcome.status, CaseStatus::Errored);
        assert_eq!(outcome.messages.len(), 2);
    }

    #[test]
    fn new_outcome_passes() {
        let outcome = CaseOutcome::new("all_items");
        assert!(outcome.passed());
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn schema_describes_cases() {
        let schema = report_schema();
        let text = schema.to_string();
        assert!(text.contains("CaseOutcome"));
        assert!(text.contains("errored"));
    }
}
