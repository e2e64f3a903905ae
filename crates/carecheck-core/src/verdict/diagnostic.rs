//! Diagnostic kinds and structured representation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of schema problem found in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No rule exists for the operation name
    UnknownOperation,
    /// A required top-level payload field is absent
    MissingTopLevelField,
    /// Logical status absent or not "OK"
    StatusNotOk,
    /// Result body absent or empty
    MissingResults,
    /// A required record field is absent or null
    MissingField,
    /// A unique field repeats across records
    DuplicateValue,
    /// A field differs from the caller-supplied expectation
    ValueMismatch,
    /// A field holds a value outside its allowed set
    ValueNotAllowed,
    /// A value has a different JSON type than declared
    UnexpectedType,
}

impl DiagnosticKind {
    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownOperation => "Operation is not recognized for validation",
            Self::MissingTopLevelField => "Top-level field missing from response",
            Self::StatusNotOk => "Status field is missing or not OK",
            Self::MissingResults => "Results are missing or empty",
            Self::MissingField => "Required field missing from record",
            Self::DuplicateValue => "Duplicate value in unique field",
            Self::ValueMismatch => "Field does not match the expected value",
            Self::ValueNotAllowed => "Field value is not one of the allowed values",
            Self::UnexpectedType => "Value has an unexpected type",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// One problem found while validating a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Localized message, e.g. "DepartmentName is missing for object at index 1"
    pub message: String,
    /// Offending field, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Record index within a list result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
            index: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn at_index(mut self, index: Option<usize>) -> Self {
        self.index = index;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
