//! carecheck-core: Operation catalog, response normalization and schema checks
//!
//! This crate holds the pure side of the API checks: configuration, the
//! catalog of named operations, the uniform response wrapper, declarative
//! schema rules with their validator, the method-body inspector, and the
//! verdict types a suite run is judged by.

pub mod config;
pub mod inspect;
pub mod operation;
pub mod plan;
pub mod response;
pub mod rules;
pub mod validate;
pub mod verdict;

pub use config::{ApiSettings, AuthConfig, Config, ConfigError, InspectConfig, Params};
pub use inspect::{Inspection, Inspector, check_implementation};
pub use operation::{Operation, UnknownOperation};
pub use plan::{PlannedCase, RunPlan, Validation, ValidationStatus, validate_config};
pub use response::{NormalizedResponse, ResultBody, ResultShape};
pub use rules::{FieldRule, RuleRegistry, SchemaRule, ValueKind};
pub use validate::{Expectations, ValidationReport, Validator};
pub use verdict::{
    CaseOutcome, CaseStatus, Diagnostic, DiagnosticKind, OperationResult, SuiteReport, Verdict,
    VerdictPolicy, VerdictStatus,
};
