//! Verdict module - diagnostics, case outcomes, and policy

mod diagnostic;
mod policy;
mod report;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use policy::{Verdict, VerdictPolicy, VerdictStatus};
pub use report::{CaseOutcome, CaseStatus, OperationResult, SuiteReport, report_schema};
