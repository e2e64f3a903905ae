//! Verdict policy - turns case outcomes into a final verdict

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::report::{CaseOutcome, CaseStatus};

/// Policy for judging case outcomes. Every outcome counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerdictPolicy;

impl VerdictPolicy {
    /// Exit code for the outcomes.
    ///
    /// 1 when any case failed, 3 when cases only errored, 0 otherwise.
    /// Failures take precedence over errors.
    #[must_use]
    pub fn exit_code(&self, outcomes: &[CaseOutcome]) -> i32 {
        if outcomes.iter().any(|o| o.status == CaseStatus::Failed) {
            return 1;
        }
        if outcomes.iter().any(|o| o.status == CaseStatus::Errored) {
            return 3;
        }
        0
    }

    /// PASS requires at least one case and every case passing.
    #[must_use]
    pub fn verdict(&self, outcomes: &[CaseOutcome]) -> Verdict {
        let failed = outcomes
            .iter()
            .filter(|o| o.status == CaseStatus::Failed)
            .count();
        let errored = outcomes
            .iter()
            .filter(|o| o.status == CaseStatus::Errored)
            .count();

        let status = if !outcomes.is_empty() && failed == 0 && errored == 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if status == VerdictStatus::Pass {
            format!("All {} cases passed", outcomes.len())
        } else if outcomes.is_empty() {
            "No cases were run".to_string()
        } else {
            let mut parts = Vec::new();
            if failed > 0 {
                parts.push(format!("{failed} of {} cases failed", outcomes.len()));
            }
            if errored > 0 {
                parts.push(format!("{errored} errored (auth/transport/parameters)"));
            }
            parts.join("; ")
        };

        let exit_code = if outcomes.is_empty() { 1 } else { self.exit_code(outcomes) };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
