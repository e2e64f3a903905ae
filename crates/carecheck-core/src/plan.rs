//! Dry run plan types and config validation
//!
//! Describes what a suite run *would* do without sending any requests.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;

// ── Plan types ──

/// Complete dry run plan: cases, the calls they make, and config checks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunPlan {
    pub cases: Vec<PlannedCase>,
    pub validations: Vec<Validation>,
}

/// Calls a single case would make.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannedCase {
    /// Case name, e.g. "lab_bill_items"
    pub case: String,
    /// Operation names in call order
    pub operations: Vec<String>,
    /// Resolved URL of the first call; later calls depend on its response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Parameters the case needs that the config does not define
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_params: Vec<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status,
            message: message.into(),
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "TODO",
    "CHANGEME",
    "changeme",
    "placeholder",
    "xxx",
    "XXX",
    "replace-me",
    "REPLACE_ME",
];

fn has_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate config against the parameters the suite needs.
#[must_use]
pub fn validate_config(config: &Config, required_params: &[&str]) -> Vec<Validation> {
    let mut checks = Vec::new();

    for (check, url) in [("base_url", &config.base_url), ("site_url", &config.site_url)] {
        if has_scheme(url) {
            checks.push(Validation::new(check, ValidationStatus::Ok, format!("{check}: {url}")));
        } else {
            checks.push(Validation::new(
                check,
                ValidationStatus::Error,
                format!("{check}: {url} (missing http:// or https:// prefix)"),
            ));
        }
    }

    checks.push(validate_auth(config));

    match &config.inspect {
        None => checks.push(Validation::new(
            "inspect",
            ValidationStatus::Ok,
            "inspect: disabled",
        )),
        Some(inspect) if inspect.artifact.exists() => checks.push(Validation::new(
            "inspect",
            ValidationStatus::Ok,
            format!(
                "inspect: {} (exists, tokens: {})",
                inspect.artifact.display(),
                inspect.tokens.join(", ")
            ),
        )),
        Some(inspect) => checks.push(Validation::new(
            "inspect",
            ValidationStatus::Error,
            format!("inspect: {} (not found)", inspect.artifact.display()),
        )),
    }

    let missing: Vec<&str> = required_params
        .iter()
        .copied()
        .filter(|p| !config.params.contains(p))
        .collect();
    if missing.is_empty() {
        checks.push(Validation::new(
            "params",
            ValidationStatus::Ok,
            format!("params: {} required, all defined", required_params.len()),
        ));
    } else {
        for name in missing {
            checks.push(Validation::new(
                "params",
                ValidationStatus::Warning,
                format!("params: {name} is not defined (cases using it will error)"),
            ));
        }
    }

    checks
}

fn validate_auth(config: &Config) -> Validation {
    let token = match (&config.auth.token, &config.auth.token_env) {
        (Some(token), _) => token.clone(),
        (None, Some(var)) => match std::env::var(var) {
            Ok(value) => value,
            Err(_) => {
                return Validation::new(
                    "auth",
                    ValidationStatus::Error,
                    format!("auth: environment variable {var} is not set"),
                );
            }
        },
        (None, None) => {
            return Validation::new(
                "auth",
                ValidationStatus::Error,
                "auth: no token or token_env configured",
            );
        }
    };

    if token.contains('<') && token.contains('>') {
        return Validation::new(
            "auth",
            ValidationStatus::Warning,
            "auth: contains '<...>' placeholder",
        );
    }
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| token.contains(*p)) {
        return Validation::new(
            "auth",
            ValidationStatus::Warning,
            format!("auth: contains '{pattern}', may be placeholder"),
        );
    }
    Validation::new("auth", ValidationStatus::Ok, "auth: credential configured")
}

// ── Display helpers ──

impl RunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Dry run: {} cases planned\n", self.cases.len()));

        for case in &self.cases {
            lines.push(format!("{}: {}", case.case, case.operations.join(" -> ")));
            if let Some(url) = &case.url {
                lines.push(format!("  GET {url}"));
            }
            if !case.missing_params.is_empty() {
                lines.push(format!(
                    "  Missing params: {}",
                    case.missing_params.join(", ")
                ));
            }
        }
        lines.push(String::new());

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
