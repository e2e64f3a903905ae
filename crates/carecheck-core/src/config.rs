//! Project configuration for the API checks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL for relative endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Site origin used for the absolute report URLs
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Credential source for the Authorization header
    #[serde(default)]
    pub auth: AuthConfig,

    /// Named request parameters (date ranges, ids, flags)
    #[serde(default)]
    pub params: Params,

    /// Implementation inspection of the facade source (skipped when absent)
    #[serde(default)]
    pub inspect: Option<InspectConfig>,

    /// Externally supplied values that response fields must equal
    #[serde(default)]
    pub expect: BTreeMap<String, i64>,
}

/// Where the Authorization credential comes from.
///
/// ```toml
/// [auth]
/// token_env = "CARECHECK_TOKEN"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Literal header value
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable holding the header value
    #[serde(default)]
    pub token_env: Option<String>,
}

/// Source artifact inspected for each operation's facade wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Path of the source file that defines the wrappers
    pub artifact: PathBuf,

    /// Call tokens every wrapper must use
    #[serde(default = "default_tokens")]
    pub tokens: Vec<String>,
}

/// Opaque key → value lookup used to build request URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Look up a parameter the caller cannot do without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingParam`] if the key is absent.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingParam(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Immutable settings handed to the HTTP facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
}

impl ApiSettings {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Absolute `http(s)://` endpoints pass through, everything else is
    /// appended to the base URL.
    #[must_use]
    pub fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{endpoint}", self.base_url.trim_end_matches('/'))
        }
    }
}

fn default_base_url() -> String {
    "https://healthapp.yaksha.com/api".to_string()
}

fn default_site_url() -> String {
    "https://healthapp.yaksha.com".to_string()
}

fn default_tokens() -> Vec<String> {
    vec!["execute".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_url: default_site_url(),
            auth: AuthConfig::default(),
            params: Params::default(),
            inspect: None,
            expect: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse TOML config text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid config
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default location (.carecheck.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".carecheck.toml", ".carecheck.json", "carecheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    #[must_use]
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings::new(self.base_url.clone())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# carecheck configuration

# API base for relative endpoints
base_url = "https://healthapp.yaksha.com/api"

# Site origin for the report endpoints
site_url = "https://healthapp.yaksha.com"

# Authorization header value (literal or from an environment variable)
[auth]
token_env = "CARECHECK_TOKEN"
# token = "Basic your-token-here"

# Request parameters
[params]
IncSummFromDate = "2024-01-01"
IncSummToDate = "2024-12-31"
IsRefferalOnly = "false"
IncFromDate = "2024-01-01"
IncToDate = "2024-12-31"
DocSumIsRefferalOnly = "true"
ServiceDepartments = "All"
employeeId = "1"
itemId = "1"
storeId = "1"
departmentName = "radiology"
patientId = "176"
visitId = "147"
patientName = "Devid8 Roy8"
admissionStatus = "admitted"

# Values the responses must echo back
[expect]
billing_patient_id = 176

# Check that every facade wrapper delegates to the shared request path
# [inspect]
# artifact = "crates/carecheck-runner/src/facade.rs"
# tokens = ["execute"]
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing parameter: {0}")]
    MissingParam(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://healthapp.yaksha.com/api");
        assert_eq!(config.site_url, "https://healthapp.yaksha.com");
        assert!(config.inspect.is_none());
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
base_url = "http://localhost:3000/api"

[auth]
token = "Basic abc"

[params]
employeeId = "42"
patientName = "Devid8 Roy8"

[expect]
billing_patient_id = 176
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.site_url, "https://healthapp.yaksha.com");
        assert_eq!(config.auth.token.as_deref(), Some("Basic abc"));
        assert_eq!(config.params.get("employeeId"), Some("42"));
        assert_eq!(config.params.get("patientName"), Some("Devid8 Roy8"));
        assert_eq!(config.expect.get("billing_patient_id"), Some(&176));
    }

    #[test]
    fn parse_inspect_section_defaults_tokens() {
        let toml = r#"
[inspect]
artifact = "src/facade.rs"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let inspect = config.inspect.unwrap();
        assert_eq!(inspect.artifact, PathBuf::from("src/facade.rs"));
        assert_eq!(inspect.tokens, vec!["execute"]);
    }

    #[test]
    fn example_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.auth.token_env.as_deref(), Some("CARECHECK_TOKEN"));
        assert_eq!(config.params.get("departmentName"), Some("radiology"));
    }

    #[test]
    fn require_missing_param() {
        let params = Params::default();
        let err = params.require("itemId").unwrap_err();
        assert!(matches!(err, ConfigError::MissingParam(ref k) if k == "itemId"));
    }

    #[test]
    fn load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carecheck.json");
        std::fs::write(&path, r#"{"base_url": "http://127.0.0.1:9000/api"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/api");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load(Path::new("/nonexistent/carecheck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let settings = ApiSettings::new("https://healthapp.yaksha.com/api/");
        assert_eq!(
            settings.resolve("/AssetReports/GetAllItems"),
            "https://healthapp.yaksha.com/api/AssetReports/GetAllItems"
        );
        assert_eq!(
            settings.resolve("https://other.example.com/Reporting/X"),
            "https://other.example.com/Reporting/X"
        );
    }
}
