//! Authorization header providers

use carecheck_core::AuthConfig;

/// Supplies the value of the `Authorization` header for every request.
pub trait AuthProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError`] when no credential is available.
    fn authorization(&self) -> Result<String, AuthError>;
}

/// A credential fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl AuthProvider for StaticToken {
    fn authorization(&self) -> Result<String, AuthError> {
        if self.0.trim().is_empty() {
            return Err(AuthError::Empty);
        }
        Ok(self.0.clone())
    }
}

/// A credential read from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl AuthProvider for EnvToken {
    fn authorization(&self) -> Result<String, AuthError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(AuthError::Empty),
            Err(_) => Err(AuthError::MissingEnv(self.var.clone())),
        }
    }
}

/// Build the provider described by `[auth]`. A literal token wins over
/// `token_env`.
///
/// # Errors
///
/// Returns [`AuthError::NotConfigured`] when neither is set.
pub fn auth_from_config(config: &AuthConfig) -> Result<Box<dyn AuthProvider>, AuthError> {
    match (&config.token, &config.token_env) {
        (Some(token), _) => Ok(Box::new(StaticToken::new(token.clone()))),
        (None, Some(var)) => Ok(Box::new(EnvToken::new(var.clone()))),
        (None, None) => Err(AuthError::NotConfigured),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No credential configured (set auth.token or auth.token_env)")]
    NotConfigured,
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
    #[error("Credential is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_returns_value() {
        let auth = StaticToken::new("Basic YWRtaW46cGFzcw==");
        assert_eq!(auth.authorization().unwrap(), "Basic YWRtaW46cGFzcw==");
    }

    #[test]
    fn blank_static_token_is_error() {
        assert_eq!(StaticToken::new("  ").authorization(), Err(AuthError::Empty));
    }

    #[test]
    fn unset_env_is_error() {
        let auth = EnvToken::new("CARECHECK_AUTH_TEST_UNSET_VARIABLE");
        assert_eq!(
            auth.authorization(),
            Err(AuthError::MissingEnv("CARECHECK_AUTH_TEST_UNSET_VARIABLE".into()))
        );
    }

    #[test]
    fn literal_token_wins() {
        let config = AuthConfig {
            token: Some("Basic abc".into()),
            token_env: Some("CARECHECK_AUTH_TEST_UNSET_VARIABLE".into()),
        };
        let auth = auth_from_config(&config).unwrap();
        assert_eq!(auth.authorization().unwrap(), "Basic abc");
    }

    #[test]
    fn nothing_configured_is_error() {
        assert!(matches!(
            auth_from_config(&AuthConfig::default()),
            Err(AuthError::NotConfigured)
        ));
    }
}
