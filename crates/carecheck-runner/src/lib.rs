//! carecheck-runner: HTTP facade and regression suite for the healthcare API

pub mod auth;
pub mod facade;
pub mod suite;

pub use auth::{AuthError, AuthProvider, EnvToken, StaticToken, auth_from_config};
pub use facade::{
    FacadeError, HealthApi, HttpReply, HttpRequest, ReqwestTransport, Transport, TransportError,
};
pub use suite::{CASES, Case, Suite, required_params};
