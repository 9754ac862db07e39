//! CLI error types with miette diagnostics.
//!
//! Maps `ErrorInfo` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use crmsync_api::ErrorInfo;
use crmsync_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Session expired or token rejected")]
    #[diagnostic(
        code(crmsync::auth_failed),
        help("Log in again and pass the new token with --token or CRMSYNC_TOKEN.")
    )]
    AuthFailed,

    #[error("Not allowed: {message}")]
    #[diagnostic(code(crmsync::forbidden))]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    #[diagnostic(code(crmsync::not_found), help("Run: crmsync list"))]
    NotFound { message: String },

    #[error("Could not reach the API: {message}")]
    #[diagnostic(
        code(crmsync::connection_failed),
        help("Check that the backend is running and --api-url is correct.")
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(code(crmsync::timeout), help("Raise timeout_ms in the config file."))]
    Timeout,

    #[error("API error ({code}, HTTP {status}): {message}")]
    #[diagnostic(code(crmsync::api_error))]
    Api {
        code: String,
        status: u16,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(
        code(crmsync::config),
        help("Check the config file (see `crmsync config`) and CRMSYNC_* variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(crmsync::output))]
    Render(String),
}

impl From<ErrorInfo> for CliError {
    fn from(err: ErrorInfo) -> Self {
        match err.http_status {
            401 => Self::AuthFailed,
            403 => Self::Forbidden {
                message: err.message,
            },
            404 => Self::NotFound {
                message: err.message,
            },
            0 if err.code == "ETIMEDOUT" => Self::Timeout,
            0 if err.code == "ECONNREFUSED" || err.code == "NETWORK_ERROR" => {
                Self::ConnectionFailed {
                    message: err.message,
                }
            }
            status => Self::Api {
                code: err.code,
                status,
                message: err.message,
            },
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Config(_) => exit_code::USAGE,
            Self::Api { .. } | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_pick_variants() {
        assert!(matches!(
            CliError::from(ErrorInfo::new("x", "UNKNOWN_ERROR", 401)),
            CliError::AuthFailed
        ));
        assert!(matches!(
            CliError::from(ErrorInfo::new("x", "UNKNOWN_ERROR", 404)),
            CliError::NotFound { .. }
        ));
        assert!(matches!(
            CliError::from(ErrorInfo::new("x", "ETIMEDOUT", 0)),
            CliError::Timeout
        ));
        assert!(matches!(
            CliError::from(ErrorInfo::new("x", "UNKNOWN_ERROR", 500)),
            CliError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::AuthFailed.exit_code(), exit_code::AUTH);
        assert_eq!(CliError::Timeout.exit_code(), exit_code::TIMEOUT);
    }
}
