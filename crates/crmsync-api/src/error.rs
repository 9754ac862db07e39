use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failure, as produced by [`HttpTransport`](crate::HttpTransport).
///
/// This is the raw shape: it still carries the `reqwest` error and the
/// undecoded response body. Consumers never see it directly -- every
/// [`Transport`](crate::Transport) method normalizes it into an [`ErrorInfo`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client-construction failure.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered 401. The stored credential has already been cleared.
    #[error("Unauthorized")]
    Unauthorized { body: String },

    /// Any other non-2xx response.
    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Normalized failure exposed to the store and the UI.
///
/// Mirrors the `{message, code, status}` triple the backend error envelope
/// carries. Transport failures without an HTTP response report status `0`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    pub http_status: u16,
}

pub(crate) const DEFAULT_MESSAGE: &str = "An error occurred";
pub(crate) const DEFAULT_CODE: &str = "UNKNOWN_ERROR";

impl ErrorInfo {
    pub fn new(message: impl Into<String>, code: impl Into<String>, http_status: u16) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            http_status,
        }
    }

    /// Returns `true` for an HTTP 401. The session is gone; retrying won't help.
    pub fn is_unauthorized(&self) -> bool {
        self.http_status == 401
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status == 404
    }

    /// Returns `true` when no HTTP response was received at all.
    pub fn is_network(&self) -> bool {
        self.http_status == 0
    }

    /// Build from a non-2xx response body.
    ///
    /// FastAPI-style bodies put the human message in `detail` and an optional
    /// machine code in `code`. A non-string `detail` (validation error arrays)
    /// falls back to the generic message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let (message, code) = parsed.map_or((None, None), |b| {
            let detail = match b.detail {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            };
            (detail, b.code)
        });

        Self {
            message: message.unwrap_or_else(|| DEFAULT_MESSAGE.into()),
            code: code.unwrap_or_else(|| DEFAULT_CODE.into()),
            http_status: status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    code: Option<String>,
}

// ── Normalization ───────────────────────────────────────────────────

impl From<Error> for ErrorInfo {
    fn from(err: Error) -> Self {
        match err {
            Error::Transport(ref e) => {
                if e.is_timeout() {
                    ErrorInfo::new(e.to_string(), "ETIMEDOUT", 0)
                } else if e.is_connect() {
                    ErrorInfo::new(e.to_string(), "ECONNREFUSED", 0)
                } else if let Some(status) = e.status() {
                    ErrorInfo::new(e.to_string(), DEFAULT_CODE, status.as_u16())
                } else {
                    ErrorInfo::new(e.to_string(), "NETWORK_ERROR", 0)
                }
            }
            Error::InvalidUrl(e) => ErrorInfo::new(format!("Invalid URL: {e}"), "INVALID_URL", 0),
            Error::Client(msg) => ErrorInfo::new(msg, "CLIENT_ERROR", 0),
            Error::Unauthorized { body } => ErrorInfo::from_response(401, &body),
            Error::Http { status, body } => ErrorInfo::from_response(status, &body),
            Error::Deserialization { message, body: _ } => {
                ErrorInfo::new(message, "INVALID_RESPONSE", 0)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detail_and_code_are_lifted_from_body() {
        let info = ErrorInfo::from_response(404, r#"{"detail":"Notification not found","code":"NOT_FOUND"}"#);
        assert_eq!(info, ErrorInfo::new("Notification not found", "NOT_FOUND", 404));
        assert!(info.is_not_found());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let info = ErrorInfo::from_response(500, "<html>oops</html>");
        assert_eq!(info, ErrorInfo::new(DEFAULT_MESSAGE, DEFAULT_CODE, 500));
    }

    #[test]
    fn validation_detail_array_uses_generic_message() {
        let body = r#"{"detail":[{"loc":["query","limit"],"msg":"not an int"}]}"#;
        let info = ErrorInfo::from_response(422, body);
        assert_eq!(info.message, DEFAULT_MESSAGE);
        assert_eq!(info.code, DEFAULT_CODE);
        assert_eq!(info.http_status, 422);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let info = ErrorInfo::from(Error::Unauthorized {
            body: r#"{"detail":"Could not validate credentials"}"#.into(),
        });
        assert!(info.is_unauthorized());
        assert_eq!(info.message, "Could not validate credentials");
    }

    #[test]
    fn deserialization_has_no_status() {
        let info = ErrorInfo::from(Error::Deserialization {
            message: "missing field `id`".into(),
            body: "{}".into(),
        });
        assert_eq!(info.code, "INVALID_RESPONSE");
        assert!(info.is_network());
    }
}
