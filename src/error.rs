use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

use crate::models::ErrorBody;

#[derive(Debug)]
pub enum RelayError {
    MethodNotAllowed,
    BadRequest(String),
    PayloadTooLarge(String),
    ConfigError(String),
    Upstream {
        status: u16,
        body: String,
    },
    NoResponseBody,
    Timeout(String),
    NetworkError(reqwest::Error),
    JsonError(serde_json::Error),
    Other(String),
}

impl RelayError {
    /// Build the error for a non-success upstream reply from its body read.
    ///
    /// A body that cannot be read still yields the upstream status, with an
    /// empty message.
    pub fn upstream<E: fmt::Display>(status: u16, body: std::result::Result<String, E>) -> Self {
        let body = body.unwrap_or_else(|e| {
            tracing::warn!(status, error = %e, "failed to read upstream error body");
            String::new()
        });
        RelayError::Upstream { status, body }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::ConfigError(_)
            | RelayError::NoResponseBody
            | RelayError::NetworkError(_)
            | RelayError::JsonError(_)
            | RelayError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON body sent to the caller for this failure.
    pub fn body(&self) -> ErrorBody {
        match self {
            RelayError::MethodNotAllowed => ErrorBody::new("Method not allowed"),
            RelayError::BadRequest(msg) => ErrorBody::with_message("Bad request", msg),
            RelayError::PayloadTooLarge(msg) => ErrorBody::with_message("Payload too large", msg),
            RelayError::ConfigError(msg) => {
                ErrorBody::with_message("Server configuration error", msg)
            }
            RelayError::Upstream { body, .. } => {
                ErrorBody::with_message("API request failed", body)
            }
            RelayError::NoResponseBody => ErrorBody::new("No response body from API"),
            RelayError::Timeout(msg) => ErrorBody::with_message("Upstream timeout", msg),
            RelayError::NetworkError(_) | RelayError::JsonError(_) | RelayError::Other(_) => {
                ErrorBody::with_message("Internal server error", self.to_string())
            }
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::MethodNotAllowed => write!(f, "Method not allowed"),
            RelayError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            RelayError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            RelayError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            RelayError::Upstream { status, body } => {
                write!(f, "API error (status {}): {}", status, body)
            }
            RelayError::NoResponseBody => write!(f, "No response body from API"),
            RelayError::Timeout(msg) => write!(f, "Upstream timeout: {}", msg),
            RelayError::NetworkError(e) => write!(f, "Network error: {}", e),
            RelayError::JsonError(e) => write!(f, "JSON error: {}", e),
            RelayError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::NetworkError(e) => Some(e),
            RelayError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout(err.to_string())
        } else {
            RelayError::NetworkError(err)
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::JsonError(err)
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Other(err.to_string())
    }
}

impl From<String> for RelayError {
    fn from(msg: String) -> Self {
        RelayError::Other(msg)
    }
}

impl From<&str> for RelayError {
    fn from(msg: &str) -> Self {
        RelayError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_body_has_no_message() {
        let body = serde_json::to_value(RelayError::MethodNotAllowed.body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Method not allowed"}));
        assert_eq!(
            RelayError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_upstream_error_keeps_status() {
        let err = RelayError::Upstream {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "API request failed");
        assert_eq!(body["message"], "slow down");
    }

    #[test]
    fn test_unreadable_upstream_body_keeps_status() {
        let err = RelayError::upstream(503, Err::<String, _>("connection reset"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "API request failed");
        assert_eq!(body["message"], "");

        let err = RelayError::upstream(503, Ok::<_, String>("busy".to_string()));
        assert!(matches!(err, RelayError::Upstream { status: 503, ref body } if body == "busy"));
    }

    #[test]
    fn test_invalid_upstream_status_falls_back_to_bad_gateway() {
        let err = RelayError::Upstream {
            status: 42,
            body: String::new(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = RelayError::from("boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "boom");
    }
}
