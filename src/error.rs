// Error handling module
// Closed set of failures a console action can end in

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the session and API client layers
#[derive(Error, Debug)]
pub enum ClientError {
    /// No session exists; the caller must prompt for login
    #[error("Not logged in: no session token is stored")]
    NoCredential,

    /// The credential was rejected again after a refresh and retry
    #[error("Session rejected after token refresh; please log in again")]
    AuthExhausted,

    /// The refresh endpoint rejected the token or was unreachable
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// No response was received
    #[error("Network error ({kind}): {message}")]
    Network { kind: &'static str, message: String },

    /// Non-success response from the remote API
    #[error("API error: {status} - {}", error_message(.body))]
    Api { status: u16, body: Value },

    /// Client-side field validation failed before any network call
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Local failure (session storage, response decoding)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// Build a validation error for a form field
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ClientError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Classify a reqwest transport error the same way for every call site
    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection_failed"
        } else if err.is_request() {
            "request_error"
        } else if err.is_body() {
            "body_error"
        } else if err.is_decode() {
            "decode_error"
        } else {
            "unknown"
        };

        ClientError::Network {
            kind,
            message: err.to_string(),
        }
    }

    /// True for failures that should send the user back to the login screen
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::NoCredential | ClientError::AuthExhausted | ClientError::RefreshFailed(_)
        )
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pick the most useful message out of an error body.
/// The API answers with either `{"message": ..}`, `{"error": ..}` or a bare string.
fn error_message(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        Value::Null => "<empty body>".to_string(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        other => other.to_string(),
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClientError::NoCredential.to_string(),
            "Not logged in: no session token is stored"
        );

        let err = ClientError::RefreshFailed("401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "Token refresh failed: 401 Unauthorized");

        let err = ClientError::validation("cvv", "must be 3 or 4 digits");
        assert_eq!(err.to_string(), "Invalid cvv: must be 3 or 4 digits");
    }

    #[test]
    fn test_api_error_message_from_body() {
        let err = ClientError::Api {
            status: 409,
            body: json!({"message": "Space already booked"}),
        };
        assert_eq!(err.to_string(), "API error: 409 - Space already booked");

        let err = ClientError::Api {
            status: 402,
            body: json!({"error": "Card declined"}),
        };
        assert_eq!(err.to_string(), "API error: 402 - Card declined");

        let err = ClientError::Api {
            status: 500,
            body: json!("boom"),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ClientError::Api {
            status: 503,
            body: Value::Null,
        };
        assert_eq!(err.to_string(), "API error: 503 - <empty body>");
    }

    #[test]
    fn test_requires_login() {
        assert!(ClientError::NoCredential.requires_login());
        assert!(ClientError::AuthExhausted.requires_login());
        assert!(ClientError::RefreshFailed("x".to_string()).requires_login());

        assert!(!ClientError::Api {
            status: 403,
            body: Value::Null
        }
        .requires_login());
        assert!(!ClientError::Network {
            kind: "timeout",
            message: "timed out".to_string()
        }
        .requires_login());
        assert!(!ClientError::validation("vin", "too short").requires_login());
    }

    #[test]
    fn test_status_accessor() {
        let err = ClientError::Api {
            status: 404,
            body: Value::Null,
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(ClientError::AuthExhausted.status(), None);
    }

    #[test]
    fn test_internal_error_message() {
        let err = ClientError::Internal(anyhow::anyhow!("Something went wrong"));
        assert_eq!(err.to_string(), "Internal error: Something went wrong");
    }
}
