use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response from an authenticated request
    #[error("API error: {status_text}")]
    Status {
        status: StatusCode,
        status_text: String,
    },

    /// Non-2xx response from register/login, with the server's explanation
    #[error("{error}")]
    Rejected { status: StatusCode, error: ErrorBody },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Generic status failure, carrying the status text
    pub fn from_status(status: StatusCode) -> Self {
        ApiError::Status {
            status,
            status_text: status_text(status),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Error body of a rejected register/login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// The body had a `detail` field
    Field { message: String },
    /// No usable `detail`; the whole body, serialized
    Raw { body: String },
}

impl ErrorBody {
    /// Resolve a parsed error body.
    ///
    /// An empty, `null`, `false` or zero `detail` counts as absent. A
    /// non-string `detail` is rendered the way JavaScript's `String()`
    /// would: arrays join with `,`, objects become `[object Object]`.
    pub fn from_value(value: &Value) -> Self {
        match value.get("detail") {
            Some(detail) if is_truthy(detail) => ErrorBody::Field {
                message: js_string(detail),
            },
            _ => ErrorBody::Raw {
                body: value.to_string(),
            },
        }
    }

    /// Resolve a raw response body. Non-JSON bodies are kept verbatim.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorBody::Raw {
                body: text.to_string(),
            },
        }
    }

    /// Resolve the body of a rejected response.
    ///
    /// An empty or unreadable body falls back to the status text.
    pub fn for_response(status: StatusCode, body: Option<&str>) -> Self {
        match body {
            Some(text) if !text.trim().is_empty() => Self::from_text(text),
            _ => ErrorBody::Raw {
                body: status_text(status),
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorBody::Field { message } => message,
            ErrorBody::Raw { body } => body,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Reason phrase for a status, or the numeric code when it has none
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_error_message() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "API error: Unauthorized");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_detail_field_is_used() {
        let body = ErrorBody::from_value(&json!({"detail": "Email or password is incorrect."}));
        assert_eq!(
            body,
            ErrorBody::Field {
                message: "Email or password is incorrect.".to_string()
            }
        );
    }

    #[test]
    fn test_missing_detail_falls_back_to_serialized_body() {
        let body = ErrorBody::from_value(&json!({"email": ["already exists"]}));
        assert_eq!(body.message(), r#"{"email":["already exists"]}"#);
    }

    #[test]
    fn test_empty_or_null_detail_counts_as_missing() {
        assert!(matches!(
            ErrorBody::from_value(&json!({"detail": ""})),
            ErrorBody::Raw { .. }
        ));
        assert!(matches!(
            ErrorBody::from_value(&json!({"detail": null})),
            ErrorBody::Raw { .. }
        ));
    }

    #[test]
    fn test_non_string_detail_renders_like_js() {
        assert_eq!(
            ErrorBody::from_value(&json!({"detail": ["a", "b"]})).message(),
            "a,b"
        );
        assert_eq!(
            ErrorBody::from_value(&json!({"detail": {"code": 1}})).message(),
            "[object Object]"
        );
        assert_eq!(ErrorBody::from_value(&json!({"detail": 42})).message(), "42");
        assert_eq!(ErrorBody::from_value(&json!({"detail": 1.5})).message(), "1.5");
    }

    #[test]
    fn test_empty_body_falls_back_to_status_text() {
        assert_eq!(
            ErrorBody::for_response(StatusCode::BAD_GATEWAY, Some("")).message(),
            "Bad Gateway"
        );
        assert_eq!(
            ErrorBody::for_response(StatusCode::SERVICE_UNAVAILABLE, None).message(),
            "Service Unavailable"
        );
        assert_eq!(
            ErrorBody::for_response(StatusCode::BAD_REQUEST, Some(r#"{"detail": "bad"}"#)).message(),
            "bad"
        );
    }

    #[test]
    fn test_raw_body_keeps_server_key_order() {
        let text = r#"{"password_confirm":["Passwords do not match."],"email":["bad"]}"#;
        assert_eq!(ErrorBody::from_text(text).message(), text);
    }

    #[test]
    fn test_non_json_body_kept_verbatim() {
        let body = ErrorBody::from_text("Bad Gateway");
        assert_eq!(
            body,
            ErrorBody::Raw {
                body: "Bad Gateway".to_string()
            }
        );
    }
}
