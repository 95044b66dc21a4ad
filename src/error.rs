// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Field name -> list of messages, the shape the upstream uses for validation errors.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The two JSON error shapes clients branch on. Each route picks one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    /// `{"message": "..."}`
    Message,
    /// `{"title": "...", "status": 401, "errors": {"Field": ["..."]}}`
    Problem,
}

pub const UNAUTHORIZED_TITLE: &str = "Unauthorized";
pub const UNAUTHORIZED_DETAIL: &str = "Unauthorized access. Please login.";
pub const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

/// Error returned by gateway routes, rendered according to its envelope.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub status: StatusCode,
    pub envelope: Envelope,
    pub message: String,
    pub errors: FieldErrors,
}

impl GatewayError {
    pub fn new(status: StatusCode, envelope: Envelope, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope,
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    /// Missing or expired session. Never reaches the upstream.
    pub fn unauthorized(envelope: Envelope) -> Self {
        let mut err = match envelope {
            Envelope::Message => Self::new(StatusCode::UNAUTHORIZED, envelope, "Unauthorized"),
            Envelope::Problem => Self::new(StatusCode::UNAUTHORIZED, envelope, UNAUTHORIZED_TITLE),
        };
        if envelope == Envelope::Problem {
            err.errors.insert(
                "Authorization".to_string(),
                vec![UNAUTHORIZED_DETAIL.to_string()],
            );
        }
        err
    }

    /// Local validation failure keyed by field.
    pub fn validation(envelope: Envelope, errors: FieldErrors) -> Self {
        let message = match envelope {
            Envelope::Message => "Validation failed",
            Envelope::Problem => VALIDATION_TITLE,
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            envelope,
            message: message.to_string(),
            errors,
        }
    }

    pub fn bad_request(envelope: Envelope, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, envelope, message)
    }

    /// Upstream reported a business failure; status is forwarded unchanged.
    pub fn upstream(status: StatusCode, envelope: Envelope, message: impl Into<String>) -> Self {
        Self::new(status, envelope, message)
    }

    /// Network failure or unreadable upstream payload.
    pub fn transport(envelope: Envelope, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, envelope, message)
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn to_json(&self) -> Value {
        match self.envelope {
            Envelope::Message => {
                let mut body = json!({ "message": self.message });
                if !self.errors.is_empty() {
                    body["errors"] = json!(self.errors);
                }
                body
            }
            Envelope::Problem => json!({
                "title": self.message,
                "status": self.status.as_u16(),
                "errors": self.errors,
            }),
        }
    }
}

/// Pull the `errors` object out of an upstream problem body, tolerating string values.
pub fn field_errors_from_value(value: &Value) -> FieldErrors {
    let mut out = FieldErrors::new();
    let Some(Value::Object(map)) = value.get("errors") else {
        return out;
    };
    for (field, messages) in map {
        let list = match messages {
            Value::Array(items) => items
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect(),
            Value::String(s) => vec![s.clone()],
            _ => continue,
        };
        out.insert(field.clone(), list);
    }
    out
}

/// Best-effort human message from an upstream error body: `message`, then `title`.
pub fn extract_message(value: &Value) -> Option<String> {
    let obj: &Map<String, Value> = value.as_object()?;
    ["message", "Message", "title", "Title"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str).filter(|s| !s.trim().is_empty()))
        .map(str::to_string)
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for GatewayError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_unauthorized_shape() {
        let body = GatewayError::unauthorized(Envelope::Problem).to_json();
        assert_eq!(body["title"], "Unauthorized");
        assert_eq!(body["status"], 401);
        assert_eq!(body["errors"]["Authorization"][0], UNAUTHORIZED_DETAIL);
    }

    #[test]
    fn message_unauthorized_shape() {
        let body = GatewayError::unauthorized(Envelope::Message).to_json();
        assert_eq!(body, json!({ "message": "Unauthorized" }));
    }

    #[test]
    fn message_validation_keeps_field_map() {
        let mut errors = FieldErrors::new();
        errors.insert("doctorId".into(), vec!["doctorId is required".into()]);
        let err = GatewayError::validation(Envelope::Message, errors);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["errors"]["doctorId"][0], "doctorId is required");
    }

    #[test]
    fn extracts_message_then_title() {
        assert_eq!(
            extract_message(&json!({ "title": "Conflict", "message": "Role exists" })),
            Some("Role exists".to_string())
        );
        assert_eq!(
            extract_message(&json!({ "title": "Not Found" })),
            Some("Not Found".to_string())
        );
        assert_eq!(
            extract_message(&json!({ "message": "", "title": "Conflict" })),
            Some("Conflict".to_string())
        );
        assert_eq!(extract_message(&json!({ "message": "  " })), None);
        assert_eq!(extract_message(&json!("plain")), None);
    }

    #[test]
    fn upstream_field_errors_accept_strings_and_arrays() {
        let errors = field_errors_from_value(&json!({
            "errors": { "Business": "Role in use", "Name": ["Too long", 3] }
        }));
        assert_eq!(errors["Business"], vec!["Role in use".to_string()]);
        assert_eq!(errors["Name"], vec!["Too long".to_string()]);
    }
}
