use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use super::route::{ResponseKind, RouteSpec};
use super::upstream::UpstreamResponse;
use crate::error::{extract_message, field_errors_from_value, GatewayError};

/// Successful payload handed back to the browser.
#[derive(Debug)]
pub enum Relay {
    Json { status: StatusCode, body: Value },
    Binary { content_type: String, body: Bytes },
}

impl Relay {
    pub fn ok(body: Value) -> Self {
        Relay::Json {
            status: StatusCode::OK,
            body,
        }
    }

    /// JSON body, if this is a JSON relay.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Relay::Json { body, .. } => Some(body),
            Relay::Binary { .. } => None,
        }
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        match self {
            Relay::Json { status, body } => (status, Json(body)).into_response(),
            Relay::Binary { content_type, body } => (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, "inline".to_string()),
                ],
                Body::from(body),
            )
                .into_response(),
        }
    }
}

/// Map an upstream response onto the gateway's success payload or error envelope.
pub fn normalize(spec: &RouteSpec, response: UpstreamResponse) -> Result<Relay, GatewayError> {
    if !response.status.is_success() {
        return upstream_failure(spec, response);
    }

    if spec.kind == ResponseKind::Binary {
        let content_type = response
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        return Ok(Relay::Binary {
            content_type,
            body: response.body,
        });
    }

    // 204 cannot carry the JSON message body
    let status = match response.status {
        StatusCode::NO_CONTENT => StatusCode::OK,
        other => other,
    };

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Relay::Json {
            status,
            body: json!({ "message": spec.success_message }),
        });
    }

    if response.is_json() {
        let value = serde_json::from_slice::<Value>(&response.body).map_err(|e| {
            tracing::error!(route = spec.name, error = %e, "upstream returned invalid JSON");
            GatewayError::transport(spec.envelope, spec.fallback)
        })?;
        return Ok(Relay::Json {
            status,
            body: spec.apply_reshape(value),
        });
    }

    let text = String::from_utf8_lossy(&response.body).trim().to_string();
    Ok(Relay::Json {
        status,
        body: json!({ "message": text }),
    })
}

// Only shimmed statuses come back as Ok.
fn upstream_failure(spec: &RouteSpec, response: UpstreamResponse) -> Result<Relay, GatewayError> {
    if let Some(payload) = spec.shim_payload(response.status) {
        tracing::warn!(
            route = spec.name,
            status = response.status.as_u16(),
            "upstream endpoint unavailable, serving fallback payload"
        );
        return Ok(Relay::ok(payload));
    }

    let parsed = serde_json::from_slice::<Value>(&response.body).ok();
    let err = match parsed {
        Some(value) => {
            let message = extract_message(&value).unwrap_or_else(|| spec.fallback.to_string());
            GatewayError::upstream(response.status, spec.envelope, message)
                .with_errors(field_errors_from_value(&value))
        }
        None => GatewayError::upstream(response.status, spec.envelope, spec.fallback),
    };
    tracing::debug!(route = spec.name, status = response.status.as_u16(), "upstream rejected request");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Envelope;
    use crate::gateway::route::{Reshape, Shim};

    fn response(status: u16, content_type: Option<&str>, body: &str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: Bytes::from(body.to_string()),
        }
    }

    const LIST: RouteSpec = RouteSpec::get("roles.list", "/api/roles", "/Roles", Envelope::Problem)
        .fallback("Failed to fetch roles");

    #[test]
    fn json_success_passes_through() {
        let relay = normalize(&LIST, response(200, Some("application/json; charset=utf-8"), r#"[{"id":1}]"#)).unwrap();
        assert_eq!(relay.into_json(), Some(json!([{ "id": 1 }])));
    }

    #[test]
    fn empty_success_gets_default_message() {
        let spec = LIST.success_message("Role deleted successfully");
        match normalize(&spec, response(204, None, "")).unwrap() {
            Relay::Json { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body["message"], "Role deleted successfully");
            }
            other => panic!("unexpected relay {:?}", other),
        }
    }

    #[test]
    fn text_success_is_wrapped() {
        let relay = normalize(&LIST, response(200, Some("text/plain"), "Updated")).unwrap();
        assert_eq!(relay.into_json(), Some(json!({ "message": "Updated" })));
    }

    #[test]
    fn invalid_json_is_a_transport_failure() {
        let err = normalize(&LIST, response(200, Some("application/json"), "{oops")).unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to fetch roles");
    }

    #[test]
    fn upstream_error_keeps_status_and_business_errors() {
        let err = normalize(
            &LIST,
            response(409, Some("application/json"), r#"{"title":"Conflict","errors":{"Business":["Role in use"]}}"#),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        let body = err.to_json();
        assert_eq!(body["title"], "Conflict");
        assert_eq!(body["status"], 409);
        assert_eq!(body["errors"]["Business"][0], "Role in use");
    }

    #[test]
    fn unparseable_error_uses_route_fallback() {
        let err = normalize(&LIST, response(502, Some("text/html"), "<html>bad gateway</html>")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Failed to fetch roles");
    }

    #[test]
    fn shim_turns_declared_status_into_success() {
        let spec = LIST.shim(Shim::EmptyListOn(&[404]));
        assert_eq!(normalize(&spec, response(404, None, "")).unwrap().into_json(), Some(json!([])));
        assert!(normalize(&spec, response(500, None, "")).is_err());
    }

    #[test]
    fn binary_relay_keeps_content_type() {
        let spec = RouteSpec::get("photo", "/p", "/P", Envelope::Message).binary();
        match normalize(&spec, response(200, Some("image/png"), "PNG")).unwrap() {
            Relay::Binary { content_type, body } => {
                assert_eq!(content_type, "image/png");
                assert_eq!(&body[..], b"PNG");
            }
            other => panic!("unexpected relay {:?}", other),
        }
    }

    #[test]
    fn reshape_applies_to_success_only() {
        let spec = LIST.reshape(Reshape::RenameKeys(&[("Id", "id")]));
        let relay = normalize(&spec, response(200, Some("application/json"), r#"{"Id":3}"#)).unwrap();
        assert_eq!(relay.into_json(), Some(json!({ "id": 3 })));
    }
}
