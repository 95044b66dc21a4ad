// handlers/public/session.rs - POST /api/auth/login, POST /api/auth/logout
//
// Login is the only proxied call made without a bearer token. The upstream
// issues the JWT; the gateway stores it in the HTTP-only session cookie and
// never hands it to the browser's script context.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{self, clear_session_cookie, session_cookie};
use crate::error::{Envelope, GatewayError};
use crate::gateway::RouteSpec;
use crate::state::AppState;

const LOGIN: RouteSpec = RouteSpec::post("auth.login", "/api/auth/login", "/Auth/login", Envelope::Message)
    .required(&["username", "password"])
    .trim(&["username"])
    .fallback("Login failed");

/// Pull the issued token out of the upstream login answer.
fn issued_token(body: &Value) -> Option<String> {
    ["token", "Token", "accessToken"]
        .iter()
        .filter_map(|key| body.get(*key))
        .chain(body.get("data").and_then(|d| d.get("token")))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// POST /api/auth/login - exchange credentials for the session cookie
pub async fn login_post(State(state): State<AppState>, body: Bytes) -> Result<Response, GatewayError> {
    let payload = LOGIN.prepare_body(&HashMap::new(), &body)?;
    let username = payload
        .as_ref()
        .and_then(|p| p.get("username"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    tracing::info!(%username, "login attempt");

    let answer = state
        .gateway
        .dispatch_json(&LOGIN, LOGIN.upstream.to_string(), None, payload)
        .await
        .map_err(|e| {
            tracing::warn!(%username, status = e.status.as_u16(), "login rejected");
            e
        })?;

    let token = issued_token(&answer).ok_or_else(|| {
        tracing::error!(%username, "upstream login answer carried no token");
        GatewayError::transport(Envelope::Message, LOGIN.fallback)
    })?;

    let claims = auth::decode_claims(&token).map_err(|e| {
        tracing::error!(%username, error = %e, "upstream issued an unreadable token");
        GatewayError::transport(Envelope::Message, LOGIN.fallback)
    })?;

    tracing::info!(%username, role = ?claims.role, "login succeeded");

    let cookie = session_cookie(&state.session, &token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Login successful",
            "user": claims,
        })),
    )
        .into_response())
}

/// POST /api/auth/logout - expire the session cookie
///
/// Nothing is sent upstream; the token simply stops being presented.
pub async fn logout_post(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie(&state.session))],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}
