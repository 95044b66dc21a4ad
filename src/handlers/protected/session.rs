// handlers/protected/session.rs - GET /api/auth/me
//
// Unlike the proxied routes, this one checks expiry as well as presence.

use axum::{extract::State, http::HeaderMap, response::Json};

use crate::auth::{self, SessionClaims};
use crate::error::{Envelope, GatewayError};
use crate::state::AppState;

pub async fn me_get(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionClaims>, GatewayError> {
    let token = state.gateway.require_token(&headers, Envelope::Message)?;

    let claims = auth::validate_session(&token, auth::now_epoch_seconds()).map_err(|e| {
        tracing::debug!(error = %e, "session rejected");
        GatewayError::unauthorized(Envelope::Message)
    })?;

    Ok(Json(claims))
}
