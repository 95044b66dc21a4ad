// handlers/protected/visits.rs - GET/POST /api/visits
//
// Backed by whichever VisitStore the state carries, not by the route table.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{Envelope, GatewayError};
use crate::gateway::RouteSpec;
use crate::state::AppState;

const NEW_VISIT: RouteSpec = RouteSpec::post("visits.create", "/api/visits", "/Visit", Envelope::Message)
    .required(&["patientId", "doctorId"])
    .trim(&["notes", "chiefComplaint"]);

pub async fn visits_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Json<Value>, GatewayError> {
    let token = state.gateway.require_token(&headers, Envelope::Message)?;
    let visits = state.visits.list(&token, query.as_deref()).await?;
    Ok(Json(visits))
}

pub async fn visits_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), GatewayError> {
    let token = state.gateway.require_token(&headers, Envelope::Message)?;
    let visit = NEW_VISIT.prepare_body(&HashMap::new(), &body)?.unwrap_or_else(|| json!({}));

    let created = state.visits.append(&token, visit).await?;
    let id = created.get("id").cloned().unwrap_or_default();
    tracing::info!(%id, "visit created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Visit created successfully", "visit": created })),
    ))
}
