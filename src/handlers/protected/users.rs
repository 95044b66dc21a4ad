// handlers/protected/users.rs - PUT /api/users/:id/role
//
// Three sequential upstream calls: assign, resolve the role name, reload the
// user. Any failing call fails the whole request; nothing is retried.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{Envelope::Problem, GatewayError};
use crate::gateway::RouteSpec;
use crate::state::AppState;

const ASSIGN_ROLE: RouteSpec = RouteSpec::put("users.assign_role", "/api/users/:id/role", "/Users/{id}/assign-role", Problem)
    .required(&["roleId"])
    .fallback("Failed to assign role");
const FETCH_ROLE: RouteSpec = RouteSpec::get("users.assign_role.role", "/api/users/:id/role", "/Roles/{roleId}", Problem)
    .fallback("Failed to fetch role");
const FETCH_USER: RouteSpec = RouteSpec::get("users.assign_role.user", "/api/users/:id/role", "/Users/{id}", Problem)
    .fallback("Failed to fetch updated user");

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

pub async fn assign_role_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let gateway = &state.gateway;
    let token = gateway.require_token(&headers, Problem)?;

    let mut params = HashMap::from([("id".to_string(), id)]);
    let body = ASSIGN_ROLE.prepare_body(&params, &body)?;
    let role_id = body
        .as_ref()
        .and_then(|b| b.get("roleId"))
        .map(param_text)
        .unwrap_or_default();

    gateway
        .dispatch(&ASSIGN_ROLE, ASSIGN_ROLE.upstream_path(&params, None)?, Some(&token), body)
        .await?;

    params.insert("roleId".to_string(), role_id);
    let role = gateway
        .dispatch_json(&FETCH_ROLE, FETCH_ROLE.upstream_path(&params, None)?, Some(&token), None)
        .await?;
    let user = gateway
        .dispatch_json(&FETCH_USER, FETCH_USER.upstream_path(&params, None)?, Some(&token), None)
        .await?;

    let role_name = ["name", "Name", "roleName"]
        .iter()
        .find_map(|key| role.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();
    tracing::info!(user = %params["id"], role = %role_name, "role assigned");

    Ok(Json(json!({
        "message": "Role assigned successfully",
        "roleName": role_name,
        "user": user,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_render_without_quotes() {
        assert_eq!(param_text(&json!(7)), "7");
        assert_eq!(param_text(&json!(" 7 ")), "7");
    }
}
