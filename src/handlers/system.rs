// handlers/system.rs - GET /api (service descriptor), GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Clinic Gateway",
        "version": version,
        "description": "Session-aware gateway in front of the clinical REST API",
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/logout (public), /api/auth/me",
            "roles": "/api/roles[/:id]",
            "specializations": "/api/specializations[/:id]",
            "appointments": "/api/appointments[/:id[/status]], /api/appointments/types",
            "visits": "/api/visits[/:id[/<detail>[/:itemId]]], /api/visits/patient/:patientId",
            "patients": "/api/patients[/:id[/photo]], /api/patients/search",
            "users": "/api/users[/:id[/role]]",
            "dropdown": "/api/dropdown/:kind",
            "availability": "/api/doctor-availability[/:id], /api/doctor-availability/doctor/:doctorId",
            "slots": "/api/doctor-slots/:doctorId",
            "reports": "/api/reports/summary",
            "health": "/health",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    if state.upstream_configured {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "upstream": "configured"
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "upstream": "missing",
                "error": "API_BASE_URL is not set"
            })),
        )
    }
}
