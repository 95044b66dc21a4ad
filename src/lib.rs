pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod store;
pub mod table;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{pages, protected, public, system};
pub use crate::state::AppState;

/// Full HTTP surface: system, auth, proxied API and gated page routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/api", get(system::root))
        .route("/health", get(system::health))
        .merge(auth_routes())
        // Protected API
        .merge(protected::proxy::routes())
        .merge(composite_routes())
        // Pages
        .merge(pages::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(public::login_post))
        .route("/api/auth/logout", post(public::logout_post))
        .route("/api/auth/me", get(protected::me_get))
}

// Routes that need more than a single table-driven upstream call
fn composite_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/:id/role", put(protected::assign_role_put))
        .route("/api/visits", get(protected::visits_get).post(protected::visits_post))
}
