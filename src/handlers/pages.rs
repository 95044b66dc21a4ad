// handlers/pages.rs - browser page routes
//
// Every page answers the same HTML shell; the client bundle takes over from
// there. The edge middleware decides whether the shell is served at all.

use axum::{
    extract::{OriginalUri, State},
    http::HeaderMap,
    middleware,
    response::Html,
    routing::get,
    Router,
};

use crate::auth::{self, snapshot::MENU, AuthSnapshot};
use crate::middleware::edge_middleware;
use crate::state::AppState;

const PAGES: &[&str] = &[
    "/",
    "/login",
    "/admin/roles",
    "/admin/specializations",
    "/billing",
    "/visits",
    "/visits/:id",
    "/appointments",
    "/patients",
    "/doctor-availability",
    "/doctor-slots",
    "/reports/*rest",
    "/settings/*rest",
];

fn escape_html(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn page_title(path: &str) -> &'static str {
    match path {
        "/login" => "Sign in",
        _ => MENU
            .iter()
            .filter(|item| item.path != "/")
            .find(|item| path.starts_with(item.path.trim_end_matches("/summary").trim_end_matches("/profile")))
            .map(|item| item.label)
            .unwrap_or("Dashboard"),
    }
}

async fn shell(State(state): State<AppState>, OriginalUri(uri): OriginalUri, headers: HeaderMap) -> Html<String> {
    let snapshot = AuthSnapshot::from_headers(&headers, &state.session.cookie_name);
    let now = auth::now_epoch_seconds();

    let nav: String = snapshot
        .menu(now)
        .iter()
        .map(|item| format!("<li><a href=\"{}\">{}</a></li>", item.path, item.label))
        .collect();
    let user = snapshot
        .claims()
        .and_then(|c| c.user_name.as_deref())
        .map(escape_html)
        .unwrap_or_default();

    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title} | Clinic</title></head>\n\
         <body>\n<header data-user=\"{user}\"></header>\n<nav><ul>{nav}</ul></nav>\n\
         <main id=\"app\"></main>\n<script src=\"/static/app.js\" defer></script>\n</body>\n</html>\n",
        title = page_title(uri.path()),
    ))
}

/// Page routes with the edge gate applied.
pub fn routes(state: AppState) -> Router<AppState> {
    PAGES
        .iter()
        .fold(Router::new(), |router, path| router.route(path, get(shell)))
        .route_layer(middleware::from_fn_with_state(state, edge_middleware))
}
