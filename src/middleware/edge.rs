use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{self, read_cookie, Role};
use crate::state::AppState;

/// Paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &["/login", "/api/auth/login"];

/// Path prefixes open to doctors and receptionists.
pub const STAFF_PREFIXES: &[&str] = &[
    "/",
    "/patients",
    "/visits",
    "/appointments",
    "/doctor-availability",
    "/doctor-slots",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeState {
    Unauthenticated,
    AuthenticatedAdmin,
    AuthenticatedDoctor,
    AuthenticatedReceptionist,
    /// Valid token carrying a role the gateway does not know.
    AuthenticatedOther,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Next,
    Redirect(String),
}

impl EdgeState {
    pub fn classify(token: Option<&str>, now: i64) -> Self {
        let Some(token) = token else {
            return EdgeState::Unauthenticated;
        };
        match auth::validate_session(token, now) {
            Ok(claims) => match claims.role {
                Some(Role::Admin) => EdgeState::AuthenticatedAdmin,
                Some(Role::Doctor) => EdgeState::AuthenticatedDoctor,
                Some(Role::Receptionist) => EdgeState::AuthenticatedReceptionist,
                _ => EdgeState::AuthenticatedOther,
            },
            Err(_) => EdgeState::Unauthenticated,
        }
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// `/` only matches itself; other prefixes match the segment and anything below it.
pub fn prefix_matches(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn staff_allowed(path: &str) -> bool {
    STAFF_PREFIXES.iter().any(|prefix| prefix_matches(path, prefix))
}

pub fn login_redirect(path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/login?returnUrl={}", encoded)
}

/// Single pass decision for a navigation to `path`.
pub fn evaluate(path: &str, token: Option<&str>, now: i64) -> EdgeDecision {
    let state = EdgeState::classify(token, now);

    if is_public(path) {
        if path == "/login" && state != EdgeState::Unauthenticated {
            return EdgeDecision::Redirect("/".to_string());
        }
        return EdgeDecision::Next;
    }

    match state {
        EdgeState::Unauthenticated => EdgeDecision::Redirect(login_redirect(path)),
        EdgeState::AuthenticatedAdmin => EdgeDecision::Next,
        EdgeState::AuthenticatedReceptionist if prefix_matches(path, "/admin") => {
            EdgeDecision::Redirect("/".to_string())
        }
        EdgeState::AuthenticatedDoctor | EdgeState::AuthenticatedReceptionist => {
            if staff_allowed(path) {
                EdgeDecision::Next
            } else {
                EdgeDecision::Redirect("/".to_string())
            }
        }
        EdgeState::AuthenticatedOther if path == "/" => EdgeDecision::Next,
        EdgeState::AuthenticatedOther => EdgeDecision::Redirect("/".to_string()),
    }
}

/// Path based allow/deny gate run in front of page routes.
pub async fn edge_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let token = read_cookie(request.headers(), &state.session.cookie_name);

    match evaluate(&path, token.as_deref(), auth::now_epoch_seconds()) {
        EdgeDecision::Next => next.run(request).await,
        EdgeDecision::Redirect(target) => {
            tracing::debug!(%path, %target, "edge redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_tokens::mint;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn token(role: &str) -> String {
        mint(json!({ "role": role, "userId": "1", "exp": NOW + 600 }))
    }

    #[test]
    fn receptionist_is_kept_out_of_admin() {
        let t = token("receptionist");
        assert_eq!(
            evaluate("/admin/roles", Some(&t), NOW),
            EdgeDecision::Redirect("/".into())
        );
        assert_eq!(evaluate("/patients/12", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/billing", Some(&t), NOW), EdgeDecision::Redirect("/".into()));
    }

    #[test]
    fn admin_passes_everywhere() {
        let t = token("admin");
        assert_eq!(evaluate("/admin/roles", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/reports/daily", Some(&t), NOW), EdgeDecision::Next);
    }

    #[test]
    fn doctor_allow_list() {
        let t = token("doctor");
        assert_eq!(evaluate("/", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/doctor-slots", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/visits/9", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/settings/profile", Some(&t), NOW), EdgeDecision::Redirect("/".into()));
        // prefix must end on a segment boundary
        assert_eq!(evaluate("/visitsx", Some(&t), NOW), EdgeDecision::Redirect("/".into()));
    }

    #[test]
    fn missing_or_expired_token_goes_to_login() {
        let expired = mint(json!({ "role": "admin", "exp": NOW - 1 }));
        let expected = EdgeDecision::Redirect("/login?returnUrl=%2Fadmin%2Froles".into());
        assert_eq!(evaluate("/admin/roles", None, NOW), expected);
        assert_eq!(evaluate("/admin/roles", Some(&expired), NOW), expected);
        assert_eq!(evaluate("/admin/roles", Some("garbage"), NOW), expected);
    }

    #[test]
    fn login_page_rules() {
        assert_eq!(evaluate("/login", None, NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/api/auth/login", None, NOW), EdgeDecision::Next);
        let t = token("doctor");
        assert_eq!(evaluate("/login", Some(&t), NOW), EdgeDecision::Redirect("/".into()));
    }

    #[test]
    fn unknown_role_only_reaches_home() {
        let t = token("nurse");
        assert_eq!(evaluate("/", Some(&t), NOW), EdgeDecision::Next);
        assert_eq!(evaluate("/patients", Some(&t), NOW), EdgeDecision::Redirect("/".into()));
    }
}
