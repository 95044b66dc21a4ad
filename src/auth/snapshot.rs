use axum::http::HeaderMap;
use serde::Serialize;

use super::{decode_claims, read_cookie, Role, SessionClaims};
use crate::middleware::edge::{self, EdgeDecision};

/// Navigation entry shown in the clinic shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
}

pub const MENU: &[MenuItem] = &[
    MenuItem { label: "Dashboard", path: "/" },
    MenuItem { label: "Patients", path: "/patients" },
    MenuItem { label: "Appointments", path: "/appointments" },
    MenuItem { label: "Visits", path: "/visits" },
    MenuItem { label: "Doctor Availability", path: "/doctor-availability" },
    MenuItem { label: "Doctor Slots", path: "/doctor-slots" },
    MenuItem { label: "Billing", path: "/billing" },
    MenuItem { label: "Reports", path: "/reports/summary" },
    MenuItem { label: "Roles", path: "/admin/roles" },
    MenuItem { label: "Specializations", path: "/admin/specializations" },
    MenuItem { label: "Settings", path: "/settings/profile" },
];

/// Locally decoded view of the session, used only for rendering decisions.
///
/// Nothing here authorizes a request. Route handlers re-check the cookie and
/// the edge middleware re-evaluates every navigation.
#[derive(Debug, Clone, Default)]
pub struct AuthSnapshot {
    token: Option<String>,
    claims: Option<SessionClaims>,
}

impl AuthSnapshot {
    pub fn from_token(token: Option<&str>) -> Self {
        let token = token.map(str::to_string).filter(|t| !t.trim().is_empty());
        let claims = token.as_deref().and_then(|t| decode_claims(t).ok());
        Self { token, claims }
    }

    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        Self::from_token(read_cookie(headers, cookie_name).as_deref())
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        self.claims.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.claims.as_ref()?.role.as_ref()
    }

    /// Undecodable tokens count as expired.
    pub fn is_expired(&self, now: i64) -> bool {
        self.claims.as_ref().map_or(true, |c| c.is_expired(now))
    }

    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role().is_some_and(|role| allowed.contains(role))
    }

    pub fn can_view(&self, path: &str, now: i64) -> bool {
        edge::evaluate(path, self.token.as_deref(), now) == EdgeDecision::Next
    }

    pub fn menu(&self, now: i64) -> Vec<MenuItem> {
        MENU.iter()
            .copied()
            .filter(|item| self.can_view(item.path, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_tokens::mint;
    use serde_json::json;

    #[test]
    fn no_token() {
        let snapshot = AuthSnapshot::from_token(None);
        assert!(!snapshot.has_token());
        assert!(snapshot.is_expired(0));
        assert!(snapshot.menu(0).is_empty());
    }

    #[test]
    fn receptionist_menu_hides_admin_entries() {
        let token = mint(json!({ "role": "Receptionist", "exp": 1_000 }));
        let snapshot = AuthSnapshot::from_token(Some(&token));
        assert!(snapshot.has_any_role(&[Role::Doctor, Role::Receptionist]));
        assert!(!snapshot.has_any_role(&[Role::Admin]));

        let paths: Vec<&str> = snapshot.menu(10).iter().map(|m| m.path).collect();
        assert!(paths.contains(&"/patients"));
        assert!(!paths.contains(&"/admin/roles"));
        assert!(!paths.contains(&"/billing"));
    }

    #[test]
    fn admin_menu_is_complete_until_expiry() {
        let token = mint(json!({ "role": "admin", "exp": 1_000 }));
        let snapshot = AuthSnapshot::from_token(Some(&token));
        assert_eq!(snapshot.menu(10).len(), MENU.len());
        assert!(snapshot.is_expired(1_000));
        assert!(snapshot.menu(1_000).is_empty());
    }
}
