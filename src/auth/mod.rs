pub mod cookie;
pub mod snapshot;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use cookie::{clear_session_cookie, read_cookie, session_cookie};
pub use snapshot::AuthSnapshot;

const USER_ID_CLAIMS: &[&str] = &[
    "userId",
    "UserId",
    "nameid",
    "sub",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];
const USER_NAME_CLAIMS: &[&str] = &[
    "userName",
    "UserName",
    "unique_name",
    "name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];
const ROLE_CLAIMS: &[&str] = &[
    "role",
    "Role",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "doctor" => Role::Doctor,
            "receptionist" => Role::Receptionist,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::parse(&raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims the gateway reads out of the upstream-issued session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub role: Option<Role>,
    /// Expiry in epoch seconds
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// A token without `exp` is treated as expired.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.exp {
            Some(exp) => exp <= now,
            None => true,
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            user_id: first_claim(map, USER_ID_CLAIMS),
            user_name: first_claim(map, USER_NAME_CLAIMS),
            role: first_claim(map, ROLE_CLAIMS).map(|r| Role::parse(&r)),
            exp: map.get("exp").and_then(|v| match v {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("malformed session token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("session token has expired")]
    Expired,
}

/// Decode the token payload without verifying its signature.
///
/// The gateway holds no signing key; the upstream remains the authority and
/// re-validates the bearer on every forwarded call. Claims decoded here only
/// drive routing decisions and `/api/auth/me`.
pub fn decode_claims(token: &str) -> Result<SessionClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(SessionClaims::from_map(&data.claims))
}

/// Decode and reject tokens whose `exp` is not in the future.
pub fn validate_session(token: &str, now: i64) -> Result<SessionClaims, TokenError> {
    let claims = decode_claims(token)?;
    if claims.is_expired(now) {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

fn first_claim(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| claim_as_string(map.get(*key)?))
}

fn claim_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(claim_as_string),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::Value;

    pub fn mint(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"upstream-secret"),
        )
        .expect("token should encode")
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::mint;
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_short_claim_names() {
        let token = mint(json!({ "userId": 7, "userName": "amina", "role": "Doctor", "exp": 2_000 }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.user_id.as_deref(), Some("7"));
        assert_eq!(claims.user_name.as_deref(), Some("amina"));
        assert_eq!(claims.role, Some(Role::Doctor));
        assert_eq!(claims.exp, Some(2_000));
    }

    #[test]
    fn decodes_dotnet_claim_uris() {
        let token = mint(json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": "u-1",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name": "desk",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": ["Receptionist"],
            "aud": "clinic",
            "exp": 10
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.user_id.as_deref(), Some("u-1"));
        assert_eq!(claims.role, Some(Role::Receptionist));
    }

    #[test]
    fn expiry_is_compared_to_now() {
        let token = mint(json!({ "role": "admin", "exp": 100 }));
        assert!(validate_session(&token, 99).is_ok());
        assert!(matches!(validate_session(&token, 100), Err(TokenError::Expired)));
        assert!(matches!(validate_session(&token, 500), Err(TokenError::Expired)));
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let token = mint(json!({ "role": "admin" }));
        assert!(matches!(validate_session(&token, 0), Err(TokenError::Expired)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(decode_claims("not-a-jwt"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse(" ADMIN "), Role::Admin);
        assert_eq!(Role::parse("nurse"), Role::Other("nurse".into()));
        assert_eq!(serde_json::to_value(Role::Doctor).unwrap(), json!("doctor"));
    }
}
