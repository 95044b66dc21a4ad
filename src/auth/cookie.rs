use axum::http::{header, HeaderMap};

use crate::config::SessionConfig;

/// Read a cookie value by name from every `Cookie` header on the request.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(session: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.cookie_name, token, session.max_age_secs
    );
    if session.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie(session: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        session.cookie_name
    );
    if session.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    #[test]
    fn finds_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def.ghi; lang=en"));
        assert_eq!(read_cookie(&headers, "token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(read_cookie(&headers, "token"), None);
    }

    #[test]
    fn cookie_attributes() {
        let session = AppConfig::development().session;
        let set = session_cookie(&session, "jwt");
        assert_eq!(set, "token=jwt; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        let cleared = clear_session_cookie(&session);
        assert!(cleared.starts_with("token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"));
    }
}
