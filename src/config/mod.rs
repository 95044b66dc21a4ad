use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub visits: VisitStoreKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the clinical API, without trailing slash. `None` when unset.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Skip certificate validation towards the upstream. Security relevant.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitStoreKind {
    Upstream,
    Memory,
}

const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 120;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("CLINIC_GATEWAY_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("LOG_FORMAT") {
            self.server.json_logs = v.eq_ignore_ascii_case("json");
        }

        // Upstream overrides
        if let Ok(v) = env::var("API_BASE_URL") {
            self.upstream.base_url = normalize_base_url(&v);
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v
                .parse::<u64>()
                .map(|secs| secs.clamp(1, MAX_UPSTREAM_TIMEOUT_SECS))
                .unwrap_or(self.upstream.timeout_secs);
        }
        if let Ok(v) = env::var("UPSTREAM_ACCEPT_INVALID_CERTS") {
            self.upstream.accept_invalid_certs =
                v.parse().unwrap_or(self.upstream.accept_invalid_certs);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.trim().is_empty() {
                self.session.cookie_name = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("SESSION_MAX_AGE_SECS") {
            self.session.max_age_secs = v.parse().unwrap_or(self.session.max_age_secs);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.session.secure = v.parse().unwrap_or(self.session.secure);
        }

        if let Ok(v) = env::var("VISIT_STORE") {
            self.visits = match v.to_ascii_lowercase().as_str() {
                "memory" => VisitStoreKind::Memory,
                _ => VisitStoreKind::Upstream,
            };
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                json_logs: false,
            },
            upstream: UpstreamConfig {
                base_url: None,
                timeout_secs: 30,
                // Local clinical backends run with self-signed certificates
                accept_invalid_certs: true,
            },
            session: SessionConfig {
                cookie_name: "token".to_string(),
                max_age_secs: 60 * 60,
                secure: false,
            },
            visits: VisitStoreKind::Upstream,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                json_logs: true,
            },
            upstream: UpstreamConfig {
                base_url: None,
                timeout_secs: 60,
                accept_invalid_certs: true,
            },
            session: SessionConfig {
                cookie_name: "token".to_string(),
                max_age_secs: 60 * 60,
                secure: true,
            },
            visits: VisitStoreKind::Upstream,
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                json_logs: true,
            },
            upstream: UpstreamConfig {
                base_url: None,
                timeout_secs: 30,
                accept_invalid_certs: false,
            },
            session: SessionConfig {
                cookie_name: "token".to_string(),
                max_age_secs: 60 * 60,
                secure: true,
            },
            visits: VisitStoreKind::Upstream,
        }
    }
}

/// Validate an upstream base URL and strip trailing slashes so paths can be appended.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            Some(trimmed.to_string())
        }
        Ok(parsed) => {
            tracing::warn!(scheme = parsed.scheme(), "unsupported API_BASE_URL scheme");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid API_BASE_URL");
            None
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
