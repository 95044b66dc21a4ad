use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, Method, StatusCode};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::UpstreamConfig;

/// One outbound call to the clinical API.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path below the base URL, query string included.
    pub path: String,
    pub token: Option<String>,
    pub body: Option<Value>,
    /// Attach `Cache-Control`/`Pragma`/`Expires` cache busting headers.
    pub no_cache: bool,
    /// `Accept` header value.
    pub accept: &'static str,
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream base URL is not configured (API_BASE_URL)")]
    NotConfigured,

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Port for the remote clinical API. Handlers only see this trait.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed upstream client.
#[derive(Clone)]
pub struct HttpUpstream {
    http: Client,
    base_url: Option<String>,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        if config.accept_invalid_certs {
            tracing::warn!("upstream TLS certificate validation is disabled");
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let base_url = self.base_url.as_deref().ok_or(UpstreamError::NotConfigured)?;
        let url = format!("{}{}", base_url, request.path);

        let mut builder = self
            .http
            .request(request.method, url)
            .header(header::ACCEPT, request.accept)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if request.no_cache {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
                .header(header::PRAGMA, "no-cache")
                .header(header::EXPIRES, "0");
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await?;
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
