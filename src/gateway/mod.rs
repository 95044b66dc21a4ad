pub mod normalize;
pub mod route;
pub mod upstream;

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::read_cookie;
use crate::error::{Envelope, GatewayError};

pub use normalize::{normalize, Relay};
pub use route::{Reshape, ResponseKind, RouteSpec, Shim, Verb};
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};

/// Inbound request parts the gateway needs.
#[derive(Debug, Default)]
pub struct GatewayRequest {
    pub headers: HeaderMap,
    pub params: HashMap<String, String>,
    pub query: Option<String>,
    pub body: Bytes,
}

/// Session gate + forwarder + normalizer shared by every proxied route.
#[derive(Clone)]
pub struct Gateway {
    upstream: Arc<dyn Upstream>,
    cookie_name: String,
}

impl Gateway {
    pub fn new(upstream: Arc<dyn Upstream>, cookie_name: impl Into<String>) -> Self {
        Self {
            upstream,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session gate: presence of the cookie only, no signature or expiry check.
    pub fn require_token(&self, headers: &HeaderMap, envelope: Envelope) -> Result<String, GatewayError> {
        read_cookie(headers, &self.cookie_name).ok_or_else(|| GatewayError::unauthorized(envelope))
    }

    /// Full pipeline for a declarative route.
    pub async fn forward(&self, spec: &RouteSpec, request: GatewayRequest) -> Result<Relay, GatewayError> {
        let token = self.require_token(&request.headers, spec.envelope)?;
        let body = spec.prepare_body(&request.params, &request.body)?;
        let path = spec.upstream_path(&request.params, request.query.as_deref())?;
        self.dispatch(spec, path, Some(&token), body).await
    }

    /// Send one upstream call described by `spec` and normalize the answer.
    pub async fn dispatch(
        &self,
        spec: &RouteSpec,
        path: String,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Relay, GatewayError> {
        let method = spec.verb.method();
        tracing::debug!(route = spec.name, %method, %path, "forwarding to upstream");

        let request = UpstreamRequest {
            method,
            path,
            token: token.map(str::to_string),
            body,
            no_cache: spec.no_cache,
            accept: spec.accept(),
        };

        let response = self.upstream.send(request).await.map_err(|e| {
            tracing::error!(route = spec.name, error = %e, "upstream call failed");
            GatewayError::transport(spec.envelope, spec.fallback)
        })?;
        tracing::debug!(route = spec.name, status = response.status.as_u16(), "upstream answered");

        normalize(spec, response)
    }

    /// `dispatch` for callers that need the JSON value itself.
    pub async fn dispatch_json(
        &self,
        spec: &RouteSpec,
        path: String,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value, GatewayError> {
        self.dispatch(spec, path, token, body)
            .await?
            .into_json()
            .ok_or_else(|| GatewayError::transport(spec.envelope, spec.fallback))
    }
}
