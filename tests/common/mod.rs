#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_gateway::config::{AppConfig, VisitStoreKind};
use clinic_gateway::gateway::{Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};
use clinic_gateway::{app, AppState};

pub const NOW_PLUS_HOUR: i64 = 3600;

/// Canned answer for one upstream call.
#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: Some("application/json; charset=utf-8"),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn bytes(status: u16, content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            body: body.to_vec(),
        }
    }
}

/// In-process stand-in for the clinical API. Records every call it receives
/// and answers from a script; unscripted calls get a bare 404.
#[derive(Default)]
pub struct FakeUpstream {
    script: Mutex<Vec<(Method, String, Canned)>>,
    calls: Mutex<Vec<UpstreamRequest>>,
    fail_transport: Mutex<bool>,
}

impl FakeUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an answer for `method path`. Answers for the same call are used in order.
    pub fn on(&self, method: Method, path: &str, answer: Canned) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push((method, path.to_string(), answer));
        self
    }

    pub fn unreachable(&self) {
        *self.fail_transport.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.lock().unwrap().push(request.clone());
        if *self.fail_transport.lock().unwrap() {
            return Err(UpstreamError::NotConfigured);
        }

        let mut script = self.script.lock().unwrap();
        let canned = match script
            .iter()
            .position(|(m, p, _)| *m == request.method && *p == request.path)
        {
            Some(i) => script.remove(i).2,
            None => Canned::empty(404),
        };

        Ok(UpstreamResponse {
            status: StatusCode::from_u16(canned.status).unwrap(),
            content_type: canned.content_type.map(str::to_string),
            body: Bytes::from(canned.body),
        })
    }
}

pub fn state_with(upstream: Arc<FakeUpstream>, visits: VisitStoreKind) -> AppState {
    AppState::new(upstream, AppConfig::development().session, visits)
}

pub fn router(upstream: Arc<FakeUpstream>) -> Router {
    app(state_with(upstream, VisitStoreKind::Upstream))
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign a token the way the clinical API would. The gateway never checks the signature.
pub fn mint(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"clinical-api-secret"),
    )
    .unwrap()
}

pub fn token_for(role: &str) -> String {
    mint(json!({
        "userId": "42",
        "userName": "amina",
        "role": role,
        "exp": now() + NOW_PLUS_HOUR,
    }))
}

pub fn expired_token(role: &str) -> String {
    mint(json!({ "userId": "42", "role": role, "exp": now() - 60 }))
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("theme=dark; token={}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Result<Response> {
    router.clone().oneshot(request).await.context("router failed")
}

pub async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).context("body is not JSON")
}

/// Serve a router on a free local port and return its base URL.
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}
