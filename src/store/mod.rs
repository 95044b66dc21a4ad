use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Envelope, GatewayError};
use crate::gateway::{Gateway, RouteSpec};

const LIST_VISITS: RouteSpec = RouteSpec::get("visits.list", "/api/visits", "/Visit", Envelope::Message)
    .fallback("Failed to fetch visits");
const CREATE_VISIT: RouteSpec = RouteSpec::post("visits.create", "/api/visits", "/Visit", Envelope::Message)
    .fallback("Failed to create visit");

/// Storage capability behind `/api/visits`.
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn append(&self, token: &str, visit: Value) -> Result<Value, GatewayError>;
    async fn list(&self, token: &str, query: Option<&str>) -> Result<Value, GatewayError>;
}

/// Visits live upstream; the gateway keeps nothing.
pub struct UpstreamVisitStore {
    gateway: Gateway,
}

impl UpstreamVisitStore {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl VisitStore for UpstreamVisitStore {
    async fn append(&self, token: &str, visit: Value) -> Result<Value, GatewayError> {
        self.gateway
            .dispatch_json(&CREATE_VISIT, CREATE_VISIT.upstream.to_string(), Some(token), Some(visit))
            .await
    }

    async fn list(&self, token: &str, query: Option<&str>) -> Result<Value, GatewayError> {
        let path = match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}?{}", LIST_VISITS.upstream, q),
            None => LIST_VISITS.upstream.to_string(),
        };
        self.gateway.dispatch_json(&LIST_VISITS, path, Some(token), None).await
    }
}

/// Process-local visit list. Lost on restart; for local development and tests.
#[derive(Default)]
pub struct MemoryVisitStore {
    visits: Mutex<Vec<Value>>,
}

impl MemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.visits.lock().await.len()
    }
}

#[async_trait]
impl VisitStore for MemoryVisitStore {
    async fn append(&self, _token: &str, visit: Value) -> Result<Value, GatewayError> {
        let mut record = match visit {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        record
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        record
            .entry("createdAt")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let record = Value::Object(record);
        self.visits.lock().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self, _token: &str, _query: Option<&str>) -> Result<Value, GatewayError> {
        Ok(Value::Array(self.visits.lock().await.clone()))
    }
}
