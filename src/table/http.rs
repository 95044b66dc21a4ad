use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde_json::Value;

use super::controller::{TableError, TableSource};
use crate::error::{extract_message, field_errors_from_value, FieldErrors};
use crate::gateway::route::{encode_segment, missing_fields};

/// Drives one `/api/<resource>` collection of a running gateway, presenting
/// the session cookie the way a browser would.
pub struct HttpTableSource {
    http: Client,
    gateway: String,
    resource: String,
    cookie: String,
    required: Vec<&'static str>,
}

impl HttpTableSource {
    pub fn new(gateway: &str, resource: &str, cookie_name: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            gateway: gateway.trim().trim_end_matches('/').to_string(),
            resource: resource.trim_matches('/').to_string(),
            cookie: format!("{}={}", cookie_name, token),
            required: Vec::new(),
        }
    }

    /// Fields that must be present before a create or update is sent.
    pub fn with_required(mut self, fields: &[&'static str]) -> Self {
        self.required = fields.to_vec();
        self
    }

    fn url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => {
                format!("{}/api/{}/{}", self.gateway, self.resource, encode_segment(id))
            }
            None => format!("{}/api/{}", self.gateway, self.resource),
        }
    }

    fn request(&self, method: Method, id: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, self.url(id))
            .header(header::COOKIE, &self.cookie)
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, TableError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice::<Value>(&bytes).map_err(|e| TableError::Decode(e.to_string()));
        }

        // Error bodies from intermediaries may be HTML; keep the status regardless.
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);

        Err(TableError::Rejected {
            status: status.as_u16(),
            message: extract_message(&body).unwrap_or_else(|| status.to_string()),
            errors: field_errors_from_value(&body),
        })
    }
}

/// Lists come back bare or wrapped under `items`/`data`.
fn rows_of(body: Value) -> Result<Vec<Value>, TableError> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("items").or_else(|| map.remove("data")) {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(TableError::Decode("expected a list of rows".to_string())),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(TableError::Decode("expected a list of rows".to_string())),
    }
}

#[async_trait]
impl TableSource for HttpTableSource {
    async fn fetch(&self) -> Result<Vec<Value>, TableError> {
        rows_of(self.send(self.request(Method::GET, None)).await?)
    }

    fn validate(&self, record: &Value) -> FieldErrors {
        missing_fields(record, &self.required)
    }

    async fn create(&self, record: Value) -> Result<Value, TableError> {
        self.send(self.request(Method::POST, None).json(&record)).await
    }

    async fn update(&self, id: &str, record: Value) -> Result<Value, TableError> {
        self.send(self.request(Method::PUT, Some(id)).json(&record)).await
    }

    async fn delete(&self, id: &str) -> Result<(), TableError> {
        self.send(self.request(Method::DELETE, Some(id))).await.map(|_| ())
    }
}
