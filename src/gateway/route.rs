use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{Envelope, FieldErrors, GatewayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }

    pub fn carries_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put)
    }
}

/// Route specific substitution of an upstream failure with a success payload.
#[derive(Debug, Clone, Copy)]
pub enum Shim {
    None,
    /// Upstream endpoint not there yet: answer `[]`.
    EmptyListOn(&'static [u16]),
    /// Upstream endpoint not there yet: answer a canned payload.
    MockOn(&'static [u16], fn() -> Value),
}

#[derive(Debug, Clone, Copy)]
pub enum Reshape {
    None,
    /// Rename keys on an object, or on each object of an array.
    RenameKeys(&'static [(&'static str, &'static str)]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    /// Raw bytes relayed with the upstream content type.
    Binary,
}

/// Declarative description of one proxied operation.
#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub name: &'static str,
    pub verb: Verb,
    /// Local axum path, e.g. `/api/roles/:id`
    pub path: &'static str,
    /// Upstream path template, e.g. `/Roles/{id}`
    pub upstream: &'static str,
    pub envelope: Envelope,
    pub required: &'static [&'static str],
    pub trim: &'static [&'static str],
    /// Body field <- path parameter
    pub inject: &'static [(&'static str, &'static str)],
    pub no_cache: bool,
    pub fallback: &'static str,
    pub success_message: &'static str,
    pub shim: Shim,
    pub reshape: Reshape,
    pub kind: ResponseKind,
}

impl RouteSpec {
    pub const fn new(
        name: &'static str,
        verb: Verb,
        path: &'static str,
        upstream: &'static str,
        envelope: Envelope,
    ) -> Self {
        Self {
            name,
            verb,
            path,
            upstream,
            envelope,
            required: &[],
            trim: &[],
            inject: &[],
            no_cache: true,
            fallback: "Request to the clinical service failed",
            success_message: "Operation completed successfully",
            shim: Shim::None,
            reshape: Reshape::None,
            kind: ResponseKind::Json,
        }
    }

    pub const fn get(name: &'static str, path: &'static str, upstream: &'static str, envelope: Envelope) -> Self {
        Self::new(name, Verb::Get, path, upstream, envelope)
    }

    pub const fn post(name: &'static str, path: &'static str, upstream: &'static str, envelope: Envelope) -> Self {
        Self::new(name, Verb::Post, path, upstream, envelope)
    }

    pub const fn put(name: &'static str, path: &'static str, upstream: &'static str, envelope: Envelope) -> Self {
        Self::new(name, Verb::Put, path, upstream, envelope)
    }

    pub const fn delete(name: &'static str, path: &'static str, upstream: &'static str, envelope: Envelope) -> Self {
        Self::new(name, Verb::Delete, path, upstream, envelope)
    }

    pub const fn required(mut self, fields: &'static [&'static str]) -> Self {
        self.required = fields;
        self
    }

    pub const fn trim(mut self, fields: &'static [&'static str]) -> Self {
        self.trim = fields;
        self
    }

    pub const fn inject(mut self, fields: &'static [(&'static str, &'static str)]) -> Self {
        self.inject = fields;
        self
    }

    /// Legacy routes that never sent cache busting headers.
    pub const fn cacheable(mut self) -> Self {
        self.no_cache = false;
        self
    }

    pub const fn fallback(mut self, message: &'static str) -> Self {
        self.fallback = message;
        self
    }

    pub const fn success_message(mut self, message: &'static str) -> Self {
        self.success_message = message;
        self
    }

    pub const fn shim(mut self, shim: Shim) -> Self {
        self.shim = shim;
        self
    }

    pub const fn reshape(mut self, reshape: Reshape) -> Self {
        self.reshape = reshape;
        self
    }

    pub const fn binary(mut self) -> Self {
        self.kind = ResponseKind::Binary;
        self
    }

    pub fn accept(&self) -> &'static str {
        match self.kind {
            ResponseKind::Json => "application/json",
            ResponseKind::Binary => "*/*",
        }
    }

    /// Fill `{param}` placeholders and append the raw query string.
    ///
    /// A placeholder left unfilled means the local path did not yield the
    /// parameter, so the call is refused before it reaches the upstream.
    pub fn upstream_path(
        &self,
        params: &HashMap<String, String>,
        query: Option<&str>,
    ) -> Result<String, GatewayError> {
        let mut path = self.upstream.to_string();
        for (key, value) in params {
            path = path.replace(&format!("{{{}}}", key), &encode_segment(value));
        }
        if path.contains('{') {
            return Err(GatewayError::bad_request(self.envelope, "Invalid path parameter"));
        }
        Ok(match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}?{}", path, q),
            None => path,
        })
    }

    /// Parse, inject, trim and validate the JSON body before anything is sent.
    pub fn prepare_body(
        &self,
        params: &HashMap<String, String>,
        raw: &[u8],
    ) -> Result<Option<Value>, GatewayError> {
        if !self.verb.carries_body() {
            return Ok(None);
        }

        let mut body = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice::<Value>(raw)
                .map_err(|_| GatewayError::bad_request(self.envelope, "Invalid JSON body"))?
        };

        if let Value::Object(map) = &mut body {
            for (field, param) in self.inject {
                if let Some(value) = params.get(*param) {
                    map.insert(field.to_string(), id_value(value));
                }
            }
            for field in self.trim {
                if let Some(Value::String(s)) = map.get_mut(*field) {
                    *s = s.trim().to_string();
                }
            }
        }

        let errors = missing_fields(&body, self.required);
        if !errors.is_empty() {
            return Err(GatewayError::validation(self.envelope, errors));
        }

        Ok(Some(body))
    }

    pub fn shim_payload(&self, status: StatusCode) -> Option<Value> {
        match self.shim {
            Shim::None => None,
            Shim::EmptyListOn(statuses) if statuses.contains(&status.as_u16()) => {
                Some(Value::Array(Vec::new()))
            }
            Shim::MockOn(statuses, payload) if statuses.contains(&status.as_u16()) => Some(payload()),
            _ => None,
        }
    }

    pub fn apply_reshape(&self, value: Value) -> Value {
        match self.reshape {
            Reshape::None => value,
            Reshape::RenameKeys(pairs) => rename_keys(value, pairs),
        }
    }
}

/// Percent-encode one path segment.
pub fn encode_segment(raw: &str) -> String {
    // form encoding turns spaces into '+', which is literal inside a path
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Required fields that are absent, null or blank.
pub fn missing_fields(body: &Value, required: &[&str]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in required {
        let present = match body.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            errors.insert(field.to_string(), vec![format!("{} is required", field)]);
        }
    }
    errors
}

fn id_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn rename_keys(value: Value, pairs: &[(&str, &str)]) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| rename_keys(v, pairs)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let renamed = pairs
                        .iter()
                        .find(|(from, _)| *from == key)
                        .map(|(_, to)| to.to_string())
                        .unwrap_or(key);
                    (renamed, v)
                })
                .collect(),
        ),
        other => other,
    }
}
