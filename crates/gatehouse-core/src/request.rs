//! Inbound request model.
//!
//! An [`Event`] is the already-parsed request a transport hands to the
//! router. Once a route matches, the router turns it into a [`Request`] by
//! attaching the captured path parameters.

use std::collections::BTreeMap;

use bytes::Bytes;
use gatehouse_router::Params;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde_json::Value;

use crate::issue::{Issue, ValidationError};

/// Query parameters: single-valued, string-keyed, string-valued.
pub type QueryMap = BTreeMap<String, String>;

/// A request body as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes, decoded as JSON on demand.
    Bytes(Bytes),
    /// A body the transport already decoded.
    Json(Value),
}

impl Body {
    /// Returns true for [`Body::Empty`] and zero-length byte bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(b) => b.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Decodes the body as JSON.
    ///
    /// An empty body decodes to `null`, so an optional body schema can
    /// accept it. Malformed JSON is reported as a single root issue.
    pub fn to_json(&self) -> Result<Value, ValidationError> {
        match self {
            Self::Empty => Ok(Value::Null),
            Self::Json(v) => Ok(v.clone()),
            Self::Bytes(b) if b.is_empty() => Ok(Value::Null),
            Self::Bytes(b) => serde_json::from_slice(b)
                .map_err(|e| ValidationError::from(vec![Issue::root(format!("Invalid JSON: {e}"))])),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Bytes(Bytes::from(text))
    }
}

/// A request before routing.
///
/// # Example
///
/// ```
/// use gatehouse_core::Event;
/// use http::Method;
/// use serde_json::json;
///
/// let event = Event::new(Method::POST, "/products")
///     .with_header("content-type", "application/json")
///     .with_json(json!({"name": "Desk"}));
///
/// assert_eq!(event.path, "/products");
/// assert!(event.headers.contains_key("content-type"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Event {
    /// Request method.
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Query parameters.
    pub query: QueryMap,
    /// Request headers; names are case-insensitive.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
}

impl Event {
    /// Creates an event with no query, headers, or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a query parameter, replacing any previous value.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a header. Names or values that are not valid HTTP are skipped
    /// with a warning.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Adds a header in place; see [`Event::with_header`].
    pub fn insert_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "skipping invalid header"),
        }
    }

    /// Sets a pre-decoded JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// A routed request: the event plus captured path parameters.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    params: Params,
    query: QueryMap,
    headers: HeaderMap,
    body: Body,
}

impl Request {
    /// Builds a request from an event and the parameters its route captured.
    #[must_use]
    pub fn from_event(event: Event, params: Params) -> Self {
        Self {
            method: event.method,
            path: event.path,
            params,
            query: event.query,
            headers: event.headers,
            body: event.body,
        }
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Returns one path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the query parameters.
    #[must_use]
    pub const fn query(&self) -> &QueryMap {
        &self.query
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Headers as a string map with lowercase names. Repeated headers keep
    /// their first value; values that are not UTF-8 are left out.
    #[must_use]
    pub fn headers_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (name, value) in &self.headers {
            if let Ok(value) = value.to_str() {
                map.entry(name.as_str().to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        map
    }
}
