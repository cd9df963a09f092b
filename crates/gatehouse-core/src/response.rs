//! The response being built during an invocation.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::RouteError;
use crate::issue::{Issue, ValidationError};

/// A response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseBody {
    /// No body (e.g. `204 No Content`).
    #[default]
    Empty,
    /// A JSON value, serialized by the transport.
    Json(Value),
    /// Raw bytes sent as-is.
    Bytes(Bytes),
}

impl ResponseBody {
    /// Returns the body as JSON: `null` when empty, decoded when bytes.
    pub fn to_json(&self) -> Result<Value, ValidationError> {
        match self {
            Self::Empty => Ok(Value::Null),
            Self::Json(v) => Ok(v.clone()),
            Self::Bytes(b) => serde_json::from_slice(b).map_err(|e| {
                ValidationError::from(vec![Issue::root(format!("Response body is not JSON: {e}"))])
            }),
        }
    }

    /// Returns the JSON value, if this is a JSON body.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Serializes the body to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Json(v) => Bytes::from(v.to_string()),
            Self::Bytes(b) => b.clone(),
        }
    }
}

/// Status, headers, and body of an in-progress response.
///
/// A fresh response is `200 OK` with no headers and an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// Creates an empty response with `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Creates a JSON response.
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        let mut response = Self::new(status);
        response.set_json(body);
        response
    }

    /// Serializes `body` into a JSON response.
    pub fn from_serialize<T: Serialize + ?Sized>(
        status: StatusCode,
        body: &T,
    ) -> Result<Self, RouteError> {
        let value = serde_json::to_value(body)
            .map_err(|e| RouteError::internal_with_source("failed to serialize response", e))?;
        Ok(Self::json(status, value))
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing existing values. Invalid names or values are
    /// skipped with a warning.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "skipping invalid response header"),
        }
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: ResponseBody) {
        self.body = body;
    }

    /// Sets a JSON body and `content-type: application/json`.
    pub fn set_json(&mut self, body: Value) {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = ResponseBody::Json(body);
    }

    /// Clears the body and its content type.
    pub fn clear_body(&mut self) {
        self.headers.remove(CONTENT_TYPE);
        self.body = ResponseBody::Empty;
    }
}
