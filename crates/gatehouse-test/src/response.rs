//! Test response assertions.

use std::fmt;

use bytes::Bytes;
use gatehouse::REQUEST_ID_HEADER;
use gatehouse_core::{ErrorEnvelope, Response};
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A dispatched response with helpers for assertions.
#[derive(Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a test response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Captures a router response, serializing its body to bytes.
    pub fn from_response(response: &Response) -> Self {
        Self::new(
            response.status(),
            response.headers().clone(),
            response.body().to_bytes(),
        )
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as u16.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the status is 4xx.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true if the status is 5xx.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and ASCII.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request ID the router assigned.
    pub fn request_id(&self) -> Option<&str> {
        self.header_str(REQUEST_ID_HEADER)
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns true when the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| TestError::UnexpectedResponse(format!("body is not UTF-8: {e}")))
    }

    /// Deserializes the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the JSON body as a value; an empty body is `null`.
    pub fn json_value(&self) -> Result<Value, TestError> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Parses the body as an error envelope.
    pub fn error(&self) -> Result<ErrorEnvelope, TestError> {
        self.json()
    }

    /// Returns the error kind name, e.g. `"NotFoundError"`.
    pub fn error_kind(&self) -> Option<String> {
        self.error().ok().map(|envelope| envelope.error)
    }

    /// Returns the path of every validation issue, in reported order.
    pub fn issue_paths(&self) -> Result<Vec<Value>, TestError> {
        let envelope = self.error()?;
        let issues = envelope
            .details
            .as_ref()
            .and_then(|d| d.get("issues"))
            .and_then(Value::as_array)
            .ok_or_else(|| TestError::UnexpectedResponse("no validation issues".to_string()))?;
        Ok(issues.iter().map(|issue| issue["path"].clone()).collect())
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {} with body {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the body is an error envelope of the given kind.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an envelope or the kind differs.
    pub fn assert_error_kind(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self.error_kind();
        assert_eq!(
            actual.as_deref(),
            Some(expected),
            "Expected error '{}', got body {}",
            expected,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the JSON doesn't match.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        let actual = self.json_value().expect("Body should be valid JSON");
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// `path` is dot-separated; numeric segments index arrays.
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &Value) -> &Self {
        let path = path.as_ref();
        let json = self.json_value().expect("Body should be valid JSON");
        let actual = json_path(&json, path).unwrap_or_else(|| {
            panic!("JSON path '{}' not found in: {:?}", path, json);
        });
        assert_eq!(
            actual, expected,
            "JSON field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }
}

impl From<Response> for TestResponse {
    fn from(response: Response) -> Self {
        Self::from_response(&response)
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}
