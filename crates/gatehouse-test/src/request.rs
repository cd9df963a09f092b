//! Test request building.

use bytes::Bytes;
use gatehouse_core::{Body, Event};
use http::{header, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;

/// Builder for constructing test [`Event`]s.
///
/// The URI may carry a query string; its pairs are percent-decoded and
/// merged with any added through [`query`](Self::query). When a key
/// repeats, the last value wins.
///
/// ```
/// use gatehouse_test::TestRequestBuilder;
/// use http::Method;
///
/// let event = TestRequestBuilder::new(Method::GET, "/products?category=Home%20Office")
///     .header("X-Api-Key", "secret")
///     .build()
///     .unwrap();
///
/// assert_eq!(event.path, "/products");
/// assert_eq!(event.query.get("category").map(String::as_str), Some("Home Office"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Body,
    json_error: Option<String>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Body::Empty,
            json_error: None,
        }
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds a header to the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body. It is decoded as JSON by validation.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.body = Body::Json(value),
            Err(e) => self.json_error = Some(e.to_string()),
        }
        self.content_type("application/json")
    }

    /// Builds the event.
    pub fn build(self) -> Result<Event, TestError> {
        if let Some(msg) = self.json_error {
            return Err(TestError::RequestBuild(format!("JSON body: {msg}")));
        }

        let (path, raw_query) = match self.uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.uri.as_str(), None),
        };
        if !path.starts_with('/') {
            return Err(TestError::RequestBuild(format!(
                "Path must start with '/': {path}"
            )));
        }

        let mut event = Event::new(self.method, path);
        for (key, value) in raw_query.map(parse_query).transpose()?.into_iter().flatten() {
            event.query.insert(key, value);
        }
        for (key, value) in self.query {
            event.query.insert(key, value);
        }

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            event.headers.append(name, value);
        }

        event.body = self.body;
        Ok(event)
    }
}

fn parse_query(raw: &str) -> Result<Vec<(String, String)>, TestError> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode(key)?, decode(value)?))
        })
        .collect()
}

fn decode(text: &str) -> Result<String, TestError> {
    let text = text.replace('+', " ");
    urlencoding::decode(&text)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| TestError::RequestBuild(format!("Invalid query encoding: {e}")))
}
