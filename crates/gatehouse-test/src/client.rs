//! Test client for in-memory dispatch.

use std::sync::Arc;

use gatehouse::{GatewayEvent, GatewayResponse, Router};
use gatehouse_core::Event;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A test client that dispatches requests straight into a [`Router`].
///
/// Requests run through the full chain: routing, validation, middleware,
/// handler and error translation. Nothing is bound to a port.
///
/// # Example
///
/// ```
/// use gatehouse::{Route, Router};
/// use gatehouse_middleware::{handler_fn, Reply};
/// use gatehouse_test::TestClient;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let router = Router::new()
///     .route(Route::get("/ping", handler_fn(|_ctx| Box::pin(async {
///         Reply::json(&json!({"pong": true}))
///     }))))
///     .unwrap();
///
/// # tokio_test::block_on(async {
/// let client = TestClient::new(router);
/// let response = client.get("/ping").send().await;
/// response
///     .assert_status(StatusCode::OK)
///     .assert_json_eq(&json!({"pong": true}));
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Arc<Router>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client that owns `router`.
    pub fn new(router: Router) -> Self {
        Self::from_shared(Arc::new(router))
    }

    /// Creates a client over a shared router.
    pub fn from_shared(router: Arc<Router>) -> Self {
        Self {
            router,
            default_headers: Vec::new(),
        }
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The router under test.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Dispatches a prepared event.
    pub async fn dispatch(&self, event: Event) -> TestResponse {
        TestResponse::from(self.router.dispatch(event).await)
    }

    /// Dispatches a gateway proxy event and returns the raw gateway shape.
    pub async fn dispatch_gateway(&self, event: GatewayEvent) -> GatewayResponse {
        self.router.dispatch_gateway(event).await
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Adds a header to the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built; use
    /// [`try_send`](Self::try_send) to handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to build test request: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let event = self.builder.build()?;
        Ok(self.client.dispatch(event).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse::Route;
    use gatehouse_middleware::{handler_fn, Reply};
    use http::StatusCode;
    use serde_json::json;

    fn echo() -> impl gatehouse_middleware::Handler {
        handler_fn(|ctx| {
            Box::pin(async move {
                let request = ctx.request();
                Reply::json(&json!({
                    "method": request.method().as_str(),
                    "path": request.path(),
                    "query": request.query(),
                    "custom": request.header("x-custom"),
                    "body": request.body().to_json().ok(),
                }))
            })
        })
    }

    fn echo_router() -> Router {
        Router::new()
            .route(Route::get("/echo", echo()))
            .unwrap()
            .route(Route::post("/echo", echo()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_with_query() {
        let client = TestClient::new(echo_router());
        let response = client.get("/echo?a=1").query("b", "two").send().await;

        response
            .assert_status(StatusCode::OK)
            .assert_json_field("method", &json!("GET"))
            .assert_json_field("query", &json!({"a": "1", "b": "two"}));
        assert!(response.request_id().is_some());
    }

    #[tokio::test]
    async fn test_post_json() {
        let client = TestClient::new(echo_router());
        let response = client
            .post("/echo")
            .json(&json!({"name": "Desk"}))
            .send()
            .await;

        response.assert_json_field("body.name", &json!("Desk"));
    }

    #[tokio::test]
    async fn test_default_headers() {
        let client = TestClient::new(echo_router()).with_default_header("X-Custom", "default");
        let response = client.get("/echo").send().await;
        response.assert_json_field("custom", &json!("default"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let client = TestClient::new(echo_router());
        let response = client.delete("/echo").send().await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_try_send_reports_build_error() {
        let client = TestClient::new(echo_router());
        let result = client.get("/echo").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_dispatch_gateway() {
        let client = TestClient::new(echo_router());
        let event: GatewayEvent = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/echo",
            "body": "{\"n\":1}"
        }))
        .unwrap();

        let response = client.dispatch_gateway(event).await;
        assert_eq!(response.status_code, 200);
        let body: serde_json::Value =
            serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["body"], json!({"n": 1}));
    }
}
