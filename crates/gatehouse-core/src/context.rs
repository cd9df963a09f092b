//! Request context types.
//!
//! The [`RequestContext`] carries all per-invocation state through the
//! middleware chain and into the handler: the routed request, the response
//! being built, and the [`Valid`] container the validation stage fills in.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RouteError;
use crate::request::Request;
use crate::response::Response;

/// A unique identifier for each invocation, using UUID v7.
///
/// # Example
///
/// ```
/// use gatehouse_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(RequestId::parse(&id.to_string()), Some(id));
/// assert_eq!(RequestId::parse("not-a-uuid"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a request ID propagated by a caller.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

fn decode<T: DeserializeOwned>(part: &'static str, value: Option<&Value>) -> Result<T, RouteError> {
    let value = value.ok_or_else(|| {
        RouteError::internal(format!("request {part} was not declared for validation"))
    })?;
    serde_json::from_value(value.clone()).map_err(|e| {
        RouteError::internal_with_source(format!("validated {part} does not fit the target type"), e)
    })
}

/// Validated request parts.
///
/// Only the parts a route declared are present; an undeclared part is
/// `None`, never the raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidRequest {
    /// Parsed path parameters.
    pub path: Option<Value>,
    /// Parsed query parameters.
    pub query: Option<Value>,
    /// Parsed headers.
    pub headers: Option<Value>,
    /// Parsed body.
    pub body: Option<Value>,
}

impl ValidRequest {
    /// Deserializes the validated path parameters.
    pub fn path_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        decode("path", self.path.as_ref())
    }

    /// Deserializes the validated query parameters.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        decode("query", self.query.as_ref())
    }

    /// Deserializes the validated headers.
    pub fn headers_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        decode("headers", self.headers.as_ref())
    }

    /// Deserializes the validated body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        decode("body", self.body.as_ref())
    }

    /// Returns a string field of the validated path parameters.
    #[must_use]
    pub fn path_str(&self, name: &str) -> Option<&str> {
        self.path.as_ref()?.get(name)?.as_str()
    }

    /// Returns a field of the validated query parameters.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&Value> {
        self.query.as_ref()?.get(name)
    }

    /// Returns a string field of the validated headers.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.as_ref()?.get(name)?.as_str()
    }
}

/// Validated response parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidResponse {
    /// The response body in its parsed form.
    pub body: Value,
}

impl ValidResponse {
    /// Returns the parsed body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }
}

/// The `valid` container.
///
/// `req` is filled in before the handler runs. `res` is filled in only after
/// the handler returns, and only if the route validates its response.
#[derive(Debug, Clone, Default)]
pub struct Valid {
    req: Option<ValidRequest>,
    res: Option<ValidResponse>,
}

impl Valid {
    /// Returns the validated request, if validation ran.
    #[must_use]
    pub const fn req(&self) -> Option<&ValidRequest> {
        self.req.as_ref()
    }

    /// Returns the validated response, if response validation ran.
    #[must_use]
    pub const fn res(&self) -> Option<&ValidResponse> {
        self.res.as_ref()
    }
}

/// Per-invocation state that flows through the middleware chain.
///
/// Exactly one context exists per invocation. It is created by the router,
/// lent mutably to one unit at a time, and dropped after the response is
/// read off it.
///
/// # Example
///
/// ```
/// use gatehouse_core::{Event, RequestContext, ValidRequest};
/// use http::{Method, StatusCode};
/// use serde_json::json;
///
/// let mut ctx = RequestContext::from_event(Event::new(Method::GET, "/health"));
/// assert!(ctx.valid().req().is_none());
///
/// ctx.set_valid_request(ValidRequest::default()).unwrap();
/// assert!(ctx.set_valid_request(ValidRequest::default()).is_err());
///
/// ctx.response_mut().set_json(json!({"ok": true}));
/// assert_eq!(ctx.into_response().status(), StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    request: Request,
    response: Response,
    valid: Valid,
    route: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::with_request_id(RequestId::new(), request)
    }

    /// Creates a context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId, request: Request) -> Self {
        Self {
            request_id,
            request,
            response: Response::default(),
            valid: Valid::default(),
            route: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context for an unrouted event, with no path parameters.
    #[must_use]
    pub fn from_event(event: crate::request::Event) -> Self {
        Self::new(Request::from_event(event, gatehouse_router::Params::new()))
    }

    /// Records the pattern of the matched route.
    #[must_use]
    pub fn with_route(mut self, pattern: impl Into<String>) -> Self {
        self.route = Some(pattern.into());
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the matched route pattern.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the raw request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the response being built.
    #[must_use]
    pub const fn response(&self) -> &Response {
        &self.response
    }

    /// Returns the response mutably.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Returns the `valid` container.
    #[must_use]
    pub const fn valid(&self) -> &Valid {
        &self.valid
    }

    /// Shorthand for `valid().req()`.
    #[must_use]
    pub const fn valid_request(&self) -> Option<&ValidRequest> {
        self.valid.req.as_ref()
    }

    /// Shorthand for `valid().res()`.
    ///
    /// `None` until the handler has returned and the response body passed
    /// validation.
    #[must_use]
    pub const fn valid_response(&self) -> Option<&ValidResponse> {
        self.valid.res.as_ref()
    }

    /// Stores the validated request.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the validated request was already set.
    pub fn set_valid_request(&mut self, valid: ValidRequest) -> Result<(), RouteError> {
        if self.valid.req.is_some() {
            return Err(RouteError::internal("valid.req is already set"));
        }
        self.valid.req = Some(valid);
        Ok(())
    }

    /// Stores the validated response.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the validated response was already set.
    pub fn set_valid_response(&mut self, valid: ValidResponse) -> Result<(), RouteError> {
        if self.valid.res.is_some() {
            return Err(RouteError::internal("valid.res is already set"));
        }
        self.valid.res = Some(valid);
        Ok(())
    }

    /// Returns the time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// ```
    /// use gatehouse_core::{Event, RequestContext};
    /// use http::Method;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = RequestContext::from_event(Event::new(Method::GET, "/"));
    /// ctx.set_extension(Tenant("acme"));
    /// assert_eq!(ctx.get_extension::<Tenant>().map(|t| t.0), Some("acme"));
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }

    /// Consumes the context, returning the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Event;
    use http::Method;
    use serde::Deserialize;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::from_event(Event::new(Method::GET, "/products"))
    }

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_valid_starts_empty() {
        let ctx = ctx();
        assert!(ctx.valid_request().is_none());
        assert!(ctx.valid_response().is_none());
    }

    #[test]
    fn test_valid_response_is_write_once() {
        let mut ctx = ctx();
        ctx.set_valid_response(ValidResponse { body: json!([]) }).unwrap();
        let err = ctx
            .set_valid_response(ValidResponse { body: json!([1]) })
            .unwrap_err();
        assert!(matches!(err, RouteError::Internal { .. }));
        assert_eq!(ctx.valid_response().map(ValidResponse::body), Some(&json!([])));
    }

    #[test]
    fn test_typed_access() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Filter {
            category: Option<String>,
        }

        let valid = ValidRequest {
            query: Some(json!({"category": "Books"})),
            path: Some(json!({"id": "7"})),
            ..ValidRequest::default()
        };
        assert_eq!(
            valid.query_as::<Filter>().unwrap(),
            Filter {
                category: Some("Books".into())
            }
        );
        assert_eq!(valid.path_str("id"), Some("7"));
        assert!(valid.query_value("missing").is_none());

        let err = valid.body_as::<Filter>().unwrap_err();
        assert!(err.to_string().contains("body was not declared"));

        let err = valid.path_as::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, RouteError::Internal { source: Some(_), .. }));
    }

    #[test]
    fn test_extensions() {
        let mut ctx = ctx();
        ctx.set_extension(5u32);
        assert_eq!(ctx.get_extension::<u32>(), Some(&5));
        assert_eq!(ctx.remove_extension::<u32>(), Some(5));
        assert!(ctx.get_extension::<u32>().is_none());
    }

    #[test]
    fn test_route_and_elapsed() {
        let ctx = ctx().with_route("/products");
        assert_eq!(ctx.route(), Some("/products"));
        assert!(ctx.elapsed() < Duration::from_secs(5));
    }
}
