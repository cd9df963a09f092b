//! Terminal handlers and their replies.
//!
//! A [`Handler`] runs at the end of the chain and returns a [`Reply`]. The
//! reply is written onto the context's response, so middleware that called
//! `next()` sees the handler's output when control returns to it.

use gatehouse_core::{RequestContext, Response, RouteError, RouteResult};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::middleware::BoxFuture;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A plain value: `200 OK` with a JSON body.
    Json(Value),
    /// A JSON body with an explicit status.
    WithStatus(StatusCode, Value),
    /// `204 No Content` with no body.
    NoContent,
    /// An explicit response. Its headers are merged over any already set.
    Response(Response),
    /// Leave the context's response exactly as the handler set it.
    Unchanged,
}

impl Reply {
    /// Serializes `body` into a `200 OK` JSON reply.
    pub fn json<T: Serialize + ?Sized>(body: &T) -> RouteResult<Self> {
        Ok(Self::Json(to_value(body)?))
    }

    /// Serializes `body` into a `201 Created` JSON reply.
    pub fn created<T: Serialize + ?Sized>(body: &T) -> RouteResult<Self> {
        Ok(Self::WithStatus(StatusCode::CREATED, to_value(body)?))
    }

    /// Serializes `body` into a JSON reply with `status`.
    pub fn with_status<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> RouteResult<Self> {
        Ok(Self::WithStatus(status, to_value(body)?))
    }

    /// A `204 No Content` reply.
    #[must_use]
    pub const fn no_content() -> Self {
        Self::NoContent
    }

    /// Writes the reply onto `response`.
    pub fn apply(self, response: &mut Response) {
        match self {
            Self::Json(body) => {
                response.set_status(StatusCode::OK);
                response.set_json(body);
            }
            Self::WithStatus(status, body) => {
                response.set_status(status);
                response.set_json(body);
            }
            Self::NoContent => {
                response.set_status(StatusCode::NO_CONTENT);
                response.clear_body();
            }
            Self::Response(reply) => {
                response.set_status(reply.status());
                let mut last = None;
                for (name, value) in reply.headers() {
                    if last.as_ref() != Some(name) {
                        response.headers_mut().remove(name);
                        last = Some(name.clone());
                    }
                    response.headers_mut().append(name.clone(), value.clone());
                }
                response.set_body(reply.body().clone());
            }
            Self::Unchanged => {}
        }
    }
}

impl From<Value> for Reply {
    fn from(body: Value) -> Self {
        Self::Json(body)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

fn to_value<T: Serialize + ?Sized>(body: &T) -> RouteResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| RouteError::internal_with_source("failed to serialize reply", e))
}

/// The terminal unit of a chain.
pub trait Handler: Send + Sync + 'static {
    /// Handles the invocation.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, RouteResult<Reply>>;
}

/// A handler backed by a closure.
pub struct HandlerFn<F> {
    func: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Creates a handler from a closure returning a boxed future.
///
/// ```
/// use gatehouse_middleware::{handler_fn, Reply};
/// use serde_json::json;
///
/// let health = handler_fn(|_ctx| Box::pin(async { Reply::json(&json!({"ok": true})) }));
/// # let _ = health;
/// ```
pub fn handler_fn<F>(func: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, RouteResult<Reply>>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { func }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, RouteResult<Reply>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, RouteResult<Reply>> {
        (self.func)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Event, ResponseBody};
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_json_reply_defaults_to_ok() {
        let mut response = Response::new(StatusCode::ACCEPTED);
        Reply::json(&json!([1, 2])).unwrap().apply(&mut response);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_created_and_no_content() {
        let mut response = Response::default();
        Reply::created(&json!({"id": "1"})).unwrap().apply(&mut response);
        assert_eq!(response.status(), StatusCode::CREATED);

        Reply::no_content().apply(&mut response);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.body(), &ResponseBody::Empty);
        assert!(response.header("content-type").is_none());
    }

    #[test]
    fn test_response_reply_merges_headers() {
        let mut response = Response::default();
        response.set_header("x-request-id", "abc");
        response.set_header("x-cache", "miss");

        let mut explicit = Response::new(StatusCode::ACCEPTED);
        explicit.set_header("x-cache", "hit");
        Reply::Response(explicit).apply(&mut response);

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("x-cache"), Some("hit"));
    }

    #[test]
    fn test_unchanged_keeps_response() {
        let mut response = Response::json(StatusCode::IM_A_TEAPOT, json!("tea"));
        Reply::Unchanged.apply(&mut response);
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_handler_fn_reads_context() {
        let echo = handler_fn(|ctx| {
            Box::pin(async move {
                let path = ctx.request().path().to_string();
                Reply::json(&json!({ "path": path }))
            })
        });

        let mut ctx = RequestContext::from_event(Event::new(Method::GET, "/echo"));
        let reply = echo.call(&mut ctx).await.unwrap();
        assert_eq!(reply, Reply::Json(json!({"path": "/echo"})));
    }
}
