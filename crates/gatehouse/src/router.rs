//! Route registration and dispatch.
//!
//! Dispatch follows one path for every event:
//!
//! 1. Match method and path against the route table (first registered wins)
//! 2. Build a fresh [`RequestContext`] with the captured parameters
//! 3. Run the route's pipeline
//! 4. Read the response off the context, or translate the error
//! 5. Stamp `x-request-id` and record metrics
//!
//! Panics inside middleware or handlers are caught at step 3 and become
//! `500 InternalError`; the context of a failed invocation is dropped.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use gatehouse_config::RouterConfig;
use gatehouse_core::{Event, Request, RequestContext, RequestId, Response, RouteError};
use gatehouse_middleware::Pipeline;
use gatehouse_router::{PatternError, RouteMatch, RouteTable};
use gatehouse_telemetry::logging::fields;
use gatehouse_telemetry::{record_request, record_validation_failure, InFlightGuard};
use http::Method;
use tracing::Instrument;

use crate::route::Route;
use crate::translator::ErrorTranslator;

/// Header carrying the invocation's request ID, in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Metrics label for events that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// The typed validating router.
///
/// Routes are registered at startup; afterwards the router is read-only and
/// can be shared across concurrent dispatches behind an `Arc`.
///
/// # Example
///
/// ```
/// use gatehouse::{Route, Router};
/// use gatehouse_core::Event;
/// use gatehouse_middleware::{handler_fn, Reply};
/// use http::{Method, StatusCode};
/// use serde_json::json;
///
/// let mut router = Router::new();
/// router
///     .register(Route::get("/health", handler_fn(|_ctx| {
///         Box::pin(async { Reply::json(&json!({"status": "ok"})) })
///     })))
///     .unwrap();
///
/// # tokio_test::block_on(async {
/// let response = router.dispatch(Event::new(Method::GET, "/health")).await;
/// assert_eq!(response.status(), StatusCode::OK);
/// assert!(response.header("x-request-id").is_some());
///
/// let missing = router.dispatch(Event::new(Method::GET, "/nope")).await;
/// assert_eq!(missing.status(), StatusCode::NOT_FOUND);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct Router {
    table: RouteTable<Pipeline>,
    translator: ErrorTranslator,
    service_name: Option<String>,
}

impl Router {
    /// Creates a router with no routes that hides internal error detail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router configured from the `[router]` section.
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            table: RouteTable::new(),
            translator: ErrorTranslator::new(config.expose_internal_errors),
            service_name: Some(config.service_name.clone()),
        }
    }

    /// Replaces the error translator.
    #[must_use]
    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = translator;
        self
    }

    /// Registers a route.
    ///
    /// Registration order is match priority: register specific patterns
    /// before general ones.
    ///
    /// # Errors
    ///
    /// Returns `PatternError` if the path pattern is malformed.
    pub fn register(&mut self, route: Route) -> Result<&mut Self, PatternError> {
        let method = route.method().clone();
        let path = route.path().to_string();
        let pipeline = route.into_pipeline();

        tracing::debug!(
            method = %method,
            route = %path,
            stages = ?pipeline.stage_names(),
            "route registered"
        );
        self.table.insert(method, &path, pipeline)?;
        Ok(self)
    }

    /// Registers a route, builder style.
    ///
    /// # Errors
    ///
    /// Returns `PatternError` if the path pattern is malformed.
    pub fn route(mut self, route: Route) -> Result<Self, PatternError> {
        self.register(route)?;
        Ok(self)
    }

    /// Returns the error translator in use.
    #[must_use]
    pub const fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }

    /// Lists registered routes as `(method, pattern)` in match order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.table.iter().map(|(method, pattern, _)| (method, pattern.as_str()))
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Dispatches one event and returns the response.
    ///
    /// Never fails: every error, including a panic, is translated.
    pub async fn dispatch(&self, event: Event) -> Response {
        let request_id = incoming_request_id(&event);
        let span = self.span(request_id, &event.method, &event.path);

        async move {
            let started = Instant::now();
            let _in_flight = InFlightGuard::new();
            let (route, response) = self.run(request_id, event).await;
            self.finish(request_id, route.as_deref(), response, started)
        }
        .instrument(span)
        .await
    }

    /// Translates an error raised before routing (e.g. by a transport
    /// adapter) with the same bookkeeping as [`dispatch`](Self::dispatch):
    /// the error is logged, metrics are recorded and `x-request-id` is set.
    pub fn reject(&self, request_id: RequestId, error: &RouteError) -> Response {
        report(error);
        self.finish(request_id, None, self.translator.translate(error), Instant::now())
    }

    fn span(&self, request_id: RequestId, method: &Method, path: &str) -> tracing::Span {
        tracing::info_span!(
            "dispatch",
            service = self.service_name.as_deref().unwrap_or("gatehouse"),
            request_id = %request_id,
            http.method = %method,
            http.path = %path,
            route = tracing::field::Empty,
        )
    }

    async fn run(&self, request_id: RequestId, event: Event) -> (Option<String>, Response) {
        let Some(RouteMatch {
            value: pipeline,
            pattern,
            params,
        }) = self.table.match_route(&event.method, &event.path)
        else {
            let allowed = self.table.allowed_methods(&event.path);
            if !allowed.is_empty() {
                tracing::debug!(allowed = ?allowed, "path registered under other methods");
            }
            let error = RouteError::route_not_matched(event.method.as_str(), &event.path);
            report(&error);
            return (None, self.translator.translate(&error));
        };

        let pattern = pattern.as_str().to_string();
        tracing::Span::current().record(fields::ROUTE, pattern.as_str());

        let mut ctx = RequestContext::with_request_id(request_id, Request::from_event(event, params))
            .with_route(pattern.clone());

        let outcome = AssertUnwindSafe(pipeline.run(&mut ctx)).catch_unwind().await;
        let response = match outcome {
            Ok(Ok(())) => ctx.into_response(),
            Ok(Err(error)) => {
                report(&error);
                self.translator.translate(&error)
            }
            Err(panic) => {
                let error = RouteError::internal(format!(
                    "handler panicked: {}",
                    panic_message(panic.as_ref())
                ));
                report(&error);
                self.translator.translate(&error)
            }
        };

        (Some(pattern), response)
    }

    fn finish(
        &self,
        request_id: RequestId,
        route: Option<&str>,
        mut response: Response,
        started: Instant,
    ) -> Response {
        response.set_header(REQUEST_ID_HEADER, &request_id.to_string());

        let elapsed = started.elapsed();
        let status = response.status().as_u16();
        record_request(route.unwrap_or(UNMATCHED_ROUTE), status, elapsed);
        tracing::debug!(
            http.status_code = status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "dispatched"
        );
        response
    }
}

/// Reuses a well-formed incoming request ID, otherwise mints one.
fn incoming_request_id(event: &Event) -> RequestId {
    event
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_default()
}

fn report(error: &RouteError) {
    let kind = error.kind();
    match error {
        RouteError::RequestValidation(issues) => {
            record_validation_failure("request");
            tracing::debug!(error.kind = %kind, issues = issues.len(), "request rejected");
        }
        RouteError::ResponseValidation(issues) => {
            record_validation_failure("response");
            tracing::error!(
                error.kind = %kind,
                issues = ?issues.issues(),
                "response violates its declared schema"
            );
        }
        RouteError::NotFound { .. } | RouteError::RouteNotMatched { .. } => {
            tracing::debug!(error.kind = %kind, error = %error, "not found");
        }
        RouteError::Internal { source, .. } => {
            let source = source.as_ref().map(|s| format!("{s:#}"));
            tracing::error!(error.kind = %kind, error = %error, source = ?source, "internal error");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
