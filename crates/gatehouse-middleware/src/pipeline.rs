//! The chain executor.
//!
//! A [`Pipeline`] is an ordered list of middleware plus a terminal handler,
//! built once per route at registration time. Running it builds the [`Next`]
//! chain from back to front and invokes the first unit. Units run strictly
//! one after another on the same task; none runs concurrently with another
//! unit of the same invocation.

use std::sync::Arc;

use gatehouse_core::{RequestContext, RouteResult};

use crate::handler::Handler;
use crate::middleware::{Middleware, Next};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// An immutable middleware chain ending in a handler.
///
/// # Example
///
/// ```
/// use gatehouse_core::{Event, RequestContext};
/// use gatehouse_middleware::{from_fn, handler_fn, Pipeline, Reply};
/// use http::Method;
/// use serde_json::json;
///
/// let pipeline = Pipeline::builder()
///     .stage(from_fn("noop", |ctx, next| Box::pin(next.run(ctx))))
///     .handler(handler_fn(|_ctx| Box::pin(async { Reply::json(&json!("hi")) })));
///
/// assert_eq!(pipeline.stage_names(), vec!["noop"]);
///
/// # tokio_test::block_on(async {
/// let mut ctx = RequestContext::from_event(Event::new(Method::GET, "/"));
/// pipeline.run(&mut ctx).await.unwrap();
/// assert_eq!(ctx.response().body().as_json(), Some(&json!("hi")));
/// # });
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs the chain against `ctx`.
    ///
    /// Errors from any unit propagate out unchanged after unwinding through
    /// every middleware that already called `next()`.
    pub async fn run(&self, ctx: &mut RequestContext) -> RouteResult<()> {
        self.build_chain().run(ctx).await
    }

    fn build_chain(&self) -> Next<'_> {
        let mut next = Next::handler(self.handler.as_ref());
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already-shared middleware stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends several shared stages, keeping their order.
    #[must_use]
    pub fn stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.stages.extend(stages);
        self
    }

    /// Finishes the pipeline with `handler`.
    #[must_use]
    pub fn handler<H: Handler>(self, handler: H) -> Pipeline {
        self.boxed_handler(Arc::new(handler))
    }

    /// Finishes the pipeline with an already-shared handler.
    #[must_use]
    pub fn boxed_handler(self, handler: BoxedHandler) -> Pipeline {
        Pipeline {
            stages: self.stages,
            handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, Reply};
    use crate::middleware::from_fn;
    use gatehouse_core::{Event, RouteError};
    use http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> RequestContext {
        RequestContext::from_event(Event::new(Method::GET, "/items"))
    }

    fn tag(name: &'static str) -> impl Middleware {
        from_fn(name, move |ctx, next| {
            Box::pin(async move {
                let mut seen: Vec<&'static str> = ctx.remove_extension().unwrap_or_default();
                seen.push(name);
                ctx.set_extension(seen);
                next.run(ctx).await
            })
        })
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let pipeline = Pipeline::builder()
            .stage(tag("a"))
            .stage(tag("b"))
            .stage(tag("c"))
            .handler(handler_fn(|_ctx| Box::pin(async { Reply::json(&json!(null)) })));

        assert_eq!(pipeline.stage_names(), vec!["a", "b", "c"]);
        assert_eq!(pipeline.stage_count(), 3);

        let mut ctx = ctx();
        pipeline.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.get_extension::<Vec<&'static str>>(), Some(&vec!["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::builder()
            .handler(handler_fn(|_ctx| Box::pin(async { Reply::created(&json!({"id": 1})) })));
        let mut ctx = ctx();
        pipeline.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_pipeline_is_reusable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pipeline = Pipeline::builder().handler(handler_fn(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Reply::NoContent) })
        }));

        for _ in 0..3 {
            let mut ctx = ctx();
            pipeline.run(&mut ctx).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_suspension_preserves_context() {
        let pipeline = Pipeline::builder()
            .stage(from_fn("slow", |ctx, next| {
                Box::pin(async move {
                    ctx.set_extension(String::from("before-yield"));
                    tokio::task::yield_now().await;
                    next.run(ctx).await
                })
            }))
            .handler(handler_fn(|ctx| {
                Box::pin(async move {
                    tokio::task::yield_now().await;
                    let note = ctx.get_extension::<String>().cloned().unwrap_or_default();
                    Reply::json(&json!({ "note": note }))
                })
            }));

        let mut ctx = ctx();
        pipeline.run(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.response().body().as_json(),
            Some(&json!({"note": "before-yield"}))
        );
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let pipeline = Pipeline::builder()
            .stage(tag("a"))
            .handler(handler_fn(|_ctx| Box::pin(async { Err(RouteError::internal("boom")) })));
        let mut ctx = ctx();
        let err = pipeline.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, RouteError::Internal { .. }));
    }
}
