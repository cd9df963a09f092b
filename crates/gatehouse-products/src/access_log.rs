//! Per-request access logging.

use gatehouse_core::{RequestContext, RouteResult};
use gatehouse_middleware::{BoxFuture, Middleware, Next};
use tracing::{info, warn};

/// Logs one line per request once the rest of the chain has finished.
///
/// Errors are logged with their kind and passed on unchanged, so the
/// router still translates them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Middleware for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            let result = next.run(ctx).await;
            let elapsed_ms = ctx.elapsed().as_secs_f64() * 1000.0;
            match &result {
                Ok(()) => info!(
                    status = ctx.response().status().as_u16(),
                    elapsed_ms,
                    "request completed"
                ),
                Err(e) => warn!(
                    error.kind = e.kind().as_str(),
                    elapsed_ms,
                    "request failed"
                ),
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{Event, RouteError};
    use gatehouse_middleware::{handler_fn, Pipeline, Reply};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_passes_through_success() {
        let pipeline = Pipeline::builder()
            .stage(AccessLog)
            .handler(handler_fn(|_ctx| Box::pin(async { Ok(Reply::no_content()) })));

        let mut ctx = RequestContext::from_event(Event::new(Method::DELETE, "/products/1"));
        pipeline.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response().status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_passes_through_error() {
        let pipeline = Pipeline::builder()
            .stage(AccessLog)
            .handler(handler_fn(|_ctx| {
                Box::pin(async { Err(RouteError::not_found("Product not found")) })
            }));

        let mut ctx = RequestContext::from_event(Event::new(Method::GET, "/products/1"));
        let err = pipeline.run(&mut ctx).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
