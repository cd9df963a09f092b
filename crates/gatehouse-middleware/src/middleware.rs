//! Core middleware trait and types.
//!
//! A [`Middleware`] receives the [`RequestContext`] and a [`Next`]
//! continuation. Calling `next.run(ctx)` hands control to the rest of the
//! chain and resumes when the handler (and everything between) has
//! returned. Not calling it short-circuits: nothing downstream runs and the
//! response currently on the context is what the caller gets.
//!
//! # Example
//!
//! ```
//! use gatehouse_core::{RequestContext, RouteResult};
//! use gatehouse_middleware::{BoxFuture, Middleware, Next};
//!
//! struct CacheHeader;
//!
//! impl Middleware for CacheHeader {
//!     fn name(&self) -> &'static str {
//!         "cache_header"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, RouteResult<()>> {
//!         Box::pin(async move {
//!             next.run(ctx).await?;
//!             ctx.response_mut().set_header("cache-control", "no-store");
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use gatehouse_core::{RequestContext, RouteResult};

use crate::handler::Handler;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - Call `next.run()` at most once; `Next` is consumed by the call
/// - Propagate errors from `next.run()` unless deliberately handling them
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the invocation.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>>;
}

/// Continuation to the rest of the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: invoke the handler
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware or the handler.
    ///
    /// The handler's [`Reply`](crate::Reply) is written onto the context's
    /// response before this returns.
    pub async fn run(self, ctx: &mut RequestContext) -> RouteResult<()> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, *next).await,
            NextInner::Handler(handler) => {
                let reply = handler.call(ctx).await?;
                reply.apply(ctx.response_mut());
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => f
                .debug_struct("Next")
                .field("middleware", &middleware.name())
                .finish_non_exhaustive(),
            NextInner::Handler(_) => f.debug_struct("Next").field("handler", &true).finish(),
        }
    }
}

/// A middleware created from a closure.
///
/// The closure must return a boxed future borrowing the context; write it as
/// `|ctx, next| Box::pin(async move { ... })`.
///
/// # Example
///
/// ```
/// use gatehouse_middleware::{from_fn, Middleware};
///
/// let mw = from_fn("deny_all", |ctx, _next| {
///     Box::pin(async move {
///         ctx.response_mut().set_status(http::StatusCode::FORBIDDEN);
///         Ok(())
///     })
/// });
/// assert_eq!(mw.name(), "deny_all");
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}

/// Creates a middleware from a closure.
pub fn from_fn<F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware::new(name, func)
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, RouteResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        (self.func)(ctx, next)
    }
}
