//! # Gatehouse Middleware
//!
//! The middleware chain executor for Gatehouse.
//!
//! Every route compiles to one [`Pipeline`]: an ordered list of
//! [`Middleware`] ending in a [`Handler`]. Each unit receives the
//! [`RequestContext`](gatehouse_core::RequestContext) and a [`Next`]
//! continuation, and decides whether, and when, to hand control on.
//!
//! ## Chain Order
//!
//! ```text
//! Event → [request validation] → user middleware… → [response validation] → Handler
//!                                                                              ↓
//! Response ← … unwinds through every unit that called next() ←────────────────┘
//! ```
//!
//! | Position | Unit                | Present when                         |
//! |----------|---------------------|--------------------------------------|
//! | first    | Request validation  | the route declares validation        |
//! | middle   | User middleware     | in declaration order                 |
//! | last     | Response validation | the route declares a response schema |
//!
//! ## Example
//!
//! ```
//! use gatehouse_middleware::{from_fn, handler_fn, Pipeline, Reply};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(from_fn("timing", |ctx, next| {
//!         Box::pin(async move {
//!             let result = next.run(ctx).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "handled");
//!             result
//!         })
//!     }))
//!     .handler(handler_fn(|_ctx| Box::pin(async { Reply::json(&json!({"ok": true})) })));
//!
//! assert_eq!(pipeline.stage_names(), vec!["timing"]);
//! ```

#![doc(html_root_url = "https://docs.rs/gatehouse-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod validation;

pub use handler::{handler_fn, Handler, HandlerFn, Reply};
pub use middleware::{from_fn, BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedHandler, BoxedMiddleware, Pipeline, PipelineBuilder};
pub use validation::{ResponseValidationMiddleware, ValidationConfig, ValidationMiddleware};
