//! # Gatehouse
//!
//! **A typed validating router for HTTP-shaped events.**
//!
//! Gatehouse takes one already-parsed request per invocation, matches it to
//! a registered route, validates the declared request parts against
//! schemas, runs middleware and the handler, optionally validates the
//! response body, and returns one response.
//!
//! - **Declared validation**: path, query, headers and body checked before
//!   the handler runs, with every issue reported in one `422`
//! - **Response contracts**: a handler that breaks its own response schema
//!   yields a `500`, never a `200` with bad data
//! - **Continuation middleware**: each unit calls `next` to proceed, or
//!   short-circuits by not calling it
//!
//! ## Quick Start
//!
//! ```
//! use gatehouse::{Route, Router};
//! use gatehouse_core::{Event, ObjectSchema, ValueSchema};
//! use gatehouse_middleware::{handler_fn, Reply, ValidationConfig};
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! let router = Router::new()
//!     .route(
//!         Route::post("/products", handler_fn(|ctx| Box::pin(async move {
//!             let body = ctx.valid_request().and_then(|v| v.body.clone());
//!             Reply::created(&body)
//!         })))
//!         .validate(ValidationConfig::new().body(
//!             ObjectSchema::new()
//!                 .field("name", ValueSchema::string().min_length(1))
//!                 .field("price", ValueSchema::number().positive()),
//!         )),
//!     )
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let bad = Event::new(Method::POST, "/products").with_json(json!({"name": "Desk", "price": -1}));
//! let response = router.dispatch(bad).await;
//! assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Event → match route → [request validation] → middleware… → [response validation] → Handler
//!                                                                                       ↓
//! Response ← x-request-id ← ErrorTranslator (on error) ← unwinds through middleware ←──┘
//! ```

#![doc(html_root_url = "https://docs.rs/gatehouse/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod gateway;
mod route;
mod router;
mod translator;

pub use gateway::{GatewayEvent, GatewayResponse};
pub use route::Route;
pub use router::{Router, REQUEST_ID_HEADER};
pub use translator::ErrorTranslator;

// Re-export component crates
pub use gatehouse_config as config;
pub use gatehouse_core as core;
pub use gatehouse_middleware as middleware;
pub use gatehouse_router as routing;
pub use gatehouse_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use gatehouse::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{GatewayEvent, GatewayResponse, Route, Router};
    pub use gatehouse_core::{
        Event, ObjectSchema, RequestContext, Response, RouteError, RouteResult, Schema,
        TypedSchema, ValueSchema,
    };
    pub use gatehouse_middleware::{from_fn, handler_fn, Next, Reply, ValidationConfig};
}
