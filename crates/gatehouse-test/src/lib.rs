//! # Gatehouse Test
//!
//! In-memory testing for Gatehouse routers. Requests are dispatched
//! directly into a [`Router`](gatehouse::Router), so a test exercises
//! routing, validation, middleware and error translation exactly as
//! production traffic would, without any transport.
//!
//! ## Example
//!
//! ```
//! use gatehouse::{Route, Router};
//! use gatehouse_core::{ObjectSchema, ValueSchema};
//! use gatehouse_middleware::{handler_fn, Reply, ValidationConfig};
//! use gatehouse_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let router = Router::new()
//!     .route(
//!         Route::post("/products", handler_fn(|_ctx| Box::pin(async {
//!             Reply::created(&json!({"id": "1"}))
//!         })))
//!         .validate(ValidationConfig::new().body(
//!             ObjectSchema::new().field("price", ValueSchema::number().positive()),
//!         )),
//!     )
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::new(router);
//! let response = client.post("/products").json(&json!({"price": -1})).send().await;
//!
//! response
//!     .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
//!     .assert_error_kind("RequestValidationError");
//! assert_eq!(response.issue_paths().unwrap(), vec![json!(["price"])]);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/gatehouse-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
