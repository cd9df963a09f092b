//! # Gatehouse Core
//!
//! Core types for the Gatehouse validating router.
//!
//! - [`Schema`] - the validation contract, with [`validate`] as its entry point
//! - [`ValueSchema`] / [`ObjectSchema`] - declarative schemas collecting every issue
//! - [`TypedSchema`] / [`schema_fn`] - serde-backed and closure-backed schemas
//! - [`ValidationError`] - ordered issues, each with a path and a message
//! - [`RouteError`] - the error taxonomy and its HTTP mapping
//! - [`Event`] / [`Request`] / [`Response`] - the request and response model
//! - [`RequestContext`] - per-invocation state including the `valid` container

#![doc(html_root_url = "https://docs.rs/gatehouse-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builtin;
mod context;
mod error;
mod issue;
mod request;
mod response;
mod schema;

pub use builtin::{ObjectSchema, UnknownKeys, ValueSchema};
pub use context::{RequestContext, RequestId, Valid, ValidRequest, ValidResponse};
pub use error::{ErrorEnvelope, ErrorKind, RouteError, RouteResult};
pub use issue::{Issue, PathSegment, ValidationError};
pub use request::{Body, Event, QueryMap, Request};
pub use response::{Response, ResponseBody};
pub use schema::{schema_fn, validate, Schema, SchemaFn, SharedSchema, TypedSchema};
