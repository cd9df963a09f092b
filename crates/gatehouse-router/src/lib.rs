//! Path pattern matching for Gatehouse.
//!
//! This crate owns the routing half of the Gatehouse dispatcher: parsing
//! path patterns such as `/products/:id`, capturing named parameters, and
//! resolving an incoming `(method, path)` pair to the first registered entry
//! that matches it.
//!
//! # Matching Rules
//!
//! - The HTTP method must match exactly
//! - Patterns are split on `/`; empty segments are ignored, so trailing
//!   slashes are normalized away
//! - Literal segments compare byte-for-byte
//! - Parameter segments (`:id` or `{id}`) accept any single segment and
//!   capture it by name
//! - Registration order is match priority: the first entry that matches wins
//!
//! There are no wildcard or regex segments; patterns containing them are
//! rejected at registration time with a [`PatternError`].
//!
//! # Example
//!
//! ```rust
//! use gatehouse_router::RouteTable;
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert(Method::GET, "/products", "listProducts").unwrap();
//! table.insert(Method::GET, "/products/:id", "getProduct").unwrap();
//!
//! let found = table.match_route(&Method::GET, "/products/42").unwrap();
//! assert_eq!(*found.value, "getProduct");
//! assert_eq!(found.params.get("id"), Some("42"));
//! ```

mod params;
mod pattern;
mod table;

pub use params::Params;
pub use pattern::{PathPattern, PatternError, Segment};
pub use table::{RouteMatch, RouteTable};
