//! Typed configuration for Gatehouse.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → files → env)
//!
//! # Example
//!
//! ```no_run
//! use gatehouse_config::ConfigLoader;
//!
//! # fn main() -> Result<(), gatehouse_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("gatehouse.toml")?
//!     .with_env_prefix("GATEHOUSE")
//!     .load()?;
//!
//! println!("internal errors exposed: {}", config.router.expose_internal_errors);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [router]
//! expose_internal_errors = false
//! service_name = "products"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! listen_addr = "0.0.0.0:9464"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `GATEHOUSE__ROUTER__EXPOSE_INTERNAL_ERRORS=true`
//! - `GATEHOUSE__ROUTER__SERVICE_NAME=products`
//! - `GATEHOUSE__LOGGING__LEVEL=debug`
//! - `GATEHOUSE__LOGGING__FORMAT=pretty`
//! - `GATEHOUSE__METRICS__ENABLED=true`
//! - `GATEHOUSE__METRICS__LISTEN_ADDR=0.0.0.0:9464`

#![doc(html_root_url = "https://docs.rs/gatehouse-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::GatehouseConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, MetricsSection, RouterConfig};
