//! Structured logging and Prometheus metrics for Gatehouse.
//!
//! - **Logging**: `tracing-subscriber` with JSON (production) or pretty
//!   (development) output and `RUST_LOG`-style filter directives
//! - **Metrics**: Prometheus-format counters and histograms via the
//!   `metrics` crate, optionally served on an HTTP listener
//!
//! Both subsystems are process-global. The router emits events and
//! metrics whether or not they are installed; uninstalled they are no-ops.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `gatehouse_requests_total` | Counter | `route`, `status` | Dispatched events |
//! | `gatehouse_request_duration_seconds` | Histogram | `route` | Dispatch latency |
//! | `gatehouse_in_flight_requests` | Gauge | - | Events being dispatched |
//! | `gatehouse_validation_failures_total` | Counter | `stage` | Validation failures |
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::builder()
//!         .service_name("products")
//!         .logging(LogConfig::production().with_stderr())
//!         .build();
//!
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/gatehouse-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{
    init_metrics, record_request, record_validation_failure, render_metrics, InFlightGuard,
    MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );
    Ok(())
}
