//! Prometheus metrics for Gatehouse.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `gatehouse_requests_total` | Counter | `route`, `status` | Dispatched events |
//! | `gatehouse_request_duration_seconds` | Histogram | `route` | Dispatch latency |
//! | `gatehouse_in_flight_requests` | Gauge | - | Events being dispatched |
//! | `gatehouse_validation_failures_total` | Counter | `stage` | Rejected requests and responses |
//!
//! Unmatched events are recorded under the route label `unmatched`.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_telemetry::metrics::record_request;
//!
//! record_request("/products/:id", 200, Duration::from_millis(4));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "gatehouse_requests_total";

/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "gatehouse_request_duration_seconds";

/// In-flight gauge name.
pub const IN_FLIGHT_REQUESTS: &str = "gatehouse_in_flight_requests";

/// Validation failure counter name.
pub const VALIDATION_FAILURES_TOTAL: &str = "gatehouse_validation_failures_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose `/metrics` on (e.g., "0.0.0.0:9090").
    ///
    /// When `None` the recorder is installed without a listener and
    /// metrics are only available through [`render_metrics`].
    pub listen_addr: Option<String>,

    /// Histogram buckets for dispatch duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: None,
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Enabled configuration without an HTTP listener.
    #[must_use]
    pub fn in_process() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Enabled configuration serving `/metrics` on `addr`.
    #[must_use]
    pub fn listening(addr: impl Into<String>) -> Self {
        Self {
            enabled: true,
            listen_addr: Some(addr.into()),
            ..Self::default()
        }
    }
}

/// Initializes the metrics subsystem.
///
/// With a listen address the Prometheus exporter is spawned on the current
/// Tokio runtime, so this must be called from inside one.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparseable address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let mut builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = if let Some(addr) = &config.listen_addr {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            TelemetryError::MetricsInit("a Tokio runtime is required for the listener".into())
        })?;

        builder = builder.with_http_listener(addr);
        let (recorder, exporter) = {
            let _enter = runtime.enter();
            builder
                .build()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        };
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = exporter.await {
                tracing::error!(error = ?e, "metrics exporter stopped");
            }
        });
        tracing::info!(%addr, "metrics listener started");
        handle
    } else {
        builder
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
    };

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of events dispatched");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Dispatch duration in seconds"
    );
    describe_gauge!(IN_FLIGHT_REQUESTS, "Number of events currently being dispatched");
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Total validation failures by stage"
    );
}

/// Records a completed dispatch.
///
/// Updates `gatehouse_requests_total` and `gatehouse_request_duration_seconds`.
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
        .record(duration.as_secs_f64());
}

/// Records a validation failure.
///
/// `stage` is `"request"` or `"response"`.
pub fn record_validation_failure(stage: &str) {
    counter!(VALIDATION_FAILURES_TOTAL, "stage" => stage.to_string()).increment(1);
}

/// Guard that tracks one in-flight dispatch.
///
/// The gauge is decremented on drop, so a panicking handler does not leak
/// a count.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
