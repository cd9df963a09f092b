//! Configuration section types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use gatehouse_telemetry::{LogConfig, MetricsConfig};
use serde::{Deserialize, Serialize};

/// Router behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Include response-validation issues and internal error messages in
    /// 500 bodies. Off in production.
    #[serde(default)]
    pub expose_internal_errors: bool,

    /// Service name used in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            expose_internal_errors: false,
            service_name: default_service_name(),
        }
    }
}

fn default_service_name() -> String {
    "gatehouse".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (`info`, `gatehouse=debug,warn`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Converts to the telemetry layer's logging settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Serve `/metrics` on this address.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl MetricsSection {
    /// Converts to the telemetry layer's metrics settings.
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            listen_addr: self.listen_addr.clone(),
            ..MetricsConfig::default()
        }
    }
}
