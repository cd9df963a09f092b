//! Top-level configuration.

use gatehouse_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, MetricsSection, RouterConfig};

/// Complete Gatehouse configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use gatehouse_config::GatehouseConfig;
///
/// let config = GatehouseConfig::default();
/// assert!(!config.router.expose_internal_errors);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GatehouseConfig {
    /// Router behavior.
    #[serde(default)]
    pub router: RouterConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl GatehouseConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The service name is empty
    /// - The log level is empty
    /// - The metrics listen address is not a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.router.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "router.service_name",
                "must not be empty",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if let Some(addr) = &self.metrics.listen_addr {
            if addr.parse::<std::net::SocketAddr>().is_err() {
                return Err(ConfigError::invalid_value(
                    "metrics.listen_addr",
                    format!("invalid socket address: {addr}"),
                ));
            }
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, internal errors exposed.
    ///
    /// ```
    /// use gatehouse_config::GatehouseConfig;
    ///
    /// let config = GatehouseConfig::development();
    /// assert!(config.router.expose_internal_errors);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.router.expose_internal_errors = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Production preset: JSON info logs, internal errors hidden.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Telemetry settings derived from the logging and metrics sections.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(self.router.service_name.clone())
            .logging(self.logging.to_log_config())
            .metrics(self.metrics.to_metrics_config())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GatehouseConfig::default().validate().is_ok());
        assert_eq!(GatehouseConfig::production(), GatehouseConfig::default());
    }

    #[test]
    fn test_development_preset() {
        let config = GatehouseConfig::development();
        assert!(config.router.expose_internal_errors);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_listen_addr() {
        let mut config = GatehouseConfig::default();
        config.metrics.listen_addr = Some("localhost".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.listen_addr"));
    }

    #[test]
    fn test_empty_service_name() {
        let mut config = GatehouseConfig::default();
        config.router.service_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_telemetry_projection() {
        let mut config = GatehouseConfig::development();
        config.router.service_name = "products".to_string();
        config.metrics.enabled = true;

        let telemetry = config.telemetry();
        assert_eq!(telemetry.service_name, "products");
        assert_eq!(telemetry.logging.level, "debug");
        assert!(telemetry.metrics.enabled);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<GatehouseConfig, _> = toml::from_str("[server]\nport = 80");
        assert!(result.is_err());
    }
}
