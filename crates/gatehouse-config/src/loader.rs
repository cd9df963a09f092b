//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, GatehouseConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones, key by key:
/// 1. Default values (built into the code)
/// 2. Configuration files (TOML or JSON), in the order given
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use gatehouse_config::ConfigLoader;
///
/// # fn main() -> Result<(), gatehouse_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("gatehouse.toml")?
///     .with_env_prefix("GATEHOUSE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GatehouseConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GatehouseConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use gatehouse_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = GatehouseConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = GatehouseConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match format.as_deref() {
            Some(format @ ("toml" | "json")) => self.with_string(&content, format),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// Keys absent from `content` keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use gatehouse_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [router]
    ///     expose_internal_errors = true
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.router.expose_internal_errors);
    /// assert_eq!(config.router.service_name, "gatehouse");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        // Parse strictly first so unknown fields surface with the source format's error.
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                let _: GatehouseConfig = toml::from_str(content)?;
                toml::from_str(content)?
            }
            "json" => {
                let _: GatehouseConfig = serde_json::from_str(content)?;
                serde_json::from_str(content)?
            }
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `GATEHOUSE__ROUTER__EXPOSE_INTERNAL_ERRORS=true`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(".env: {e}"))),
        }
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<GatehouseConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> GatehouseConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, &marker)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(marker) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["ROUTER", "EXPOSE_INTERNAL_ERRORS"] => {
                self.config.router.expose_internal_errors = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["ROUTER", "SERVICE_NAME"] => {
                self.config.router.service_name = value.to_string();
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["METRICS", "LISTEN_ADDR"] => {
                self.config.metrics.listen_addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            _ => {}
        }

        Ok(())
    }
}

/// Deep-merges `overlay` into `base`. Objects merge key by key; anything
/// else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, GatehouseConfig::default());
    }

    #[test]
    fn test_with_toml_file() {
        let file = temp_file(
            ".toml",
            r#"
            [router]
            service_name = "products"

            [metrics]
            enabled = true
            listen_addr = "127.0.0.1:9464"
            "#,
        );

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.router.service_name, "products");
        assert!(config.metrics.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_with_json_file() {
        let file = temp_file(".json", r#"{"logging": {"format": "pretty"}}"#);
        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_layers_merge_key_by_key() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[router]\nservice_name = \"orders\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.router.service_name, "orders");
        assert!(config.router.expose_internal_errors);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new().with_file("/nonexistent/gatehouse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        assert!(ConfigLoader::new()
            .with_optional_file("/nonexistent/gatehouse.toml")
            .is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConfigLoader::new()
            .with_string("[router]\nverbose = true", "toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = temp_file(".yaml", "router: {}");
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("GH_TEST_ENV__ROUTER__EXPOSE_INTERNAL_ERRORS", "yes");
        env::set_var("GH_TEST_ENV__LOGGING__FORMAT", "pretty");
        env::set_var("GH_TEST_ENV__METRICS__LISTEN_ADDR", "0.0.0.0:9100");

        let config = ConfigLoader::new()
            .with_env_prefix("gh_test_env")
            .load()
            .unwrap();

        assert!(config.router.expose_internal_errors);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.metrics.listen_addr.as_deref(), Some("0.0.0.0:9100"));
    }

    #[test]
    fn test_env_parse_failure() {
        env::set_var("GH_TEST_BAD__METRICS__ENABLED", "maybe");
        let err = ConfigLoader::new()
            .with_env_prefix("GH_TEST_BAD")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_env_invalid_addr_fails_validation() {
        env::set_var("GH_TEST_ADDR__METRICS__LISTEN_ADDR", "nowhere");
        let err = ConfigLoader::new()
            .with_env_prefix("GH_TEST_ADDR")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }
}
