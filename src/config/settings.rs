//! # Configuration Settings
//!
//! Cache tuning and logging configuration, with defaults and environment
//! variable loading.

use crate::secrets::{Result, SecretsError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Stage label resolved when a lookup names neither a version nor a stage
pub const DEFAULT_VERSION_STAGE: &str = "current";

/// Stage label carried by the version replaced during a rotation
pub const PREVIOUS_VERSION_STAGE: &str = "previous";

/// Stage label of a version staged for an in-flight rotation
pub const PENDING_VERSION_STAGE: &str = "pending";

pub const DEFAULT_MAX_CACHE_SIZE: usize = 1024;

/// One hour
pub const DEFAULT_SECRET_REFRESH_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Cache configuration shared by every layer of a [`SecretsCache`].
///
/// [`SecretsCache`]: crate::cache::SecretsCache
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of secrets kept in the top-level pool
    #[validate(range(min = 1, message = "Max cache size must be at least 1"))]
    pub max_cache_size: usize,

    /// Upper bound of the refresh window in milliseconds; actual refresh
    /// deadlines land in the latter half of it
    pub secret_refresh_interval_ms: u64,

    /// Stage used when a lookup names neither a version nor a stage
    #[validate(length(min = 1, message = "Default version stage cannot be empty"))]
    pub default_version_stage: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            secret_refresh_interval_ms: DEFAULT_SECRET_REFRESH_INTERVAL_MS,
            default_version_stage: DEFAULT_VERSION_STAGE.to_string(),
        }
    }
}

impl CacheConfig {
    /// Run the validator rules.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(SecretsError::from)
    }

    /// Refresh interval as a Duration
    pub fn secret_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.secret_refresh_interval_ms)
    }

    /// Set the refresh interval, rounded up to whole milliseconds.
    ///
    /// Only `Duration::ZERO` maps to zero (refresh on every read).
    pub fn with_secret_refresh_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        self.secret_refresh_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    pub fn with_default_version_stage(mut self, stage: impl Into<String>) -> Self {
        self.default_version_stage = stage.into();
        self
    }

    /// Create configuration from environment variables, falling back to defaults.
    ///
    /// - `SECRETS_CACHE_MAX_SIZE`
    /// - `SECRETS_CACHE_REFRESH_INTERVAL_MS`
    /// - `SECRETS_CACHE_DEFAULT_VERSION_STAGE`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_cache_size = match std::env::var("SECRETS_CACHE_MAX_SIZE") {
            Ok(raw) => raw.parse().map_err(|e| {
                SecretsError::config_error(format!("Invalid SECRETS_CACHE_MAX_SIZE: {}", e))
            })?,
            Err(_) => defaults.max_cache_size,
        };

        let secret_refresh_interval_ms = match std::env::var("SECRETS_CACHE_REFRESH_INTERVAL_MS")
        {
            Ok(raw) => raw.parse().map_err(|e| {
                SecretsError::config_error(format!(
                    "Invalid SECRETS_CACHE_REFRESH_INTERVAL_MS: {}",
                    e
                ))
            })?,
            Err(_) => defaults.secret_refresh_interval_ms,
        };

        let default_version_stage = std::env::var("SECRETS_CACHE_DEFAULT_VERSION_STAGE")
            .unwrap_or(defaults.default_version_stage);

        let config = Self { max_cache_size, secret_refresh_interval_ms, default_version_stage };
        config.validate()?;
        Ok(config)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full
    /// `EnvFilter` expression)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Read `SECRETS_CACHE_LOG_LEVEL` and `SECRETS_CACHE_LOG_JSON`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("SECRETS_CACHE_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: std::env::var("SECRETS_CACHE_LOG_JSON")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.json_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes tests that touch process environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_cache_size, 1024);
        assert_eq!(config.secret_refresh_interval(), Duration::from_secs(3600));
        assert_eq!(config.default_version_stage, "current");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_errors() {
        let config = CacheConfig::default().with_max_cache_size(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SecretsError::ConfigError { .. }));

        let config = CacheConfig::default().with_default_version_stage("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_interval_rounds_up_to_millis() {
        let millis = |interval| {
            CacheConfig::default().with_secret_refresh_interval(interval).secret_refresh_interval_ms
        };
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_micros(1500)), 2);
        assert_eq!(millis(Duration::from_millis(250)), 250);
        assert_eq!(millis(Duration::ZERO), 0);
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_secret_refresh_interval(Duration::from_millis(250))
            .with_default_version_stage("pending");
        assert_eq!(config.secret_refresh_interval_ms, 250);
        assert_eq!(config.default_version_stage, "pending");
    }

    #[test]
    fn test_config_deserializes_partial_document() {
        let config: CacheConfig = serde_json::from_str(r#"{"max_cache_size": 8}"#).unwrap();
        assert_eq!(config.max_cache_size, 8);
        assert_eq!(config.secret_refresh_interval_ms, DEFAULT_SECRET_REFRESH_INTERVAL_MS);
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();

        std::env::set_var("SECRETS_CACHE_MAX_SIZE", "16");
        std::env::set_var("SECRETS_CACHE_REFRESH_INTERVAL_MS", "5000");
        std::env::set_var("SECRETS_CACHE_DEFAULT_VERSION_STAGE", "live");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.max_cache_size, 16);
        assert_eq!(config.secret_refresh_interval_ms, 5000);
        assert_eq!(config.default_version_stage, "live");

        std::env::set_var("SECRETS_CACHE_MAX_SIZE", "lots");
        assert!(CacheConfig::from_env().is_err());

        std::env::remove_var("SECRETS_CACHE_MAX_SIZE");
        std::env::remove_var("SECRETS_CACHE_REFRESH_INTERVAL_MS");
        std::env::remove_var("SECRETS_CACHE_DEFAULT_VERSION_STAGE");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_observability_config_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();

        std::env::set_var("SECRETS_CACHE_LOG_JSON", "true");
        std::env::set_var("SECRETS_CACHE_LOG_LEVEL", "debug");
        let config = ObservabilityConfig::from_env();
        assert!(config.json_logging);
        assert_eq!(config.log_level, "debug");

        std::env::remove_var("SECRETS_CACHE_LOG_JSON");
        std::env::remove_var("SECRETS_CACHE_LOG_LEVEL");
        assert_eq!(ObservabilityConfig::from_env(), ObservabilityConfig::default());
    }
}
