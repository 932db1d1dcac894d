//! # Structured Logging
//!
//! Subscriber setup for binaries and a startup summary of the cache
//! configuration. The library itself only emits `tracing` events; secret
//! payloads never appear in them.

use crate::config::{CacheConfig, ObservabilityConfig};
use crate::secrets::{Result, SecretsError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level` when set. Fails with a
/// configuration error if the filter is invalid or a subscriber is already
/// installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            SecretsError::config_error(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    let registry = Registry::default().with(filter);
    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| SecretsError::config_error(format!("Failed to initialize logging: {}", e)))
}

/// Log the cache configuration at startup
pub fn log_config_info(config: &CacheConfig) {
    tracing::info!(
        max_cache_size = config.max_cache_size,
        secret_refresh_interval_ms = config.secret_refresh_interval_ms,
        default_version_stage = %config.default_version_stage,
        "Secrets cache configuration"
    );
}
