//! Integration tests for configuration management
//!
//! These tests validate that configuration is read from environment variables
//! and that a cache built without a client serves environment secrets.

use secrets_cache::cache::GetSecretValueOptions;
use secrets_cache::config::{CacheConfig, ObservabilityConfig};
use secrets_cache::{Result, SecretsCache, SecretsError};
use std::env;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

// Use a mutex to serialize tests that modify shared environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    // A failed test must not take the other tests down with it
    ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets (or removes) a variable and restores the original value on drop
struct EnvVarGuard {
    name: &'static str,
    original: Option<String>,
}

impl EnvVarGuard {
    fn set(name: &'static str, value: &str) -> Self {
        let original = env::var(name).ok();
        env::set_var(name, value);
        Self { name, original }
    }

    fn remove(name: &'static str) -> Self {
        let original = env::var(name).ok();
        env::remove_var(name);
        Self { name, original }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match self.original.take() {
            Some(value) => env::set_var(self.name, value),
            None => env::remove_var(self.name),
        }
    }
}

/// Test that cache configuration properly reads environment variables
#[test]
fn test_cache_config_environment_integration() -> Result<()> {
    let _lock = lock_env();

    let _size = EnvVarGuard::set("SECRETS_CACHE_MAX_SIZE", "16");
    let _interval = EnvVarGuard::set("SECRETS_CACHE_REFRESH_INTERVAL_MS", "2500");
    let _stage = EnvVarGuard::set("SECRETS_CACHE_DEFAULT_VERSION_STAGE", "AWSCURRENT");

    let config = CacheConfig::from_env()?;
    assert_eq!(config.max_cache_size, 16);
    assert_eq!(config.secret_refresh_interval(), Duration::from_millis(2500));
    assert_eq!(config.default_version_stage, "AWSCURRENT");

    // Unparsable and out-of-range values are rejected
    env::set_var("SECRETS_CACHE_MAX_SIZE", "lots");
    assert!(matches!(CacheConfig::from_env(), Err(SecretsError::ConfigError { .. })));
    env::set_var("SECRETS_CACHE_MAX_SIZE", "0");
    assert!(matches!(CacheConfig::from_env(), Err(SecretsError::ConfigError { .. })));

    Ok(())
}

/// Test that logging configuration falls back to defaults
#[test]
fn test_observability_config_defaults_integration() {
    let _lock = lock_env();

    let _level = EnvVarGuard::remove("SECRETS_CACHE_LOG_LEVEL");
    let json = EnvVarGuard::remove("SECRETS_CACHE_LOG_JSON");

    assert_eq!(ObservabilityConfig::from_env(), ObservabilityConfig::default());

    drop(json);
    let _json = EnvVarGuard::set("SECRETS_CACHE_LOG_JSON", "true");
    assert!(ObservabilityConfig::from_env().json_logging);
}

/// Test that a cache built without a client reads secrets from the environment
#[tokio::test]
async fn test_default_client_reads_environment() -> Result<()> {
    // The variable is private to this test, so only the restore guard is held
    // across awaits
    let _secret = EnvVarGuard::set("SECRETS_CACHE_SECRET_INTEGRATION_DB_PASSWORD", "hunter2");
    let cache = {
        let _lock = lock_env();
        SecretsCache::builder().build()?
    };

    let value = cache
        .get_secret_string("integration/db-password", GetSecretValueOptions::default())
        .await?;

    assert_eq!(value.map(|v| v.expose_secret().to_string()), Some("hunter2".to_string()));
    Ok(())
}

/// Test that a missing environment secret surfaces as not found
#[tokio::test]
async fn test_default_client_missing_secret() -> Result<()> {
    let cache = SecretsCache::builder().build()?;
    let err = cache
        .get_secret_value("integration/does-not-exist", GetSecretValueOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SecretsError::NotFound { .. }));
    Ok(())
}
