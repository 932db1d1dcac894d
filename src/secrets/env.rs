//! Environment variable secrets manager.
//!
//! The default client used when a cache is built without one. It is intended
//! for **development and testing only**: environment variables are visible in
//! process listings, are not encrypted and carry no history.
//!
//! # Usage
//!
//! Secrets are read from variables with the `SECRETS_CACHE_SECRET_` prefix. The
//! secret identifier is upper-cased and every character outside `[A-Z0-9]`
//! becomes `_`:
//!
//! ```bash
//! export SECRETS_CACHE_SECRET_DB_PASSWORD="hunter2"   # secret id "db/password"
//! ```
//!
//! Each variable is exposed as a single version carrying the configured default
//! stage. The version identifier is derived from a SHA-256 digest of the value,
//! so changing the variable looks like a rotation to the cache.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::env;

use super::client::{DescribeSecretOutput, GetSecretValueOutput, SecretsManagerClient};
use super::error::{Result, SecretsError};
use super::types::SecretString;
use crate::config::DEFAULT_VERSION_STAGE;

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "SECRETS_CACHE_SECRET_";

/// Read-only secrets manager backed by environment variables (development only).
#[derive(Debug, Clone)]
pub struct EnvSecretsManager {
    stage: String,
}

impl Default for EnvSecretsManager {
    fn default() -> Self {
        Self::with_stage(DEFAULT_VERSION_STAGE)
    }
}

impl EnvSecretsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label every served version with `stage`.
    pub fn with_stage(stage: impl Into<String>) -> Self {
        Self { stage: stage.into() }
    }

    /// Converts a secret identifier to its environment variable name.
    fn secret_id_to_env_var(secret_id: &str) -> String {
        let normalized: String = secret_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, normalized)
    }

    fn version_id_for(value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        hex::encode(&digest[..16])
    }

    fn read(secret_id: &str) -> Result<(String, SecretString)> {
        let env_var = Self::secret_id_to_env_var(secret_id);
        let value = env::var(&env_var).map_err(|_| {
            SecretsError::not_found(format!(
                "{} (looking for environment variable {})",
                secret_id, env_var
            ))
        })?;
        Ok((Self::version_id_for(&value), SecretString::new(value)))
    }
}

#[async_trait]
impl SecretsManagerClient for EnvSecretsManager {
    async fn describe_secret(&self, secret_id: &str) -> Result<DescribeSecretOutput> {
        let (version_id, _) = Self::read(secret_id)?;
        Ok(DescribeSecretOutput {
            name: Some(secret_id.to_string()),
            arn: None,
            description: Some(format!("From {}", Self::secret_id_to_env_var(secret_id))),
            version_ids_to_stages: Some([(version_id, vec![self.stage.clone()])].into()),
        })
    }

    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
    ) -> Result<GetSecretValueOutput> {
        let (current_id, value) = Self::read(secret_id)?;
        if let Some(requested) = version_id {
            if requested != current_id {
                return Err(SecretsError::not_found(format!("{}@{}", secret_id, requested)));
            }
        }

        Ok(GetSecretValueOutput {
            name: Some(secret_id.to_string()),
            version_id: Some(current_id),
            secret_string: Some(value),
            version_stages: vec![self.stage.clone()],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_id_to_env_var() {
        assert_eq!(
            EnvSecretsManager::secret_id_to_env_var("db/password"),
            "SECRETS_CACHE_SECRET_DB_PASSWORD"
        );
        assert_eq!(
            EnvSecretsManager::secret_id_to_env_var("api-key.v2"),
            "SECRETS_CACHE_SECRET_API_KEY_V2"
        );
    }

    #[tokio::test]
    async fn test_missing_variable_is_not_found() {
        let client = EnvSecretsManager::new();
        let err = client.describe_secret("env_test_absent").await.unwrap_err();
        assert!(matches!(err, SecretsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_describe_and_get_from_env() {
        env::set_var("SECRETS_CACHE_SECRET_ENV_TEST_PRESENT", "from-env");

        let client = EnvSecretsManager::with_stage("live");
        let described = client.describe_secret("env_test_present").await.unwrap();
        let versions = described.version_ids_to_stages.unwrap();
        assert_eq!(versions.len(), 1);
        let (version_id, stages) = versions.into_iter().next().unwrap();
        assert_eq!(stages, vec!["live".to_string()]);
        assert_eq!(version_id.len(), 32);

        let value = client.get_secret_value("env_test_present", Some(&version_id)).await.unwrap();
        assert_eq!(value.secret_string.unwrap().expose_secret(), "from-env");

        let stale = client.get_secret_value("env_test_present", Some("stale")).await;
        assert!(stale.is_err());

        env::remove_var("SECRETS_CACHE_SECRET_ENV_TEST_PRESENT");
    }

    #[test]
    fn test_version_id_changes_with_value() {
        assert_ne!(EnvSecretsManager::version_id_for("a"), EnvSecretsManager::version_id_for("b"));
        assert_eq!(EnvSecretsManager::version_id_for("a"), EnvSecretsManager::version_id_for("a"));
    }
}
