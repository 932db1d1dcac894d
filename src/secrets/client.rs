//! Remote secrets manager client trait and response types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::Result;
use super::types::{SecretBytes, SecretString};

/// Response of a describe-secret call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DescribeSecretOutput {
    /// Friendly name of the secret
    pub name: Option<String>,

    /// Fully qualified identifier assigned by the backend
    pub arn: Option<String>,

    pub description: Option<String>,

    /// Every live version with the stage labels currently attached to it.
    ///
    /// `None` means the secret has no versions at all.
    pub version_ids_to_stages: Option<BTreeMap<String, Vec<String>>>,
}

/// Response of a get-secret-value call.
///
/// Exactly one of `secret_string` / `secret_binary` is normally populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetSecretValueOutput {
    pub name: Option<String>,

    pub arn: Option<String>,

    /// Version the payload belongs to
    pub version_id: Option<String>,

    pub secret_string: Option<SecretString>,

    pub secret_binary: Option<SecretBytes>,

    /// Stage labels attached to this version at fetch time
    #[serde(default)]
    pub version_stages: Vec<String>,

    pub created_date: Option<DateTime<Utc>>,
}

impl GetSecretValueOutput {
    /// Create a string-valued response for the given version.
    pub fn from_string(version_id: impl Into<String>, value: impl Into<SecretString>) -> Self {
        Self {
            version_id: Some(version_id.into()),
            secret_string: Some(value.into()),
            ..Default::default()
        }
    }
}

/// The two remote operations the cache depends on.
///
/// Implementations wrap a real secrets service (or a test double). The cache
/// never retries: whatever error an implementation returns reaches the caller
/// of [`SecretsCache::get_secret_value`] as is, and any timeout is the
/// implementation's responsibility.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret payloads
/// - Network communication MUST use TLS
///
/// [`SecretsCache::get_secret_value`]: crate::cache::SecretsCache::get_secret_value
#[async_trait]
pub trait SecretsManagerClient: Send + Sync {
    /// Retrieve the version/stage metadata of a secret.
    async fn describe_secret(&self, secret_id: &str) -> Result<DescribeSecretOutput>;

    /// Retrieve the payload of a secret.
    ///
    /// When `version_id` is `None` the backend resolves its own default stage.
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
    ) -> Result<GetSecretValueOutput>;
}
