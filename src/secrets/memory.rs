//! In-memory secrets manager for testing and local development.
//!
//! Models the parts of a remote secrets service the cache relies on: secrets
//! with a history of immutable versions, stage labels that move between
//! versions on rotation, and the two read operations of
//! [`SecretsManagerClient`]. Every read is counted so callers can observe how
//! often the cache actually reaches the backend, and failures can be injected
//! to exercise error propagation.
//!
//! State can be seeded from a JSON snapshot:
//!
//! ```json
//! {
//!   "secrets": [
//!     {
//!       "secret_id": "db/password",
//!       "versions": [
//!         { "version_id": "v1", "secret_string": "old", "stages": ["previous"] },
//!         { "version_id": "v2", "secret_string": "new", "stages": ["current"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::client::{DescribeSecretOutput, GetSecretValueOutput, SecretsManagerClient};
use super::error::{Result, SecretsError};
use super::types::{SecretBytes, SecretString};
use crate::config::{DEFAULT_VERSION_STAGE, PREVIOUS_VERSION_STAGE};

type FailureFactory = Arc<dyn Fn() -> SecretsError + Send + Sync>;

#[derive(Debug, Clone)]
struct StoredVersion {
    secret_string: Option<SecretString>,
    secret_binary: Option<SecretBytes>,
    stages: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct StoredSecret {
    description: Option<String>,
    versions: BTreeMap<String, StoredVersion>,
}

impl StoredSecret {
    fn version_for_stage(&self, stage: &str) -> Option<(&String, &StoredVersion)> {
        self.versions.iter().find(|(_, version)| version.stages.iter().any(|s| s == stage))
    }

    /// Detach `stage` from whichever version currently holds it.
    fn detach_stage(&mut self, stage: &str) -> Option<String> {
        let mut previous_holder = None;
        for (version_id, version) in self.versions.iter_mut() {
            let before = version.stages.len();
            version.stages.retain(|s| s != stage);
            if version.stages.len() != before {
                previous_holder = Some(version_id.clone());
            }
        }
        previous_holder
    }
}

/// Counters for remote operations served by [`InMemorySecretsManager`].
#[derive(Debug, Default)]
struct CallCounters {
    describe_secret: AtomicUsize,
    get_secret_value: AtomicUsize,
}

/// JSON snapshot used to seed an [`InMemorySecretsManager`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsSnapshot {
    #[serde(default)]
    pub secrets: Vec<SnapshotSecret>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSecret {
    pub secret_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub versions: Vec<SnapshotVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotVersion {
    pub version_id: String,
    #[serde(default)]
    pub secret_string: Option<SecretString>,
    /// Base64 encoded
    #[serde(default)]
    pub secret_binary: Option<SecretBytes>,
    #[serde(default)]
    pub stages: Vec<String>,
}

/// In-memory [`SecretsManagerClient`] with version history and stage labels.
///
/// Cloning is cheap and clones share state, so a test can keep one handle for
/// assertions while the cache owns another.
#[derive(Clone)]
pub struct InMemorySecretsManager {
    data: Arc<RwLock<HashMap<String, StoredSecret>>>,
    calls: Arc<CallCounters>,
    failure: Arc<RwLock<Option<FailureFactory>>>,
    default_stage: String,
}

impl std::fmt::Debug for InMemorySecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySecretsManager")
            .field("default_stage", &self.default_stage)
            .field("describe_calls", &self.describe_calls())
            .field("get_value_calls", &self.get_value_calls())
            .finish()
    }
}

impl Default for InMemorySecretsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySecretsManager {
    /// Create an empty store using the default stage label.
    pub fn new() -> Self {
        Self::with_default_stage(DEFAULT_VERSION_STAGE)
    }

    /// Create an empty store whose rotations move `stage` to the newest version.
    pub fn with_default_stage(stage: impl Into<String>) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(CallCounters::default()),
            failure: Arc::new(RwLock::new(None)),
            default_stage: stage.into(),
        }
    }

    /// Build a store from a parsed snapshot.
    pub fn from_snapshot(snapshot: SecretsSnapshot) -> Self {
        let store = Self::new();
        let mut data = HashMap::with_capacity(snapshot.secrets.len());
        for secret in snapshot.secrets {
            let mut stored =
                StoredSecret { description: secret.description, versions: BTreeMap::new() };
            for version in secret.versions {
                stored.versions.insert(
                    version.version_id,
                    StoredVersion {
                        secret_string: version.secret_string,
                        secret_binary: version.secret_binary,
                        stages: version.stages,
                        created_at: Utc::now(),
                    },
                );
            }
            data.insert(secret.secret_id, stored);
        }
        Self { data: Arc::new(RwLock::new(data)), ..store }
    }

    /// Load a JSON snapshot from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let snapshot: SecretsSnapshot = serde_json::from_str(&contents)?;
        debug!(
            path = %path.as_ref().display(),
            secrets = snapshot.secrets.len(),
            "Loaded secrets snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Register a secret with no versions.
    pub async fn create_secret(&self, secret_id: &str) {
        self.data.write().await.entry(secret_id.to_string()).or_default();
    }

    /// Store a new version of a secret and rotate stages.
    ///
    /// The new version receives the default stage; the version that held it
    /// before becomes the previous one. Returns the new version identifier.
    pub async fn put_secret_value(
        &self,
        secret_id: &str,
        value: impl Into<SecretString>,
    ) -> String {
        let version_id = uuid::Uuid::new_v4().to_string();
        let mut data = self.data.write().await;
        let secret = data.entry(secret_id.to_string()).or_default();

        if let Some(old_current) = secret.detach_stage(&self.default_stage) {
            secret.detach_stage(PREVIOUS_VERSION_STAGE);
            if let Some(version) = secret.versions.get_mut(&old_current) {
                version.stages.push(PREVIOUS_VERSION_STAGE.to_string());
            }
        }

        secret.versions.insert(
            version_id.clone(),
            StoredVersion {
                secret_string: Some(value.into()),
                secret_binary: None,
                stages: vec![self.default_stage.clone()],
                created_at: Utc::now(),
            },
        );
        debug!(secret_id = %secret_id, version_id = %version_id, "Stored new secret version");
        version_id
    }

    /// Store a version with an explicit identifier and stage labels.
    ///
    /// Each label is detached from any other version first.
    pub async fn put_version(
        &self,
        secret_id: &str,
        version_id: &str,
        value: impl Into<SecretString>,
        stages: &[&str],
    ) {
        let mut data = self.data.write().await;
        let secret = data.entry(secret_id.to_string()).or_default();
        for stage in stages {
            secret.detach_stage(stage);
        }
        secret.versions.insert(
            version_id.to_string(),
            StoredVersion {
                secret_string: Some(value.into()),
                secret_binary: None,
                stages: stages.iter().map(|s| s.to_string()).collect(),
                created_at: Utc::now(),
            },
        );
    }

    /// Move `stage` to `version_id`.
    pub async fn update_version_stage(
        &self,
        secret_id: &str,
        stage: &str,
        version_id: &str,
    ) -> Result<()> {
        let mut data = self.data.write().await;
        let secret = data.get_mut(secret_id).ok_or_else(|| SecretsError::not_found(secret_id))?;
        if !secret.versions.contains_key(version_id) {
            return Err(SecretsError::not_found(format!("{}@{}", secret_id, version_id)));
        }
        secret.detach_stage(stage);
        if let Some(version) = secret.versions.get_mut(version_id) {
            version.stages.push(stage.to_string());
        }
        Ok(())
    }

    /// Make every subsequent remote call fail with the error produced by `factory`.
    pub async fn fail_with<F>(&self, factory: F)
    where
        F: Fn() -> SecretsError + Send + Sync + 'static,
    {
        *self.failure.write().await = Some(Arc::new(factory));
    }

    /// Stop injecting failures.
    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    /// Number of describe-secret calls served, including failed ones.
    pub fn describe_calls(&self) -> usize {
        self.calls.describe_secret.load(Ordering::SeqCst)
    }

    /// Number of get-secret-value calls served, including failed ones.
    pub fn get_value_calls(&self) -> usize {
        self.calls.get_secret_value.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.calls.describe_secret.store(0, Ordering::SeqCst);
        self.calls.get_secret_value.store(0, Ordering::SeqCst);
    }

    async fn injected_failure(&self) -> Option<SecretsError> {
        self.failure.read().await.as_ref().map(|factory| factory())
    }
}

#[async_trait]
impl SecretsManagerClient for InMemorySecretsManager {
    async fn describe_secret(&self, secret_id: &str) -> Result<DescribeSecretOutput> {
        self.calls.describe_secret.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure().await {
            return Err(err);
        }

        let data = self.data.read().await;
        let secret = data.get(secret_id).ok_or_else(|| SecretsError::not_found(secret_id))?;

        let version_ids_to_stages = if secret.versions.is_empty() {
            None
        } else {
            Some(
                secret
                    .versions
                    .iter()
                    .map(|(version_id, version)| (version_id.clone(), version.stages.clone()))
                    .collect(),
            )
        };

        Ok(DescribeSecretOutput {
            name: Some(secret_id.to_string()),
            arn: Some(format!("memory:secret:{}", secret_id)),
            description: secret.description.clone(),
            version_ids_to_stages,
        })
    }

    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
    ) -> Result<GetSecretValueOutput> {
        self.calls.get_secret_value.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure().await {
            return Err(err);
        }

        let data = self.data.read().await;
        let secret = data.get(secret_id).ok_or_else(|| SecretsError::not_found(secret_id))?;

        let (resolved_id, version) = match version_id {
            Some(id) => secret.versions.get_key_value(id),
            None => secret.version_for_stage(&self.default_stage),
        }
        .ok_or_else(|| {
            SecretsError::not_found(format!("{}@{}", secret_id, version_id.unwrap_or("default")))
        })?;

        Ok(GetSecretValueOutput {
            name: Some(secret_id.to_string()),
            arn: Some(format!("memory:secret:{}", secret_id)),
            version_id: Some(resolved_id.clone()),
            secret_string: version.secret_string.clone(),
            secret_binary: version.secret_binary.clone(),
            version_stages: version.stages.clone(),
            created_date: Some(version.created_at),
        })
    }
}
