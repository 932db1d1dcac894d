//! Cache for one secret: its stage map and its recently used versions.
//!
//! # Rules
//!
//! - A secret has many versions
//! - A secret has many stages (current, previous, pending, ...)
//! - A stage maps to exactly one version
//! - A version can carry many stages
//!
//! The stage map comes from describe-secret and is swapped wholesale on every
//! refresh. Versions live in a small LRU pool; an identifier that is not yet
//! in the pool is usually the product of a fresh rotation and gets its own
//! entry with a first-time fetch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

use super::lru::LruCache;
use super::options::{GetSecretValueOptions, VersionSelector};
use super::ttl::choose_ttl;
use super::version::CachedSecretVersion;
use crate::config::CacheConfig;
use crate::observability::{CacheLayer, CacheMetrics};
use crate::secrets::{GetSecretValueOutput, Result, SecretsManagerClient};

/// Version caches kept per secret
pub const MAX_VERSIONS_CACHE: usize = 10;

#[derive(Debug, Default)]
struct StageState {
    version_ids_by_stage: HashMap<String, String>,
    /// `None` until the first non-empty describe, which reads as expired.
    refresh_at: Option<Instant>,
}

impl StageState {
    fn is_expired(&self, now: Instant) -> bool {
        self.refresh_at.map_or(true, |at| now >= at)
    }
}

/// Invert a version → stages listing into stage → version.
///
/// Versions without stages contribute nothing. A stage claimed by several
/// versions resolves to the last one iterated.
fn invert_stages(
    secret_id: &str,
    versions: BTreeMap<String, Vec<String>>,
) -> HashMap<String, String> {
    let mut by_stage = HashMap::new();
    for (version_id, stages) in versions {
        for stage in stages {
            if let Some(previous) = by_stage.insert(stage.clone(), version_id.clone()) {
                if previous != version_id {
                    debug!(
                        secret_id = %secret_id,
                        version_stage = %stage,
                        replaced = %previous,
                        version_id = %version_id,
                        "Stage claimed by more than one version"
                    );
                }
            }
        }
    }
    by_stage
}

/// Cache for a single secret identifier.
pub struct CachedSecret {
    secret_id: String,
    client: Arc<dyn SecretsManagerClient>,
    config: Arc<CacheConfig>,
    metrics: CacheMetrics,
    stages: RwLock<StageState>,
    versions: Mutex<LruCache<String, Arc<CachedSecretVersion>>>,
}

impl CachedSecret {
    /// Create an empty cache. No remote call is made until the first read.
    pub fn new(
        secret_id: impl Into<String>,
        client: Arc<dyn SecretsManagerClient>,
        config: Arc<CacheConfig>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            client,
            config,
            metrics: CacheMetrics::new(),
            stages: RwLock::new(StageState::default()),
            versions: Mutex::new(LruCache::new(MAX_VERSIONS_CACHE)),
        }
    }

    /// Fetch the payload selected by `options`.
    ///
    /// A version identifier is served directly, whether or not the last
    /// describe listed it. A stage is resolved through the stage map first and
    /// yields `None` when no version carries it.
    #[instrument(level = "debug", skip(self, options), fields(secret_id = %self.secret_id))]
    pub async fn get_secret_value(
        &self,
        options: &GetSecretValueOptions,
    ) -> Result<Option<GetSecretValueOutput>> {
        let version_id = match options.selector(&self.config.default_version_stage) {
            VersionSelector::Id(version_id) => version_id.to_string(),
            VersionSelector::Stage(stage) => {
                match self.version_id_for_stage(stage, options.force).await? {
                    Some(version_id) => version_id,
                    None => {
                        debug!(version_stage = %stage, "No version carries the requested stage");
                        return Ok(None);
                    }
                }
            }
        };

        let version = self.version(&version_id).await;
        version.get(options.force).await
    }

    /// Number of version caches currently pooled.
    pub async fn cached_versions(&self) -> usize {
        self.versions.lock().await.len()
    }

    async fn version_id_for_stage(&self, stage: &str, force: bool) -> Result<Option<String>> {
        {
            let state = self.stages.read().await;
            if !force && !state.is_expired(Instant::now()) {
                let version_id = state.version_ids_by_stage.get(stage).cloned();
                self.metrics.record_lookup(
                    CacheLayer::Stages,
                    if version_id.is_some() { "hit" } else { "absent" },
                );
                return Ok(version_id);
            }
        }

        self.metrics.record_lookup(CacheLayer::Stages, if force { "forced" } else { "miss" });
        self.refresh_stages().await?;
        Ok(self.stages.read().await.version_ids_by_stage.get(stage).cloned())
    }

    async fn refresh_stages(&self) -> Result<()> {
        debug!(secret_id = %self.secret_id, "Describing secret");
        let output = match self.client.describe_secret(&self.secret_id).await {
            Ok(output) => output,
            Err(e) => {
                self.metrics.record_refresh(CacheLayer::Stages, Err(e.kind()));
                debug!(secret_id = %self.secret_id, error = %e, "Describe secret failed");
                return Err(e);
            }
        };
        self.metrics.record_refresh(CacheLayer::Stages, Ok(()));

        let Some(versions) = output.version_ids_to_stages else {
            // No versions: forget every stage but keep the deadline where it is.
            debug!(secret_id = %self.secret_id, "Secret has no versions");
            self.stages.write().await.version_ids_by_stage = HashMap::new();
            return Ok(());
        };

        let version_ids_by_stage = invert_stages(&self.secret_id, versions);
        let ttl = choose_ttl(self.config.secret_refresh_interval());

        let mut state = self.stages.write().await;
        state.version_ids_by_stage = version_ids_by_stage;
        state.refresh_at = Some(Instant::now() + ttl);
        debug!(
            secret_id = %self.secret_id,
            stages = state.version_ids_by_stage.len(),
            ttl_ms = ttl.as_millis() as u64,
            "Refreshed stage map"
        );
        Ok(())
    }

    async fn version(&self, version_id: &str) -> Arc<CachedSecretVersion> {
        let mut versions = self.versions.lock().await;
        if let Some(existing) = versions.get(version_id) {
            return Arc::clone(existing);
        }

        debug!(secret_id = %self.secret_id, version_id = %version_id, "Caching new version");
        let version = Arc::new(CachedSecretVersion::new(
            self.secret_id.clone(),
            version_id,
            Arc::clone(&self.client),
            Arc::clone(&self.config),
        ));
        if let Some((evicted, _)) = versions.insert(version_id.to_string(), Arc::clone(&version)) {
            self.metrics.record_eviction(CacheLayer::Versions);
            debug!(secret_id = %self.secret_id, version_id = %evicted, "Evicted version cache");
        }
        version
    }
}
