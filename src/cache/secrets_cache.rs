//! Top-level read-through cache.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::lru::LruCache;
use super::options::GetSecretValueOptions;
use super::secret::CachedSecret;
use crate::config::CacheConfig;
use crate::observability::{CacheLayer, CacheMetrics};
use crate::secrets::{
    EnvSecretsManager, GetSecretValueOutput, Result, SecretString, SecretsManagerClient,
};

/// Read-only, read-through cache over a [`SecretsManagerClient`].
///
/// # Call Flow
///
/// 1. find or create the [`CachedSecret`] for the secret identifier
/// 2. resolve the stage through the cached describe-secret result (or refresh it)
/// 3. find or create the version cache for the resolved version identifier
/// 4. return its cached payload (or refresh it)
///
/// # Caches
///
/// 1. up to `max_cache_size` secrets, least recently used evicted first
/// 2. one stage map per secret
/// 3. up to 10 versions per secret
/// 4. one payload per version
///
/// Entries leave the pools only under capacity pressure; deadlines only decide
/// when an entry's content is fetched again. Nothing runs in the background.
///
/// # Example
///
/// ```rust,ignore
/// use secrets_cache::{GetSecretValueOptions, SecretsCache};
///
/// let cache = SecretsCache::builder().client(Arc::new(my_client)).build()?;
///
/// // Version carrying the default stage
/// let secret = cache.get_secret_value("db/password", GetSecretValueOptions::default()).await?;
///
/// // A specific stage
/// let previous = cache
///     .get_secret_value("db/password", GetSecretValueOptions::version_stage("previous"))
///     .await?;
/// ```
pub struct SecretsCache {
    client: Arc<dyn SecretsManagerClient>,
    config: Arc<CacheConfig>,
    metrics: CacheMetrics,
    secrets: Mutex<LruCache<String, Arc<CachedSecret>>>,
}

impl std::fmt::Debug for SecretsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsCache")
            .field("config", &self.config)
            .field("client", &"[SecretsManagerClient]")
            .finish()
    }
}

impl SecretsCache {
    /// Create a cache over `client` after validating `config`.
    pub fn new(client: Arc<dyn SecretsManagerClient>, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.max_cache_size;
        Ok(Self {
            client,
            config: Arc::new(config),
            metrics: CacheMetrics::new(),
            secrets: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn builder() -> SecretsCacheBuilder {
        SecretsCacheBuilder::default()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the payload selected by `options`, or `None` when the requested
    /// stage is not attached to any version (including secrets without
    /// versions).
    ///
    /// Errors come only from the client and are returned unchanged.
    #[instrument(
        level = "debug",
        skip(self, options),
        fields(
            version_id = options.version_id.as_deref(),
            version_stage = options.version_stage.as_deref(),
            force = options.force
        )
    )]
    pub async fn get_secret_value(
        &self,
        secret_id: &str,
        options: GetSecretValueOptions,
    ) -> Result<Option<GetSecretValueOutput>> {
        let secret = self.secret(secret_id).await;
        secret.get_secret_value(&options).await
    }

    /// Like [`get_secret_value`](Self::get_secret_value), returning only the
    /// string payload.
    pub async fn get_secret_string(
        &self,
        secret_id: &str,
        options: GetSecretValueOptions,
    ) -> Result<Option<SecretString>> {
        Ok(self.get_secret_value(secret_id, options).await?.and_then(|output| output.secret_string))
    }

    /// Number of secrets currently pooled.
    pub async fn len(&self) -> usize {
        self.secrets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.secrets.lock().await.is_empty()
    }

    /// Whether `secret_id` is currently pooled. Does not affect recency.
    pub async fn contains(&self, secret_id: &str) -> bool {
        self.secrets.lock().await.contains(secret_id)
    }

    /// Drop every cached secret. The next lookup of each starts from scratch.
    pub async fn clear(&self) {
        let mut secrets = self.secrets.lock().await;
        let count = secrets.len();
        secrets.clear();
        debug!(count = count, "Cleared secrets cache");
    }

    async fn secret(&self, secret_id: &str) -> Arc<CachedSecret> {
        let mut secrets = self.secrets.lock().await;
        if let Some(existing) = secrets.get(secret_id) {
            self.metrics.record_lookup(CacheLayer::Secrets, "hit");
            return Arc::clone(existing);
        }

        self.metrics.record_lookup(CacheLayer::Secrets, "miss");
        let secret = Arc::new(CachedSecret::new(
            secret_id,
            Arc::clone(&self.client),
            Arc::clone(&self.config),
        ));
        if let Some((evicted, _)) = secrets.insert(secret_id.to_string(), Arc::clone(&secret)) {
            self.metrics.record_eviction(CacheLayer::Secrets);
            debug!(secret_id = %evicted, "Evicted secret cache");
        }
        secret
    }
}

/// Builder for [`SecretsCache`].
///
/// Without an explicit client the cache reads from environment variables via
/// [`EnvSecretsManager`].
#[derive(Default)]
pub struct SecretsCacheBuilder {
    client: Option<Arc<dyn SecretsManagerClient>>,
    config: Option<CacheConfig>,
}

impl SecretsCacheBuilder {
    pub fn client(mut self, client: Arc<dyn SecretsManagerClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<SecretsCache> {
        let config = self.config.unwrap_or_default();
        let client = match self.client {
            Some(client) => client,
            None => {
                debug!("No secrets client supplied, reading secrets from the environment");
                Arc::new(EnvSecretsManager::with_stage(config.default_version_stage.clone()))
            }
        };
        SecretsCache::new(client, config)
    }
}
