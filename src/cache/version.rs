//! Cache for the payload of one secret version.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::ttl::choose_ttl;
use crate::config::CacheConfig;
use crate::observability::{CacheLayer, CacheMetrics};
use crate::secrets::{GetSecretValueOutput, Result, SecretsManagerClient};

#[derive(Debug, Default)]
struct VersionState {
    value: Option<GetSecretValueOutput>,
    /// `None` until the first successful fetch, which reads as already expired.
    refresh_at: Option<Instant>,
}

impl VersionState {
    fn is_expired(&self, now: Instant) -> bool {
        self.refresh_at.map_or(true, |at| now >= at)
    }
}

/// Payload cache for a single (secret, version) pair.
///
/// A version's content never changes once created, but the value is still
/// re-fetched after its deadline so revoked or deleted versions surface as
/// errors instead of being served forever.
pub struct CachedSecretVersion {
    secret_id: String,
    version_id: String,
    client: Arc<dyn SecretsManagerClient>,
    config: Arc<CacheConfig>,
    metrics: CacheMetrics,
    state: RwLock<VersionState>,
}

impl CachedSecretVersion {
    pub fn new(
        secret_id: impl Into<String>,
        version_id: impl Into<String>,
        client: Arc<dyn SecretsManagerClient>,
        config: Arc<CacheConfig>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            version_id: version_id.into(),
            client,
            config,
            metrics: CacheMetrics::new(),
            state: RwLock::new(VersionState::default()),
        }
    }

    /// Return the cached payload, fetching it first when the deadline has
    /// passed or `force` is set.
    ///
    /// Fetch errors are returned as is. The deadline is only advanced by a
    /// successful fetch, so after a failure every call goes back to the
    /// backend.
    #[instrument(
        level = "debug",
        skip(self),
        fields(secret_id = %self.secret_id, version_id = %self.version_id)
    )]
    pub async fn get(&self, force: bool) -> Result<Option<GetSecretValueOutput>> {
        {
            let state = self.state.read().await;
            if !force && !state.is_expired(Instant::now()) {
                self.metrics.record_lookup(CacheLayer::Versions, "hit");
                debug!("Version cache hit");
                return Ok(state.value.clone());
            }
        }

        self.metrics.record_lookup(CacheLayer::Versions, if force { "forced" } else { "miss" });
        self.refresh().await.map(Some)
    }

    async fn refresh(&self) -> Result<GetSecretValueOutput> {
        debug!("Fetching secret value");
        let fetched = self.client.get_secret_value(&self.secret_id, Some(&self.version_id)).await;
        let value = match fetched {
            Ok(value) => value,
            Err(e) => {
                self.metrics.record_refresh(CacheLayer::Versions, Err(e.kind()));
                debug!(error = %e, "Secret value fetch failed");
                return Err(e);
            }
        };
        self.metrics.record_refresh(CacheLayer::Versions, Ok(()));

        let ttl = choose_ttl(self.config.secret_refresh_interval());
        let mut state = self.state.write().await;
        state.value = Some(value.clone());
        state.refresh_at = Some(Instant::now() + ttl);
        debug!(ttl_ms = ttl.as_millis() as u64, "Cached secret value");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{InMemorySecretsManager, SecretsError};
    use std::time::Duration;

    async fn setup(interval: Duration) -> (InMemorySecretsManager, CachedSecretVersion) {
        let store = InMemorySecretsManager::new();
        store.put_version("db", "v1", "pw-1", &["current"]).await;
        let config = Arc::new(CacheConfig::default().with_secret_refresh_interval(interval));
        let version = CachedSecretVersion::new("db", "v1", Arc::new(store.clone()), config);
        (store, version)
    }

    #[tokio::test]
    async fn test_first_read_fetches_then_hits() {
        let (store, version) = setup(Duration::from_secs(60)).await;

        for _ in 0..5 {
            let value = version.get(false).await.unwrap().unwrap();
            assert_eq!(value.secret_string.unwrap().expose_secret(), "pw-1");
        }
        assert_eq!(store.get_value_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_value_is_refetched() {
        let (store, version) = setup(Duration::from_millis(1)).await;

        version.get(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        version.get(false).await.unwrap();

        assert_eq!(store.get_value_calls(), 2);
    }

    #[tokio::test]
    async fn test_force_bypasses_deadline() {
        let (store, version) = setup(Duration::from_secs(60)).await;

        version.get(false).await.unwrap();
        version.get(true).await.unwrap();

        assert_eq!(store.get_value_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_retries_every_read() {
        let (store, version) = setup(Duration::from_secs(60)).await;
        store.fail_with(|| SecretsError::connection_failed("unreachable")).await;

        for _ in 0..3 {
            let err = version.get(false).await.unwrap_err();
            assert!(matches!(err, SecretsError::ConnectionFailed { .. }));
        }
        assert_eq!(store.get_value_calls(), 3);

        store.clear_failure().await;
        assert!(version.get(false).await.unwrap().is_some());
        assert!(version.get(false).await.unwrap().is_some());
        assert_eq!(store.get_value_calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_serve_stale_value() {
        let (store, version) = setup(Duration::from_millis(1)).await;
        version.get(false).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        store.fail_with(|| SecretsError::throttled("slow down")).await;

        assert!(version.get(false).await.is_err());
    }
}
