//! # Metrics Collection
//!
//! Cache counters recorded through the `metrics` facade. The library never
//! installs an exporter; whichever recorder the host application installs
//! receives these series.

use metrics::{counter, describe_counter};
use std::sync::Once;

/// Cache layer a metric refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayer {
    /// Top-level pool of secrets
    Secrets,
    /// Stage-to-version map of one secret
    Stages,
    /// Materialized value of one version
    Versions,
}

impl CacheLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secrets => "secrets",
            Self::Stages => "stages",
            Self::Versions => "versions",
        }
    }
}

static DESCRIBE: Once = Once::new();

/// Metrics recorder for cache activity
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Create a recorder, registering metric descriptions on first use.
    pub fn new() -> Self {
        DESCRIBE.call_once(|| {
            describe_counter!(
                "secrets_cache_lookups_total",
                "Cache lookups by layer and outcome (hit, miss, forced, absent)"
            );
            describe_counter!(
                "secrets_cache_refreshes_total",
                "Remote refreshes by layer and status"
            );
            describe_counter!(
                "secrets_cache_evictions_total",
                "Entries evicted by capacity pressure, by layer"
            );
        });
        Self
    }

    /// Record the outcome of a lookup
    pub fn record_lookup(&self, layer: CacheLayer, outcome: &'static str) {
        let labels = [("layer", layer.as_str()), ("outcome", outcome)];
        counter!("secrets_cache_lookups_total", &labels).increment(1);
    }

    /// Record a remote refresh attempt
    pub fn record_refresh(&self, layer: CacheLayer, result: Result<(), &'static str>) {
        let status = match result {
            Ok(()) => "success",
            Err(kind) => kind,
        };
        let labels = [("layer", layer.as_str()), ("status", status)];
        counter!("secrets_cache_refreshes_total", &labels).increment(1);
    }

    /// Record a capacity eviction
    pub fn record_eviction(&self, layer: CacheLayer) {
        let labels = [("layer", layer.as_str())];
        counter!("secrets_cache_evictions_total", &labels).increment(1);
    }
}
