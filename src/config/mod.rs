//! # Configuration Management
//!
//! Cache and logging configuration. Both structs deserialize from partial
//! documents and can be loaded from `SECRETS_CACHE_*` environment variables.

pub mod settings;

pub use settings::{
    CacheConfig, ObservabilityConfig, DEFAULT_MAX_CACHE_SIZE, DEFAULT_SECRET_REFRESH_INTERVAL_MS,
    DEFAULT_VERSION_STAGE, PENDING_VERSION_STAGE, PREVIOUS_VERSION_STAGE,
};
