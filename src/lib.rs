//! # secrets-cache
//!
//! Client-side, read-through cache for a remote secrets manager whose secrets
//! carry immutable versions and movable stage labels ("current", "previous",
//! "pending", ...).
//!
//! ## Architecture
//!
//! ```text
//! SecretsCache (LRU of secrets)
//!      ↓
//! CachedSecret (stage map + LRU of versions)
//!      ↓
//! CachedSecretVersion (payload) → SecretsManagerClient
//! ```
//!
//! Every layer refreshes lazily on read, once its jittered deadline has
//! passed. There are no background tasks and no write operations.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use secrets_cache::{GetSecretValueOptions, Result, SecretsCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = SecretsCache::builder().build()?;
//!     let value = cache
//!         .get_secret_string("db/password", GetSecretValueOptions::default())
//!         .await?;
//!     println!("found: {}", value.is_some());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use cache::{GetSecretValueOptions, SecretsCache, SecretsCacheBuilder};
pub use config::{CacheConfig, ObservabilityConfig};
pub use observability::init_logging;
pub use secrets::{
    DescribeSecretOutput, GetSecretValueOutput, Result, SecretBytes, SecretString, SecretsError,
    SecretsManagerClient,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
