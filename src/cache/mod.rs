//! Read-through secrets cache.
//!
//! A lookup walks four layers, each owning its own lock and refresh deadline:
//!
//! ```text
//! SecretsCache ──► CachedSecret ──► stage map ──► CachedSecretVersion ──► client
//!  (LRU, 1024)      (per secret)    (describe)     (LRU, 10 per secret)
//! ```
//!
//! - Deadlines are jittered per entry by [`choose_ttl`] so entries filled
//!   together do not expire together
//! - No lock is held across a call to the remote client; two concurrent misses
//!   may both fetch, and the last write wins
//! - Failed fetches are returned to the caller and never advance a deadline

pub mod lru;
pub mod options;
pub mod secret;
pub mod secrets_cache;
pub mod ttl;
pub mod version;

pub use lru::LruCache;
pub use options::GetSecretValueOptions;
pub use secret::{CachedSecret, MAX_VERSIONS_CACHE};
pub use secrets_cache::{SecretsCache, SecretsCacheBuilder};
pub use ttl::choose_ttl;
pub use version::CachedSecretVersion;
