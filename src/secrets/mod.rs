//! Remote secrets manager abstraction.
//!
//! The cache talks to its backing service through [`SecretsManagerClient`], a
//! narrow trait with the only two remote operations it needs:
//! - **describe_secret**: which versions exist and which stage labels they carry
//! - **get_secret_value**: the payload of one version
//!
//! # Implementations
//!
//! - [`InMemorySecretsManager`]: versioned in-process store with call counters
//!   and failure injection, for tests and snapshot-driven tooling
//! - [`EnvSecretsManager`]: read-only environment variable backend, the
//!   development default
//!
//! Production deployments inject their own client wrapping the real service.
//!
//! # Security Considerations
//!
//! - Payloads are held in [`SecretString`] / [`SecretBytes`], which redact
//!   themselves in logs and serialized output and are zeroed on drop
//! - Errors carry identifiers, never payloads

pub mod client;
pub mod env;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{DescribeSecretOutput, GetSecretValueOutput, SecretsManagerClient};
pub use env::EnvSecretsManager;
pub use error::{Result, SecretsError};
pub use memory::{InMemorySecretsManager, SecretsSnapshot, SnapshotSecret, SnapshotVersion};
pub use types::{SecretBytes, SecretString};
