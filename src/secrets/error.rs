//! Error types for secrets cache operations.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving secrets.
///
/// Remote client failures are produced by [`SecretsManagerClient`] implementations
/// and travel through every cache layer unchanged.
///
/// [`SecretsManagerClient`]: super::client::SecretsManagerClient
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret (or the requested version of it) does not exist in the backend.
    #[error("Secret not found: {secret_id}")]
    NotFound { secret_id: String },

    /// Failed to reach the secrets backend.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Authentication with the secrets backend failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The backend rejected the request because of rate limiting.
    #[error("Request throttled: {message}")]
    Throttled { message: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(secret_id: impl Into<String>) -> Self {
        Self::NotFound { secret_id: secret_id.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a throttled error.
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled { message: message.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Short, stable label for the error kind. Used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::Throttled { .. } => "throttled",
            Self::BackendError { .. } => "backend",
            Self::ConfigError { .. } => "config",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<validator::ValidationErrors> for SecretsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::config_error(errors.to_string())
    }
}
