//! # Observability
//!
//! Structured logging setup and cache metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{CacheLayer, CacheMetrics};
