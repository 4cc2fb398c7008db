//! Accumulator configuration.
//!
//! The defaults reproduce the reference construction: a reseed needs at
//! least 64 bytes in pool 0 and may happen at most every 100 ms.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the reseed policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Bytes pool 0 must hold before a reseed is allowed.
    pub min_pool_size: u64,
    /// Minimum time between two reseeds, in milliseconds.
    pub min_reseed_interval_ms: u64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            min_pool_size: 64,
            min_reseed_interval_ms: 100,
        }
    }
}

impl AccumulatorConfig {
    /// Returns the minimum reseed interval.
    pub fn min_reseed_interval(&self) -> Duration {
        Duration::from_millis(self.min_reseed_interval_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero threshold would allow reseeding from an empty pool.
        if self.min_pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid minimum pool size (must be at least 1 byte)")]
    InvalidPoolSize,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
