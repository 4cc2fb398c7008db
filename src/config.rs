//! Configuration file format for the vector tool.
//!
//! Every section is optional. A missing file section falls back to the
//! defaults, which reproduce the published reference vectors.

use crate::accumulator::{AccumulatorConfig, ConfigError};
use crate::vectors::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Reseed policy.
    #[serde(default)]
    pub accumulator: AccumulatorConfig,
    /// How results are printed.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used for printed vectors.
    pub format: OutputFormat,
    /// Print Prometheus metrics after the vectors.
    pub metrics: bool,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.accumulator.validate()?;
        Ok(config)
    }
}
