// In: src/config.rs

//! The single source of truth for all trimframe configuration.
//!
//! This module defines the unified `TrimframeConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from a JSON file) and then
//! passed down through the system, shared read-only via `Arc<TrimframeConfig>`
//! when it has to cross into the chunked workers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrimframeError;

//==================================================================================
// I. Component Configuration Structs
//==================================================================================

/// Knobs for the `TypeOptimizer`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct OptimizerConfig {
    /// A text column becomes categorical when `distinct / rows` is strictly below this.
    #[serde(default = "default_categorical_threshold")]
    pub categorical_threshold: f64,

    /// Largest absolute error accepted when narrowing a `Float64` value to `Float32`.
    #[serde(default = "default_float_tolerance")]
    pub float_tolerance: f64,

    /// If false, float columns are left at their declared width.
    #[serde(default = "default_true")]
    pub downcast_floats: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: default_categorical_threshold(),
            float_tolerance: default_float_tolerance(),
            downcast_floats: true,
        }
    }
}

/// Settings for the Parquet sink. The compression codec is fixed to Snappy and
/// intentionally not exposed here.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ParquetSinkConfig {
    #[serde(default = "default_max_row_group_size")]
    pub max_row_group_size: usize,
}

impl Default for ParquetSinkConfig {
    fn default() -> Self {
        Self {
            max_row_group_size: default_max_row_group_size(),
        }
    }
}

//==================================================================================
// II. The Unified TrimframeConfig
//==================================================================================

/// The single, unified configuration for trimframe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TrimframeConfig {
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// **The target number of rows per chunk** for chunked reading and the
    /// parallel fan-out in `chunked`.
    #[serde(default = "default_chunk_size_rows")]
    pub chunk_size_rows: usize,

    #[serde(default)]
    pub parquet: ParquetSinkConfig,
}

impl Default for TrimframeConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            chunk_size_rows: default_chunk_size_rows(),
            parquet: ParquetSinkConfig::default(),
        }
    }
}

impl TrimframeConfig {
    /// Parses and validates a config from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TrimframeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TrimframeError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), TrimframeError> {
        let threshold = self.optimizer.categorical_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(TrimframeError::ConfigError(format!(
                "categorical_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if !(self.optimizer.float_tolerance >= 0.0) {
            return Err(TrimframeError::ConfigError(format!(
                "float_tolerance must be non-negative, got {}",
                self.optimizer.float_tolerance
            )));
        }
        if self.chunk_size_rows == 0 {
            return Err(TrimframeError::ConfigError(
                "chunk_size_rows must be greater than zero".to_string(),
            ));
        }
        if self.parquet.max_row_group_size == 0 {
            return Err(TrimframeError::ConfigError(
                "parquet.max_row_group_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Break-even point for dictionary encoding.
fn default_categorical_threshold() -> f64 {
    0.5
}

fn default_float_tolerance() -> f64 {
    5e-4
}

/// Helper for `serde` to provide a default for `chunk_size_rows`.
fn default_chunk_size_rows() -> usize {
    100_000
}

fn default_max_row_group_size() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = TrimframeConfig::from_json_str("{}").unwrap();
        assert_eq!(config.optimizer.categorical_threshold, 0.5);
        assert_eq!(config.optimizer.float_tolerance, 5e-4);
        assert!(config.optimizer.downcast_floats);
        assert_eq!(config.chunk_size_rows, 100_000);
        assert_eq!(config.parquet.max_row_group_size, 1024 * 1024);
    }

    #[test]
    fn test_default_matches_empty_json_and_validates() {
        let config = TrimframeConfig::default();
        assert_eq!(config, TrimframeConfig::from_json_str("{}").unwrap());
        assert_eq!(config.chunk_size_rows, 100_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let json = r#"{ "optimizer": { "downcast_floats": false }, "chunk_size_rows": 5 }"#;
        let config = TrimframeConfig::from_json_str(json).unwrap();
        assert!(!config.optimizer.downcast_floats);
        assert_eq!(config.optimizer.categorical_threshold, 0.5);
        assert_eq!(config.chunk_size_rows, 5);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let json = r#"{ "optimizer": { "categorical_threshold": 0.0 } }"#;
        let result = TrimframeConfig::from_json_str(json);
        assert!(matches!(result, Err(TrimframeError::ConfigError(_))));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = TrimframeConfig::from_json_str(r#"{ "chunk_size_rows": 0 }"#);
        assert!(matches!(result, Err(TrimframeError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_json_surfaces_serde_error() {
        let result = TrimframeConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(TrimframeError::SerdeJson(_))));
    }
}
