// In: src/error.rs

//! This module defines the single, unified error type for the entire trimframe library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrimframeError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// A derived computation needed a column that is missing or has the wrong type.
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    #[error("Pipeline execution failed at stage '{stage}': {source}")]
    PipelineError {
        stage: String,
        #[source]
        source: Box<TrimframeError>,
    },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the Parquet writer or reader.
    #[error("Parquet operation failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl TrimframeError {
    /// Wraps `self` with the name of the pipeline stage it came from.
    ///
    /// Schema errors are part of the pipeline contract and are returned unwrapped.
    pub(crate) fn in_stage(self, stage: &str) -> Self {
        match self {
            err @ (TrimframeError::SchemaError(_) | TrimframeError::PipelineError { .. }) => err,
            other => TrimframeError::PipelineError {
                stage: stage.to_string(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TrimframeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::error::ArrowError;

    #[test]
    fn test_in_stage_keeps_schema_errors_unwrapped() {
        let err = TrimframeError::SchemaError("missing column 'price'".into()).in_stage("with_product");
        assert!(matches!(err, TrimframeError::SchemaError(_)));
    }

    #[test]
    fn test_in_stage_wraps_arrow_errors() {
        let err = TrimframeError::from(ArrowError::ComputeError("overflow".into())).in_stage("filter_gt");
        match err {
            TrimframeError::PipelineError { stage, source } => {
                assert_eq!(stage, "filter_gt");
                assert!(matches!(*source, TrimframeError::Arrow(_)));
            }
            other => panic!("Expected PipelineError, got {:?}", other),
        }
    }
}
