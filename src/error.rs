//! Error types for the table-detect-eval library.

use thiserror::Error;

/// Result type for table-detect-eval operations.
pub type Result<T> = std::result::Result<T, TableEvalError>;

/// Error types that can occur while configuring or feeding the detection pipeline.
///
/// Matching and scoring never produce errors; everything here is raised at a
/// boundary (configuration, tensor intake, file loading).
#[derive(Error, Debug)]
pub enum TableEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Threshold outside `[0, 1]` or not finite.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Configuration value that cannot describe a real grid or image.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tensor rank or extent does not match the configured layout.
    #[error("Invalid tensor shape: {0}")]
    InvalidShape(String),

    /// Malformed page layout record.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Invalid bounding box coordinates.
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}
