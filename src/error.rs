//! Error types for the forecast-prep pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for the preprocessing pipeline
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid step: '{0}' (expected 'train' or 'inference')")]
    InvalidStep(String),

    #[error("Empty lag list: at least one target lag is required")]
    EmptyLagList,

    #[error("Insufficient history for series [{series}]: extended length {length} is shorter than the required window of {required} rows")]
    InsufficientHistory {
        series: String,
        length: usize,
        required: usize,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        PrepError::DataError(err.to_string())
    }
}
