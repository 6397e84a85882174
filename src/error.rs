//! Error types for the veritrain pipeline

use thiserror::Error;

/// Result type alias for veritrain operations
pub type Result<T> = std::result::Result<T, VeritrainError>;

/// Main error type for the veritrain pipeline
#[derive(Error, Debug)]
pub enum VeritrainError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Not fitted: {0} must be fitted before use")]
    NotFitted(&'static str),

    #[error("{0} is already fitted; fit must be called exactly once, on the training partition")]
    AlreadyFitted(&'static str),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for VeritrainError {
    fn from(err: polars::error::PolarsError) -> Self {
        VeritrainError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for VeritrainError {
    fn from(err: serde_json::Error) -> Self {
        VeritrainError::SerializationError(err.to_string())
    }
}
