//! Error types for the TerraDB storage engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid MBR: {0}")]
    InvalidMbr(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Merge aborted: {0}")]
    MergeAborted(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // SQL-related errors
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}
