//! Error types for dataset preparation.

use std::io;

use thiserror::Error;

use avy_common::CatalogError;
use feature_grid::FetchError;

/// Errors that can occur while preparing training data.
#[derive(Error, Debug)]
pub enum PrepError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Trend augmentation produced a different number of rows than it was
    /// given.
    #[error("label augmentation changed row count: {before} rows in, {after} rows out")]
    JoinCountMismatch { before: usize, after: usize },

    /// No class of the label column had any row left to draw.
    #[error("no rows left to draw for any of {classes:?} in column {column} ({have} of {wanted} samples filled)")]
    EmptyClassDraw {
        column: String,
        classes: Vec<String>,
        have: usize,
        wanted: usize,
    },

    /// Consecutive sampling passes produced no usable sample.
    #[error("{passes} consecutive sampling passes produced no usable sample ({have} of {wanted} filled)")]
    FetchStalled {
        passes: usize,
        have: usize,
        wanted: usize,
    },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The host ran out of disk space or memory.
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("Failed to read label data: {0}")]
    LabelRead(String),

    #[error("Failed to write label data: {0}")]
    LabelWrite(String),

    #[error("NumPy array error: {0}")]
    Npy(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl PrepError {
    pub fn shape_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn npy(msg: impl ToString) -> Self {
        Self::Npy(msg.to_string())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<io::Error> for PrepError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::StorageFull | io::ErrorKind::OutOfMemory => {
                Self::ResourceExhaustion(err.to_string())
            }
            _ => Self::Io(err),
        }
    }
}

impl From<csv::Error> for PrepError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => io_err.into(),
            kind => Self::LabelRead(format!("{:?}", kind)),
        }
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Checkpoint(err.to_string())
    }
}

/// Result type for preparation operations.
pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_space_is_resource_exhaustion() {
        let err: PrepError = io::Error::new(io::ErrorKind::StorageFull, "disk full").into();
        assert!(matches!(err, PrepError::ResourceExhaustion(_)));

        let err: PrepError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, PrepError::Io(_)));
    }
}
