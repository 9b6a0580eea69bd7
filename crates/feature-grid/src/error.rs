//! Error types for feature-grid access.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use avy_common::CatalogError;

/// Errors that can occur while reading feature partitions.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Zone lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The requested date is outside every defined season.
    #[error("date {0} is outside every forecast season")]
    UnknownSeason(NaiveDate),

    /// No partition exists for (season, area, zone).
    #[error("missing feature partition: {}", .0.display())]
    MissingPartition(PathBuf),

    /// The partition has no grid cells, variables or time steps.
    #[error("feature partition {0} is empty")]
    EmptyPartition(String),

    /// A slice or series does not have the expected shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid partition metadata.
    #[error("invalid partition metadata: {0}")]
    InvalidMetadata(String),

    /// Failed to open a partition.
    #[error("failed to open partition: {0}")]
    OpenFailed(String),

    /// Failed to read data from a partition.
    #[error("failed to read partition data: {0}")]
    ReadFailed(String),

    /// Failed to write a Zarr array.
    #[error("failed to write Zarr array: {0}")]
    WriteFailed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),
}

impl FetchError {
    pub fn shape_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Whether the failure is confined to a single sample, so the caller
    /// may drop the sample and keep going.
    pub fn is_per_sample(&self) -> bool {
        matches!(
            self,
            Self::MissingPartition(_)
                | Self::EmptyPartition(_)
                | Self::ShapeMismatch { .. }
                | Self::ReadFailed(_)
                | Self::OpenFailed(_)
                | Self::UnknownSeason(_)
        )
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for feature-grid operations.
pub type Result<T> = std::result::Result<T, FetchError>;
