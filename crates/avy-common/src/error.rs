//! Error types for catalog lookups.

use thiserror::Error;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by zone, season and danger-scale lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown forecast zone: {0}")]
    UnknownZone(String),

    #[error("Unknown administrative area: {0}")]
    UnknownArea(String),

    #[error("Unknown season label: {0}")]
    UnknownSeason(String),

    #[error("Invalid label date '{0}', expected YYYYMMDD")]
    InvalidDate(String),
}
