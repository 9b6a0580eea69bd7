//! Feature partition traits and implementations.

mod memory;
mod zarr;

pub use memory::{MemoryFeatureStore, MemoryPartition};
pub use zarr::{ZarrFeatureStore, ZarrPartition};

use std::ops::Range;

use crate::error::Result;
use crate::types::{PartitionAxes, PartitionKey};

/// Read-only handle to one opened partition.
///
/// Handles are cheap to open and are never shared between workers; each
/// fetch opens its own.
pub trait FeaturePartition: Send {
    /// Coordinate axes of the partition.
    fn axes(&self) -> &PartitionAxes;

    /// Read every variable of one grid cell over a contiguous range of time
    /// indices.
    ///
    /// # Returns
    /// Values laid out `[time][variable]`, i.e. `time.len() * n_variables`
    /// elements.
    fn read_cell(&self, lat_idx: usize, lon_idx: usize, time: Range<usize>) -> Result<Vec<f32>>;
}

/// A collection of partitions addressable by [`PartitionKey`].
pub trait FeatureStore: Send + Sync {
    /// Open a partition read-only.
    ///
    /// Fails with `FetchError::MissingPartition` when no partition exists for
    /// the key.
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn FeaturePartition>>;
}

/// Check a cell/time request against the partition shape.
pub(crate) fn check_cell_request(
    axes: &PartitionAxes,
    lat_idx: usize,
    lon_idx: usize,
    time: &Range<usize>,
) -> Result<()> {
    let [n_time, _, n_lat, n_lon] = axes.shape();
    if lat_idx >= n_lat || lon_idx >= n_lon || time.end > n_time || time.start > time.end {
        return Err(crate::FetchError::InvalidRequest(format!(
            "cell ({}, {}) time {:?} outside grid of shape {:?}",
            lat_idx,
            lon_idx,
            time,
            axes.shape()
        )));
    }
    Ok(())
}
