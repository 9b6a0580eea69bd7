//! Zarr V3 feature partitions on the local filesystem.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use super::{check_cell_request, FeaturePartition, FeatureStore};
use crate::error::{FetchError, Result};
use crate::types::{PartitionAxes, PartitionKey};

/// One partition stored as a single 4-D Zarr array at the store root.
///
/// Axes are carried in the array attributes `variables`, `latitudes`,
/// `longitudes` and `times` (ISO dates).
pub struct ZarrPartition {
    array: Array<FilesystemStore>,
    path: PathBuf,
    axes: PartitionAxes,
}

impl ZarrPartition {
    /// Open a partition directory read-only.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(FetchError::MissingPartition(path.to_path_buf()));
        }

        let store = FilesystemStore::new(path)
            .map_err(|e| FetchError::open_failed(format!("{}: {}", path.display(), e)))?;
        let array = Array::open(Arc::new(store), "/")
            .map_err(|e| FetchError::open_failed(format!("{}: {}", path.display(), e)))?;

        let axes = Self::extract_axes(&array)?;

        let shape: Vec<usize> = array.shape().iter().map(|d| *d as usize).collect();
        if shape != axes.shape() {
            return Err(FetchError::invalid_metadata(format!(
                "{}: array shape {:?} does not match axes {:?}",
                path.display(),
                shape,
                axes.shape()
            )));
        }

        Ok(Self {
            array,
            path: path.to_path_buf(),
            axes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract coordinate axes from the array attributes.
    fn extract_axes(array: &Array<FilesystemStore>) -> Result<PartitionAxes> {
        let attrs = array.attributes();

        if array.shape().len() != 4 {
            return Err(FetchError::invalid_metadata(
                "partition array must have 4 dimensions [time, variable, lat, lon]",
            ));
        }

        let get = |name: &str| {
            attrs
                .get(name)
                .cloned()
                .ok_or_else(|| FetchError::invalid_metadata(format!("missing attribute '{}'", name)))
        };

        let variables: Vec<String> = serde_json::from_value(get("variables")?)?;
        let latitudes: Vec<f64> = serde_json::from_value(get("latitudes")?)?;
        let longitudes: Vec<f64> = serde_json::from_value(get("longitudes")?)?;
        let times: Vec<NaiveDate> = serde_json::from_value(get("times")?)?;

        let axes = PartitionAxes {
            variables,
            latitudes,
            longitudes,
            times,
        };
        axes.validate().map_err(FetchError::InvalidMetadata)?;
        Ok(axes)
    }
}

impl FeaturePartition for ZarrPartition {
    fn axes(&self) -> &PartitionAxes {
        &self.axes
    }

    fn read_cell(&self, lat_idx: usize, lon_idx: usize, time: Range<usize>) -> Result<Vec<f32>> {
        check_cell_request(&self.axes, lat_idx, lon_idx, &time)?;
        if time.is_empty() {
            return Ok(Vec::new());
        }

        let n_vars = self.axes.variables.len();

        // Zarr uses [time, variable, lat, lon] indexing
        let subset = ArraySubset::new_with_start_shape(
            vec![time.start as u64, 0, lat_idx as u64, lon_idx as u64],
            vec![time.len() as u64, n_vars as u64, 1, 1],
        )
        .map_err(|e| FetchError::read_failed(e.to_string()))?;

        let data: Vec<f32> = self
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| FetchError::read_failed(format!("{}: {}", self.path.display(), e)))?;

        if data.len() != time.len() * n_vars {
            return Err(FetchError::shape_mismatch(
                time.len() * n_vars,
                data.len(),
            ));
        }

        Ok(data)
    }
}

/// Directory of Zarr partitions laid out `<root>/<season>/<area>/Region_<zone>.zarr`.
#[derive(Debug, Clone)]
pub struct ZarrFeatureStore {
    root: PathBuf,
}

impl ZarrFeatureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a partition.
    pub fn partition_path(&self, key: &PartitionKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl FeatureStore for ZarrFeatureStore {
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn FeaturePartition>> {
        let path = self.partition_path(key);
        tracing::trace!(path = %path.display(), "Opening feature partition");
        Ok(Box::new(ZarrPartition::open(&path)?))
    }
}
