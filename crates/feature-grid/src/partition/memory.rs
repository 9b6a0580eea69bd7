//! In-memory feature partitions.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use ndarray::{s, Array4};

use super::{check_cell_request, FeaturePartition, FeatureStore};
use crate::error::{FetchError, Result};
use crate::types::{PartitionAxes, PartitionKey};

/// Partition held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryPartition {
    axes: PartitionAxes,
    /// `[time, variable, lat, lon]`
    data: Arc<Array4<f32>>,
}

impl MemoryPartition {
    /// Create a partition, checking that `data` matches the axes.
    pub fn new(axes: PartitionAxes, data: Array4<f32>) -> Result<Self> {
        axes.validate().map_err(FetchError::InvalidMetadata)?;
        let expected = axes.shape();
        if data.shape() != expected {
            return Err(FetchError::shape_mismatch(
                format!("{:?}", expected),
                format!("{:?}", data.shape()),
            ));
        }
        Ok(Self {
            axes,
            data: Arc::new(data),
        })
    }

    /// Raw data, `[time, variable, lat, lon]`.
    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }
}

impl FeaturePartition for MemoryPartition {
    fn axes(&self) -> &PartitionAxes {
        &self.axes
    }

    fn read_cell(&self, lat_idx: usize, lon_idx: usize, time: Range<usize>) -> Result<Vec<f32>> {
        check_cell_request(&self.axes, lat_idx, lon_idx, &time)?;
        Ok(self
            .data
            .slice(s![time, .., lat_idx, lon_idx])
            .iter()
            .copied()
            .collect())
    }
}

/// Feature store backed by a map of in-memory partitions.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureStore {
    partitions: HashMap<PartitionKey, MemoryPartition>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PartitionKey, partition: MemoryPartition) {
        self.partitions.insert(key, partition);
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn FeaturePartition>> {
        self.partitions
            .get(key)
            .cloned()
            .map(|p| Box::new(p) as Box<dyn FeaturePartition>)
            .ok_or_else(|| FetchError::MissingPartition(key.relative_path()))
    }
}
