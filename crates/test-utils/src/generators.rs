//! Synthetic feature grids with values that encode their coordinates.
//!
//! Every generated value is
//! `days_since(EPOCH) * 1000 + variable * 100 + lat_idx * 10 + lon_idx`,
//! so a test can tell from a fetched value exactly which cell and day it
//! came from. All such values are exact in `f32` for the seasons used here.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use ndarray::Array4;

use avy_common::{Area, Season};
use feature_grid::{
    MemoryFeatureStore, MemoryPartition, PartitionAxes, PartitionKey, ZarrFeatureStore,
    ZarrWriter, ZarrWriterConfig,
};

/// Day zero of the value encoding.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

/// Encoded value of one cell.
pub fn encode_value(date: NaiveDate, var: usize, lat_idx: usize, lon_idx: usize) -> f32 {
    let day = (date - epoch()).num_days() as usize;
    (day * 1000 + var * 100 + lat_idx * 10 + lon_idx) as f32
}

/// Variable names `V00`, `V01`, ...
pub fn variable_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("V{:02}", i)).collect()
}

/// Shape and content of one synthetic partition.
#[derive(Debug, Clone)]
pub struct PartitionSpec {
    pub season: Season,
    pub area: Area,
    pub zone: String,
    pub variables: Vec<String>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Days of the season without a stored time step.
    pub missing_days: Vec<NaiveDate>,
    /// Cells `(lat_idx, lon_idx)` that hold only NaN.
    pub empty_cells: Vec<(usize, usize)>,
}

impl PartitionSpec {
    /// A 2x2 grid covering the whole season with `n_vars` variables.
    pub fn new(season: Season, area: Area, zone: &str, n_vars: usize) -> Self {
        Self {
            season,
            area,
            zone: zone.to_string(),
            variables: variable_names(n_vars),
            latitudes: vec![41.0, 40.75],
            longitudes: vec![-111.75, -111.5],
            missing_days: Vec::new(),
            empty_cells: Vec::new(),
        }
    }

    pub fn key(&self) -> PartitionKey {
        PartitionKey::new(self.season, self.area, self.zone.as_str())
    }

    pub fn axes(&self) -> PartitionAxes {
        let start = self.season.start_date();
        let days = (self.season.end_date() - start).num_days();
        let times = (0..=days)
            .map(|d| start + Duration::days(d))
            .filter(|d| !self.missing_days.contains(d))
            .collect();
        PartitionAxes {
            variables: self.variables.clone(),
            latitudes: self.latitudes.clone(),
            longitudes: self.longitudes.clone(),
            times,
        }
    }

    /// Data `[time, variable, lat, lon]`.
    pub fn data(&self) -> Array4<f32> {
        let axes = self.axes();
        let [nt, nv, ny, nx] = axes.shape();
        Array4::from_shape_fn((nt, nv, ny, nx), |(t, v, y, x)| {
            if self.empty_cells.contains(&(y, x)) {
                f32::NAN
            } else {
                encode_value(axes.times[t], v, y, x)
            }
        })
    }
}

/// In-memory store holding every partition in `specs`.
pub fn memory_store(specs: &[PartitionSpec]) -> MemoryFeatureStore {
    let mut store = MemoryFeatureStore::new();
    for spec in specs {
        let partition = MemoryPartition::new(spec.axes(), spec.data()).unwrap();
        store.insert(spec.key(), partition);
    }
    store
}

/// Zarr store under `root` holding every partition in `specs`.
pub fn zarr_store(root: &Path, specs: &[PartitionSpec]) -> ZarrFeatureStore {
    let store = ZarrFeatureStore::new(root);
    let writer = ZarrWriter::new(ZarrWriterConfig::uncompressed()).unwrap();
    for spec in specs {
        let data = spec.data();
        let values: Vec<f32> = data.iter().copied().collect();
        writer
            .write_partition(&store.partition_path(&spec.key()), &spec.axes(), &values)
            .unwrap();
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_exact() {
        let date = NaiveDate::from_ymd_opt(2020, 4, 30).unwrap();
        let v = encode_value(date, 9, 9, 9);
        assert_eq!(v as u64 % 1000, 999);
    }

    #[test]
    fn test_partition_spec() {
        let mut spec = PartitionSpec::new(Season::S15_16, Area::Utah, "Logan", 3);
        spec.missing_days = vec![NaiveDate::from_ymd_opt(2015, 12, 25).unwrap()];
        spec.empty_cells = vec![(0, 1)];
        let axes = spec.axes();
        assert_eq!(axes.times.len(), 182 - 1);
        let data = spec.data();
        assert!(data[[0, 0, 0, 1]].is_nan());
        assert_eq!(data[[0, 2, 1, 0]], encode_value(axes.times[0], 2, 1, 0));
    }
}
