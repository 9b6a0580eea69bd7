//! Core types for feature-grid access.

use std::ops::Range;
use std::path::PathBuf;

use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use avy_common::{Area, Season};

/// Address of one feature partition: one zone's grid for one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub season: Season,
    pub area: Area,
    pub zone: String,
}

impl PartitionKey {
    pub fn new(season: Season, area: Area, zone: impl Into<String>) -> Self {
        Self {
            season,
            area,
            zone: zone.into(),
        }
    }

    /// Path of the partition relative to the store root:
    /// `<season>/<area>/Region_<zone>.zarr`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.season.label())
            .join(self.area.as_str())
            .join(format!("Region_{}.zarr", self.zone))
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.season, self.area, self.zone)
    }
}

/// Coordinate axes of a partition.
///
/// Data is laid out `[time, variable, latitude, longitude]`. Coordinates
/// may be ascending or descending; times are strictly increasing but need
/// not be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionAxes {
    pub variables: Vec<String>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub times: Vec<NaiveDate>,
}

impl PartitionAxes {
    /// Array shape `[time, variable, lat, lon]`.
    pub fn shape(&self) -> [usize; 4] {
        [
            self.times.len(),
            self.variables.len(),
            self.latitudes.len(),
            self.longitudes.len(),
        ]
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the latitude closest to `lat`.
    pub fn nearest_lat(&self, lat: f64) -> Option<usize> {
        nearest_index(&self.latitudes, lat)
    }

    /// Index of the longitude closest to `lon`.
    pub fn nearest_lon(&self, lon: f64) -> Option<usize> {
        nearest_index(&self.longitudes, lon)
    }

    /// Index of the time step closest to `date`.
    pub fn nearest_time(&self, date: NaiveDate) -> Option<usize> {
        self.times
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (**t - date).num_days().abs())
            .map(|(i, _)| i)
    }

    /// Range of time indices with `start <= time <= end`.
    pub fn time_range(&self, start: NaiveDate, end: NaiveDate) -> Range<usize> {
        let lo = self.times.partition_point(|t| *t < start);
        let hi = self.times.partition_point(|t| *t <= end);
        lo..hi.max(lo)
    }

    /// Validate that the axes describe a well-formed grid.
    pub fn validate(&self) -> Result<(), String> {
        if self.times.windows(2).any(|w| w[0] >= w[1]) {
            return Err("times must be strictly increasing".to_string());
        }
        if self.latitudes.iter().chain(&self.longitudes).any(|c| !c.is_finite()) {
            return Err("coordinates must be finite".to_string());
        }
        let mut names = self.variables.clone();
        names.sort();
        names.dedup();
        if names.len() != self.variables.len() {
            return Err("variable names must be unique".to_string());
        }
        Ok(())
    }
}

/// Ties resolve to the lower index.
fn nearest_index(coords: &[f64], target: f64) -> Option<usize> {
    coords
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, c)| {
            let dist = (c - target).abs();
            match best {
                Some((_, d)) if d <= dist => best,
                _ => Some((i, dist)),
            }
        })
        .map(|(i, _)| i)
}

/// A grid cell of a zone with usable feature data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub zone: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fixed-length feature series for one grid cell, ending at a label date.
#[derive(Debug, Clone)]
pub struct PointSeries {
    pub zone: String,
    /// Latitude of the grid cell actually selected.
    pub latitude: f64,
    /// Longitude of the grid cell actually selected.
    pub longitude: f64,
    /// Contiguous daily calendar, oldest first.
    pub dates: Vec<NaiveDate>,
    pub variables: Vec<String>,
    /// `[variable, day]`; days without data are NaN.
    pub values: Array2<f32>,
}

impl PointSeries {
    pub fn lookback_days(&self) -> usize {
        self.dates.len()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Number of (variable, day) slots without data.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}
