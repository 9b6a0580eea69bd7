//! Configuration for label preparation, sampling and tensor generation.
//!
//! Every struct has defaults matching the production dataset and a
//! `validate()` method; the CLI loads them from YAML.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use avy_common::{DangerLevel, ElevationBand, Season};

use crate::pool::LabelColumn;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// A (season, zone) pair whose labels are known to be unreliable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedZoneSeason {
    pub season: Season,
    pub zone: String,
}

/// Parameters of the label/grid-point join and the train/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelJoinConfig {
    /// First label date kept (inclusive).
    pub date_start: NaiveDate,
    /// Last label date kept (inclusive).
    pub date_end: NaiveDate,
    /// Labels on or before this date are train, after it test.
    pub train_test_cutoff: NaiveDate,
    /// Seasons with trustworthy labels.
    pub seasons: Vec<Season>,
    /// Zone/season combinations dropped outright.
    pub excluded: Vec<ExcludedZoneSeason>,
    /// Elevation band trends are computed on.
    pub trend_band: ElevationBand,
    /// Season of the partition probed for grid points.
    pub probe_season: Season,
    /// Day probed for grid points; the nearest stored time step is used.
    pub probe_date: NaiveDate,
    /// Recompute the grid-point cache even when it exists.
    pub overwrite_cache: bool,
}

impl Default for LabelJoinConfig {
    fn default() -> Self {
        Self {
            date_start: date(2015, 11, 1),
            date_end: date(2020, 4, 30),
            train_test_cutoff: date(2019, 11, 1),
            seasons: vec![
                Season::S15_16,
                Season::S16_17,
                Season::S17_18,
                Season::S18_19,
            ],
            excluded: vec![
                ExcludedZoneSeason {
                    season: Season::S15_16,
                    zone: "Steamboat Zone".to_string(),
                },
                ExcludedZoneSeason {
                    season: Season::S16_17,
                    zone: "Front Range Zone".to_string(),
                },
            ],
            trend_band: ElevationBand::AboveTreeline,
            probe_season: Season::S15_16,
            probe_date: date(2016, 1, 1),
            overwrite_cache: false,
        }
    }
}

impl LabelJoinConfig {
    pub fn is_excluded(&self, season: Season, zone: &str) -> bool {
        self.excluded
            .iter()
            .any(|e| e.season == season && e.zone == zone)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.date_start > self.date_end {
            return Err(format!(
                "date_start {} is after date_end {}",
                self.date_start, self.date_end
            ));
        }
        if self.seasons.is_empty() {
            return Err("at least one season is required".to_string());
        }
        Ok(())
    }
}

/// Parameters of stratified batch sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Column whose values are the classes.
    pub y_column: LabelColumn,
    /// Classes to draw, in draw order.
    pub label_values: Vec<String>,
    /// Classes drawn with replacement across passes. Absent classes are not
    /// oversampled.
    pub oversample: BTreeMap<String, bool>,
    /// Seed of every per-class draw and of the shuffle.
    pub seed: u64,
    /// Fetch workers; `None` uses every core.
    pub parallelism: Option<usize>,
    /// Consecutive passes without a usable sample before giving up.
    pub max_failed_passes: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let label_values: Vec<String> = DangerLevel::ALL
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();
        let oversample = DangerLevel::ALL
            .iter()
            .map(|d| {
                let over = matches!(d, DangerLevel::Low | DangerLevel::High);
                (d.as_str().to_string(), over)
            })
            .collect();
        Self {
            y_column: LabelColumn::default(),
            label_values,
            oversample,
            seed: 1,
            parallelism: None,
            max_failed_passes: 10,
        }
    }
}

impl SamplerConfig {
    pub fn is_oversampled(&self, value: &str) -> bool {
        self.oversample.get(value).copied().unwrap_or(false)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.label_values.is_empty() {
            return Err("label_values must not be empty".to_string());
        }
        if self.parallelism == Some(0) {
            return Err("parallelism must be > 0".to_string());
        }
        if self.max_failed_passes == 0 {
            return Err("max_failed_passes must be > 0".to_string());
        }
        Ok(())
    }
}

/// Size of streamed batches (`X_<split>_<i>.zarr`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub total_rows: usize,
    pub batch_size: usize,
    pub lookback_days: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            total_rows: 6400,
            batch_size: 64,
            lookback_days: 14,
        }
    }
}

impl StreamConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.lookback_days == 0 {
            return Err("batch_size and lookback_days must be > 0".to_string());
        }
        Ok(())
    }
}

/// Shape of one pre-allocated disk-backed tensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemmapConfig {
    pub num_variables: usize,
    pub num_rows: usize,
    pub lookback_days: usize,
    /// Rows sampled and written per chunk.
    pub inner_batch_size: usize,
    /// Continue from an existing checkpoint and scratch file.
    pub resume: bool,
}

impl Default for MemmapConfig {
    fn default() -> Self {
        Self {
            num_variables: 1131,
            num_rows: 10000,
            lookback_days: 180,
            inner_batch_size: 500,
            resume: false,
        }
    }
}

impl MemmapConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_variables == 0 || self.num_rows == 0 || self.lookback_days == 0 {
            return Err("num_variables, num_rows and lookback_days must be > 0".to_string());
        }
        if self.inner_batch_size == 0 {
            return Err("inner_batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// End-to-end generation of train and test tensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub num_train_files: usize,
    pub num_test_files: usize,
    pub num_train_rows_per_file: usize,
    pub num_test_rows_per_file: usize,
    pub num_variables: usize,
    pub lookback_days: usize,
    pub inner_batch_size: usize,
    /// Lookback of the batch drawn to write the variable manifest.
    pub manifest_lookback_days: usize,
    /// Size of the batch drawn to write the variable manifest.
    pub manifest_batch_size: usize,
    pub resume: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        let memmap = MemmapConfig::default();
        Self {
            num_train_files: 1,
            num_test_files: 1,
            num_train_rows_per_file: 10000,
            num_test_rows_per_file: 500,
            num_variables: memmap.num_variables,
            lookback_days: memmap.lookback_days,
            inner_batch_size: memmap.inner_batch_size,
            manifest_lookback_days: 7,
            manifest_batch_size: 4,
            resume: false,
        }
    }
}

impl GenerateConfig {
    /// Per-file tensor configuration for `rows` rows.
    pub fn memmap(&self, rows: usize) -> MemmapConfig {
        MemmapConfig {
            num_variables: self.num_variables,
            num_rows: rows,
            lookback_days: self.lookback_days,
            inner_batch_size: self.inner_batch_size,
            resume: self.resume,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_train_files + self.num_test_files == 0 {
            return Err("at least one output file is required".to_string());
        }
        if self.manifest_batch_size == 0 || self.manifest_lookback_days == 0 {
            return Err("manifest batch size and lookback must be > 0".to_string());
        }
        self.memmap(self.num_train_rows_per_file.max(1)).validate()
    }
}
