//! Configuration loader for prep-ml.
//!
//! One YAML file holds the data paths and every pipeline section. All
//! sections except `paths` are optional and fall back to the library
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use feature_grid::ZarrWriterConfig;
use ml_prep::{GenerateConfig, LabelJoinConfig, MemmapConfig, SamplerConfig, StreamConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub labels: LabelJoinConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub memmap: MemmapConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub zarr: ZarrWriterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Forecast archive CSV.
    pub label_source: PathBuf,
    /// Root of the `<season>/<area>/Region_<zone>.zarr` partitions.
    pub feature_root: PathBuf,
    /// Grid-point cache and saved label pools.
    pub processed_dir: PathBuf,
    /// Generated tensors and label tables.
    pub ml_dir: PathBuf,
}

/// Load and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PrepConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

    let config: PrepConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {:?}", path.as_ref()))?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &PrepConfig) -> Result<()> {
    anyhow::ensure!(
        !config.paths.ml_dir.as_os_str().is_empty(),
        "paths.ml_dir cannot be empty"
    );
    anyhow::ensure!(
        !config.paths.processed_dir.as_os_str().is_empty(),
        "paths.processed_dir cannot be empty"
    );

    let sections = [
        ("labels", config.labels.validate()),
        ("sampler", config.sampler.validate()),
        ("stream", config.stream.validate()),
        ("memmap", config.memmap.validate()),
        ("generate", config.generate.validate()),
        ("zarr", config.zarr.validate()),
    ];
    for (name, result) in sections {
        if let Err(e) = result {
            anyhow::bail!("Invalid {} config: {}", name, e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("prep-ml.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
paths:
  label_source: /data/labels.csv
  feature_root: /data/zarr
  processed_dir: /data/processed
  ml_dir: /data/ml
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.sampler.seed, 1);
        assert_eq!(config.memmap.num_variables, 1131);
        assert_eq!(config.stream.batch_size, 64);
        assert_eq!(config.labels.seasons.len(), 4);
    }

    #[test]
    fn test_sections_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
paths:
  label_source: labels.csv
  feature_root: zarr
  processed_dir: processed
  ml_dir: ml
labels:
  train_test_cutoff: 2018-11-01
  seasons: ["16-17", "17-18"]
  trend_band: near_treeline
sampler:
  y_column: Day1DangerNearTreelineWithTrend
  label_values: [Low_Flat, High_Rising]
  oversample:
    High_Rising: true
  parallelism: 4
memmap:
  num_variables: 12
  lookback_days: 30
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.labels.seasons.len(), 2);
        assert_eq!(config.sampler.label_values, vec!["Low_Flat", "High_Rising"]);
        assert!(config.sampler.is_oversampled("High_Rising"));
        assert!(!config.sampler.is_oversampled("Low_Flat"));
        assert_eq!(config.sampler.y_column.to_string(), "Day1DangerNearTreelineWithTrend");
        assert_eq!(config.memmap.num_variables, 12);
        assert_eq!(config.memmap.num_rows, 10000);
    }

    #[test]
    fn test_invalid_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
paths:
  label_source: labels.csv
  feature_root: zarr
  processed_dir: processed
  ml_dir: ml
memmap:
  inner_batch_size: 0
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("memmap"));
    }

    #[test]
    fn test_unknown_label_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
paths:
  label_source: labels.csv
  feature_root: zarr
  processed_dir: processed
  ml_dir: ml
sampler:
  y_column: Day2Danger
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
