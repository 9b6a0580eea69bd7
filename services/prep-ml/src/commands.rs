//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use feature_grid::{PointSeriesFetcher, ZarrFeatureStore};
use ml_prep::labels::{read_pool, split_path, write_pool};
use ml_prep::{
    build_label_split, clear_resume_state, discover_batch_files, generate_train_test, load_split, merge,
    save_split, BatchSampler, LabelPool, OutOfCoreAccumulator, Split, MERGED_FILE_NAME,
};

use crate::config_loader::{PathsConfig, PrepConfig};

type Accumulator = OutOfCoreAccumulator<PointSeriesFetcher<ZarrFeatureStore>>;

fn accumulator(config: &PrepConfig) -> Result<Accumulator> {
    let fetcher = PointSeriesFetcher::new(ZarrFeatureStore::new(&config.paths.feature_root));
    let sampler = BatchSampler::new(fetcher, config.sampler.clone())?;
    Ok(OutOfCoreAccumulator::new(sampler, &config.paths.ml_dir).with_zarr_config(config.zarr.clone()))
}

/// Pool file holding what a split has left after sampling.
fn remaining_path(dir: &Path, split: Split) -> PathBuf {
    dir.join(format!("{}_remaining.csv", split))
}

/// Pool to sample from: the remaining pool when present, else the full split.
fn load_pool(dir: &Path, split: Split) -> Result<LabelPool> {
    let remaining = remaining_path(dir, split);
    let path = if remaining.is_file() {
        remaining
    } else {
        split_path(dir, split)
    };
    let pool = read_pool(&path).with_context(|| format!("Failed to read label pool {:?}", path))?;
    info!(path = %path.display(), rows = pool.len(), "Loaded label pool");
    Ok(pool)
}

fn save_remaining(dir: &Path, split: Split, pool: &LabelPool) -> Result<()> {
    let path = remaining_path(dir, split);
    write_pool(&path, pool).with_context(|| format!("Failed to write label pool {:?}", path))?;
    info!(path = %path.display(), rows = pool.len(), "Saved remaining label pool");
    Ok(())
}

/// Drop sampling progress made against a previous label split.
fn reset_sampling_state(paths: &PathsConfig) -> Result<()> {
    for split in [Split::Train, Split::Test] {
        let stale = remaining_path(&paths.processed_dir, split);
        if stale.is_file() {
            std::fs::remove_file(&stale)?;
        }
        let cleared = clear_resume_state(&paths.ml_dir, split)
            .with_context(|| format!("Failed to clear {} checkpoints in {:?}", split, paths.ml_dir))?;
        if cleared > 0 {
            info!(split = %split, files = cleared, "Removed stale checkpoints");
        }
    }
    Ok(())
}

pub fn labels(config: &PrepConfig, overwrite_cache: bool) -> Result<()> {
    let mut join = config.labels.clone();
    join.overwrite_cache |= overwrite_cache;

    let store = ZarrFeatureStore::new(&config.paths.feature_root);
    let split = build_label_split(
        &config.paths.label_source,
        &store,
        &config.paths.processed_dir,
        &join,
    )
    .context("Failed to build label split")?;

    save_split(&config.paths.processed_dir, &split).context("Failed to save label split")?;
    reset_sampling_state(&config.paths)?;

    info!(train = split.train.len(), test = split.test.len(), "Saved label split");
    Ok(())
}

pub fn cache_batches(config: &PrepConfig, split: Split) -> Result<()> {
    let pool = load_pool(&config.paths.processed_dir, split)?;
    let remaining = accumulator(config)?
        .cache_batches(pool, split, &config.stream)
        .with_context(|| format!("Failed to cache {} batches", split))?;
    save_remaining(&config.paths.processed_dir, split, &remaining)
}

pub fn memmap(config: &PrepConfig, split: Split, batch: usize, resume: bool) -> Result<()> {
    let pool = load_pool(&config.paths.processed_dir, split)?;
    let mut memmap = config.memmap.clone();
    memmap.resume |= resume;

    let remaining = accumulator(config)?
        .create_memmapped(pool, split, &memmap, batch)
        .with_context(|| format!("Failed to create {} tensor {}", split, batch))?;
    save_remaining(&config.paths.processed_dir, split, &remaining)
}

pub fn merge_tensors(config: &PrepConfig, output: Option<PathBuf>) -> Result<()> {
    let files = discover_batch_files(&config.paths.ml_dir)?;
    anyhow::ensure!(
        !files.is_empty(),
        "No disk-backed tensors found in {:?}",
        config.paths.ml_dir
    );

    let output = output.unwrap_or_else(|| config.paths.ml_dir.join(MERGED_FILE_NAME));
    let result = merge(
        &files,
        config.memmap.num_variables,
        config.memmap.lookback_days,
        &output,
    )
    .context("Failed to merge tensors")?;

    info!(output = %result.output.display(), shape = ?result.shape, "Merge complete");
    Ok(())
}

pub fn generate(config: &PrepConfig) -> Result<()> {
    let split = load_split(&config.paths.processed_dir).context("Failed to load label split")?;
    let result = generate_train_test(&accumulator(config)?, split.train, split.test, &config.generate)
        .context("Failed to generate train/test tensors")?;

    save_remaining(&config.paths.processed_dir, Split::Train, &result.train)?;
    save_remaining(&config.paths.processed_dir, Split::Test, &result.test)?;
    info!(
        files = result.files.len(),
        output = %result.merged.output.display(),
        shape = ?result.merged.shape,
        "Generation complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_reset_sampling_state() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            label_source: dir.path().join("labels.csv"),
            feature_root: dir.path().join("zarr"),
            processed_dir: dir.path().join("processed"),
            ml_dir: dir.path().join("ml"),
        };
        std::fs::create_dir_all(&paths.processed_dir).unwrap();
        std::fs::create_dir_all(&paths.ml_dir).unwrap();

        let stale = [
            paths.processed_dir.join("train_remaining.csv"),
            paths.processed_dir.join("test_remaining.csv"),
            paths.ml_dir.join("checkpoint_train_batch_0.json"),
            paths.ml_dir.join("checkpoint_test_batch_2.json"),
            paths.ml_dir.join("Xtrain_batch_0_on_disk.npy.partial"),
        ];
        let kept = [
            paths.processed_dir.join("train_labels.csv"),
            paths.ml_dir.join("Xtest_batch_0_on_disk.npy"),
        ];
        for path in stale.iter().chain(kept.iter()) {
            File::create(path).unwrap();
        }

        reset_sampling_state(&paths).unwrap();
        for path in &stale {
            assert!(!path.exists(), "{:?} survived", path);
        }
        for path in &kept {
            assert!(path.exists(), "{:?} removed", path);
        }
    }
}
