//! End-to-end generation of the train/test tensors.

use std::path::{Path, PathBuf};

use tracing::info;

use feature_grid::SeriesSource;

use crate::accumulator::{memmap_file_name, OutOfCoreAccumulator};
use crate::config::GenerateConfig;
use crate::error::{PrepError, Result};
use crate::merge::{merge, MergeResult, MERGED_FILE_NAME};
use crate::pool::{LabelPool, Split};

/// File name of the variable manifest.
pub const VARIABLE_MANIFEST: &str = "FeatureLabels.csv";

/// Pools left after generation and the merged tensor.
#[derive(Debug)]
pub struct GenerateResult {
    pub train: LabelPool,
    pub test: LabelPool,
    pub files: Vec<PathBuf>,
    pub merged: MergeResult,
}

/// Write `index,variable` rows, one per tensor channel.
pub fn write_variable_manifest(path: &Path, variables: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["index", "variable"])?;
    for (i, name) in variables.iter().enumerate() {
        writer.write_record([i.to_string().as_str(), name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Generate every train file, then every test file, then merge them into
/// `X_all.npy`.
///
/// The variable manifest is written first from a small batch drawn from a
/// copy of the train pool, so it does not consume train rows. Each file
/// continues from the pool the previous file of the same split left.
pub fn generate_train_test<F: SeriesSource>(
    accumulator: &OutOfCoreAccumulator<F>,
    train: LabelPool,
    test: LabelPool,
    config: &GenerateConfig,
) -> Result<GenerateResult> {
    config.validate().map_err(PrepError::InvalidConfig)?;
    let dir = accumulator.output_dir();
    std::fs::create_dir_all(dir)?;

    let (mut manifest_batch, _) = accumulator.sampler().draw_batch(
        train.clone(),
        config.manifest_batch_size,
        config.manifest_lookback_days,
    )?;
    manifest_batch.sort_variables();
    write_variable_manifest(&dir.join(VARIABLE_MANIFEST), manifest_batch.variables())?;
    info!(variables = manifest_batch.n_variables(), "Wrote variable manifest");

    let mut files = Vec::new();

    let mut train = train;
    for i in 0..config.num_train_files {
        let memmap = config.memmap(config.num_train_rows_per_file);
        train = accumulator.create_memmapped(train, Split::Train, &memmap, i)?;
        files.push(dir.join(memmap_file_name(Split::Train, i)));
    }

    let mut test = test;
    for i in 0..config.num_test_files {
        let memmap = config.memmap(config.num_test_rows_per_file);
        test = accumulator.create_memmapped(test, Split::Test, &memmap, i)?;
        files.push(dir.join(memmap_file_name(Split::Test, i)));
    }

    let merged = merge(
        &files,
        config.num_variables,
        config.lookback_days,
        &dir.join(MERGED_FILE_NAME),
    )?;

    info!(
        files = files.len(),
        rows = merged.shape[0],
        train_remaining = train.len(),
        test_remaining = test.len(),
        "Generated train/test tensors"
    );

    Ok(GenerateResult {
        train,
        test,
        files,
        merged,
    })
}
