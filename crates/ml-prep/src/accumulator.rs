//! Out-of-core accumulation of sampled batches.
//!
//! Two output modes:
//!
//! - **Streaming**: every batch becomes its own `X_<split>_<i>.zarr` tensor
//!   and `y_<split>_<i>.csv` label table.
//! - **Disk-backed**: one pre-allocated `X<split>_batch_<b>_on_disk.npy`
//!   filled chunk by chunk through a memory map, with a label table per
//!   chunk. The array is written under a `.partial` name and renamed once
//!   complete; a checkpoint after every chunk lets an interrupted run
//!   resume.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use ndarray::{s, ArrayViewMut3, Dim};
use ndarray_npy::{write_zeroed_npy, ViewMutNpyExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use feature_grid::{SeriesSource, ZarrWriter, ZarrWriterConfig};

use crate::batch::Batch;
use crate::config::{MemmapConfig, StreamConfig};
use crate::error::{PrepError, Result};
use crate::labels::write_sample_labels;
use crate::pool::{LabelPool, Split};
use crate::sampler::BatchSampler;

/// Name of a finished disk-backed tensor.
pub fn memmap_file_name(split: Split, batch: usize) -> String {
    format!("X{}_batch_{}_on_disk.npy", split, batch)
}

fn checkpoint_file_name(split: Split, batch: usize) -> String {
    format!("checkpoint_{}_batch_{}.json", split, batch)
}

/// Path of the scratch file a tensor is written to before publishing.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Remove checkpoints and unpublished scratch tensors of `split` from `dir`.
///
/// Returns the number of files removed. Published tensors are kept.
pub fn clear_resume_state(dir: &Path, split: Split) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let checkpoint_prefix = format!("checkpoint_{}_batch_", split);
    let tensor_prefix = format!("X{}_batch_", split);

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| PrepError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let stale = (name.starts_with(&checkpoint_prefix)
            && (name.ends_with(".json") || name.ends_with(".json.partial")))
            || (name.starts_with(&tensor_prefix) && name.ends_with("_on_disk.npy.partial"));
        if stale {
            debug!(path = %entry.path().display(), "Removing stale resume state");
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Progress of one disk-backed tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub split: Split,
    pub batch: usize,
    pub shape: [usize; 3],
    pub inner_batch_size: usize,
    /// Sorted variable names of the chunks written so far.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Chunks fully written to the scratch file.
    pub completed_chunks: usize,
    /// Pool left after the completed chunks.
    pub remaining: LabelPool,
}

impl Checkpoint {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write to a temporary file and rename over `path`.
    pub fn store(&self, path: &Path) -> Result<()> {
        let tmp = partial_path(path);
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Writes sampled batches to disk.
pub struct OutOfCoreAccumulator<F> {
    sampler: BatchSampler<F>,
    output_dir: PathBuf,
    zarr: ZarrWriterConfig,
}

impl<F: SeriesSource> OutOfCoreAccumulator<F> {
    pub fn new(sampler: BatchSampler<F>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sampler,
            output_dir: output_dir.into(),
            zarr: ZarrWriterConfig::default(),
        }
    }

    /// Use a different Zarr layout for streamed batches.
    pub fn with_zarr_config(mut self, zarr: ZarrWriterConfig) -> Self {
        self.zarr = zarr;
        self
    }

    pub fn sampler(&self) -> &BatchSampler<F> {
        &self.sampler
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Draw one batch of exactly `rows` samples in canonical order.
    ///
    /// Requests below the class count are drawn at the class count and
    /// truncated.
    fn draw_exact(&self, pool: LabelPool, rows: usize, lookback_days: usize) -> Result<(Batch, LabelPool)> {
        let request = rows.max(self.sampler.config().label_values.len());
        let (mut batch, pool) = self.sampler.draw_batch(pool, request, lookback_days)?;
        batch.truncate(rows);
        batch.sort_variables();
        batch.canonicalize();
        Ok((batch, pool))
    }

    /// Stream `total_rows` samples as separate batch files.
    ///
    /// Batch `i` is written to `X_<split>_<i>.zarr` and `y_<split>_<i>.csv`.
    /// Returns the pool left after sampling.
    pub fn cache_batches(&self, pool: LabelPool, split: Split, config: &StreamConfig) -> Result<LabelPool> {
        config.validate().map_err(PrepError::InvalidConfig)?;
        fs::create_dir_all(&self.output_dir)?;
        let writer = ZarrWriter::new(self.zarr.clone())?;

        let mut pool = pool;
        for (i, start) in (0..config.total_rows).step_by(config.batch_size).enumerate() {
            let rows = config.batch_size.min(config.total_rows - start);
            info!(split = %split, rows_done = start, target = config.total_rows, "Caching batch");

            let (batch, rest) = self.draw_exact(pool, rows, config.lookback_days)?;
            pool = rest;

            let x_path = self.output_dir.join(format!("X_{}_{}.zarr", split, i));
            let y_path = self.output_dir.join(format!("y_{}_{}.csv", split, i));
            let features = batch.features().as_standard_layout();
            let data = features
                .as_slice()
                .ok_or_else(|| PrepError::shape_mismatch("contiguous tensor", "strided tensor"))?;
            let [n, v, d] = [batch.len(), batch.n_variables(), batch.lookback_days()];
            writer.write_tensor(&x_path, [n, v, d], batch.variables(), &batch.sample_ids(), data)?;
            write_sample_labels(&y_path, batch.labels())?;

            debug!(x = %x_path.display(), y = %y_path.display(), samples = n, "Wrote batch");
        }

        Ok(pool)
    }

    /// Fill one pre-allocated `[num_rows, num_variables, lookback_days]`
    /// tensor, `inner_batch_size` rows at a time.
    ///
    /// Writes `X<split>_batch_<batch>_on_disk.npy` and one
    /// `y_<split>_batch_<batch>_<chunk>.csv` per chunk. Returns the pool left
    /// after sampling.
    pub fn create_memmapped(
        &self,
        pool: LabelPool,
        split: Split,
        config: &MemmapConfig,
        batch: usize,
    ) -> Result<LabelPool> {
        config.validate().map_err(PrepError::InvalidConfig)?;
        fs::create_dir_all(&self.output_dir)?;

        let final_path = self.output_dir.join(memmap_file_name(split, batch));
        let scratch_path = partial_path(&final_path);
        let checkpoint_path = self.output_dir.join(checkpoint_file_name(split, batch));
        let shape = [config.num_rows, config.num_variables, config.lookback_days];

        let (mut pool, mut variables, first_chunk) = match self.resume_state(config, &checkpoint_path, &scratch_path, shape)? {
            Some(checkpoint) => {
                info!(
                    split = %split,
                    batch,
                    completed_chunks = checkpoint.completed_chunks,
                    "Resuming from checkpoint"
                );
                let variables = Some(checkpoint.variables).filter(|v| !v.is_empty());
                (checkpoint.remaining, variables, checkpoint.completed_chunks)
            }
            None => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&scratch_path)?;
                write_zeroed_npy::<f32, _>(&file, Dim(shape))
                    .map_err(PrepError::npy)?;
                (pool, None, 0)
            }
        };

        let file = OpenOptions::new().read(true).write(true).open(&scratch_path)?;
        // SAFETY: the scratch file is private to this call until it is renamed.
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };

        let chunks = config.num_rows.div_ceil(config.inner_batch_size);
        for chunk in first_chunk..chunks {
            let start = chunk * config.inner_batch_size;
            let rows = config.inner_batch_size.min(config.num_rows - start);
            info!(
                split = %split,
                batch,
                rows_done = start,
                target = config.num_rows,
                "Filling disk-backed tensor"
            );

            let (chunk_batch, rest) = self.draw_exact(pool, rows, config.lookback_days)?;
            pool = rest;

            if chunk_batch.n_variables() != config.num_variables
                || chunk_batch.lookback_days() != config.lookback_days
            {
                return Err(PrepError::shape_mismatch(
                    format!("{} variables x {} days", config.num_variables, config.lookback_days),
                    format!(
                        "{} variables x {} days",
                        chunk_batch.n_variables(),
                        chunk_batch.lookback_days()
                    ),
                ));
            }
            let expected = variables.get_or_insert_with(|| chunk_batch.variables().to_vec());
            if expected.as_slice() != chunk_batch.variables() {
                return Err(PrepError::shape_mismatch(
                    format!("variables {:?}", expected),
                    format!("variables {:?}", chunk_batch.variables()),
                ));
            }

            {
                let mut view = ArrayViewMut3::<f32>::view_mut_npy(&mut mmap).map_err(PrepError::npy)?;
                view.slice_mut(s![start..start + rows, .., ..])
                    .assign(chunk_batch.features());
            }
            mmap.flush()?;

            let y_path = self
                .output_dir
                .join(format!("y_{}_batch_{}_{}.csv", split, batch, chunk));
            write_sample_labels(&y_path, chunk_batch.labels())?;

            Checkpoint {
                split,
                batch,
                shape,
                inner_batch_size: config.inner_batch_size,
                variables: chunk_batch.variables().to_vec(),
                completed_chunks: chunk + 1,
                remaining: pool.clone(),
            }
            .store(&checkpoint_path)?;
        }

        drop(mmap);
        drop(file);
        fs::rename(&scratch_path, &final_path)?;
        if checkpoint_path.exists() {
            fs::remove_file(&checkpoint_path)?;
        }

        info!(
            split = %split,
            batch,
            path = %final_path.display(),
            rows = config.num_rows,
            remaining = pool.len(),
            "Published disk-backed tensor"
        );

        Ok(pool)
    }

    /// Checkpoint to resume from, if resuming is requested and possible.
    fn resume_state(
        &self,
        config: &MemmapConfig,
        checkpoint_path: &Path,
        scratch_path: &Path,
        shape: [usize; 3],
    ) -> Result<Option<Checkpoint>> {
        if !config.resume {
            return Ok(None);
        }
        if !checkpoint_path.is_file() || !scratch_path.is_file() {
            warn!(
                checkpoint = %checkpoint_path.display(),
                "No resumable state found, starting over"
            );
            return Ok(None);
        }

        let checkpoint = Checkpoint::load(checkpoint_path)?;
        if checkpoint.shape != shape || checkpoint.inner_batch_size != config.inner_batch_size {
            return Err(PrepError::shape_mismatch(
                format!("{:?} in chunks of {}", shape, config.inner_batch_size),
                format!(
                    "checkpoint {:?} in chunks of {}",
                    checkpoint.shape, checkpoint.inner_batch_size
                ),
            ));
        }
        Ok(Some(checkpoint))
    }
}
