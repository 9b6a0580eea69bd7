//! Class-stratified batch sampling with parallel feature fetches.
//!
//! Each pass draws up to `sample_size / n_classes` rows per class, fetches
//! their point series on a worker pool and keeps the ones that succeed.
//! Passes repeat until the batch is full.
//!
//! Rows of classes that are not oversampled leave the pool when drawn.
//! Oversampled classes stay, so the same rows may appear again in later
//! batches (and, since every per-class draw uses the same seed, in later
//! passes of the same batch).

use std::collections::HashSet;

use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use feature_grid::{PointSeries, SeriesRequest, SeriesSource};

use crate::batch::Batch;
use crate::config::SamplerConfig;
use crate::error::{PrepError, Result};
use crate::pool::{LabelPool, LabeledPoint};

/// Draws stratified batches from a [`LabelPool`].
pub struct BatchSampler<F> {
    source: F,
    config: SamplerConfig,
    workers: rayon::ThreadPool,
}

/// Samples kept so far, aligned to the first sample's variable order.
struct Accepted {
    variables: Option<Vec<String>>,
    series: Vec<Array2<f32>>,
    labels: Vec<LabeledPoint>,
}

impl Accepted {
    fn new() -> Self {
        Self {
            variables: None,
            series: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Add one fetched sample; returns false when it cannot be aligned.
    fn push(&mut self, label: LabeledPoint, series: PointSeries, lookback_days: usize) -> bool {
        if series.lookback_days() != lookback_days {
            warn!(
                sample = %label.sample_id(),
                expected = lookback_days,
                actual = series.lookback_days(),
                "Dropping sample with wrong series length"
            );
            return false;
        }

        let reference = self
            .variables
            .get_or_insert_with(|| series.variables.clone());
        let values = if *reference == series.variables {
            series.values
        } else {
            match align_variables(reference, &series) {
                Some(values) => values,
                None => {
                    warn!(
                        sample = %label.sample_id(),
                        expected = reference.len(),
                        actual = series.variables.len(),
                        "Dropping sample with a different variable set"
                    );
                    return false;
                }
            }
        };

        self.series.push(values);
        self.labels.push(label);
        true
    }

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn into_batch(self, lookback_days: usize) -> Result<Batch> {
        let variables = self.variables.unwrap_or_default();
        let mut features = Array3::<f32>::zeros((self.series.len(), variables.len(), lookback_days));
        for (mut row, values) in features.axis_iter_mut(Axis(0)).zip(&self.series) {
            row.assign(values);
        }
        Batch::new(features, variables, self.labels)
    }
}

/// Reorder `series` to `reference`'s variable order. `None` when the sets
/// differ.
fn align_variables(reference: &[String], series: &PointSeries) -> Option<Array2<f32>> {
    if reference.len() != series.variables.len() {
        return None;
    }
    let order: Option<Vec<usize>> = reference
        .iter()
        .map(|name| series.variables.iter().position(|v| v == name))
        .collect();
    Some(series.values.select(Axis(0), &order?))
}

impl<F: SeriesSource> BatchSampler<F> {
    pub fn new(source: F, config: SamplerConfig) -> Result<Self> {
        config.validate().map_err(PrepError::InvalidConfig)?;

        let threads = config.parallelism.unwrap_or_else(rayon::current_num_threads);
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fetch-{}", i))
            .build()
            .map_err(|e| PrepError::invalid_config(format!("failed to create worker pool: {}", e)))?;

        Ok(Self {
            source,
            config,
            workers,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    /// Draw a batch of at least `batch_size` samples of `lookback_days`.
    ///
    /// The batch can exceed `batch_size` by up to `n_classes - 1` samples;
    /// callers needing an exact size truncate. Returns the batch and the
    /// pool left after removing drawn rows of non-oversampled classes.
    ///
    /// # Errors
    /// * `EmptyClassDraw` when a pass finds no row in any class
    /// * `FetchStalled` after `max_failed_passes` passes without a usable
    ///   sample
    pub fn draw_batch(
        &self,
        pool: LabelPool,
        batch_size: usize,
        lookback_days: usize,
    ) -> Result<(Batch, LabelPool)> {
        let n_classes = self.config.label_values.len();
        if batch_size < n_classes {
            return Err(PrepError::invalid_config(format!(
                "batch_size {} is smaller than the {} classes drawn",
                batch_size, n_classes
            )));
        }
        if lookback_days == 0 {
            return Err(PrepError::invalid_config("lookback_days must be > 0"));
        }

        let column = self.config.y_column;
        let mut pool = pool;
        let mut accepted = Accepted::new();
        let mut failed_passes = 0usize;
        let mut pass = 0u64;

        while accepted.len() < batch_size {
            let sample_size = if pass == 0 {
                batch_size
            } else {
                (batch_size - accepted.len()).max(n_classes)
            };
            let per_class = sample_size / n_classes;

            let mut drawn = Vec::new();
            for value in &self.config.label_values {
                let candidates: Vec<usize> = pool
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| column.value(p) == Some(value.as_str()))
                    .map(|(i, _)| i)
                    .collect();

                let size = per_class.min(candidates.len());
                debug!(class = %value, available = candidates.len(), size, "Drawing class");
                if size == 0 {
                    continue;
                }

                let mut rng = StdRng::seed_from_u64(self.config.seed);
                let picked: Vec<LabeledPoint> =
                    rand::seq::index::sample(&mut rng, candidates.len(), size)
                        .iter()
                        .map(|i| pool.rows()[candidates[i]].clone())
                        .collect();

                if !self.config.is_oversampled(value) {
                    let ids: HashSet<u64> = picked.iter().map(|p| p.id).collect();
                    pool.remove_ids(&ids);
                }
                drawn.extend(picked);
            }

            if drawn.is_empty() {
                return Err(PrepError::EmptyClassDraw {
                    column: column.name(),
                    classes: self.config.label_values.clone(),
                    have: accepted.len(),
                    wanted: batch_size,
                });
            }

            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(pass));
            drawn.shuffle(&mut rng);

            let fetched = self.fetch_all(&drawn, lookback_days);

            let mut kept = 0usize;
            for (label, result) in drawn.into_iter().zip(fetched) {
                match result {
                    Ok(series) => {
                        if accepted.push(label, series, lookback_days) {
                            kept += 1;
                        }
                    }
                    Err(e) if e.is_per_sample() => {
                        warn!(sample = %label.sample_id(), error = %e, "Dropping sample after failed fetch");
                    }
                    Err(e) => return Err(PrepError::Fetch(e)),
                }
            }

            if kept == 0 {
                failed_passes += 1;
                if failed_passes >= self.config.max_failed_passes {
                    return Err(PrepError::FetchStalled {
                        passes: failed_passes,
                        have: accepted.len(),
                        wanted: batch_size,
                    });
                }
            } else {
                failed_passes = 0;
            }

            pass += 1;
            if accepted.len() < batch_size {
                info!(have = accepted.len(), wanted = batch_size, "Filling remaining samples");
            }
        }

        debug!(
            samples = accepted.len(),
            passes = pass,
            remaining = pool.len(),
            "Drew batch"
        );

        let batch = accepted.into_batch(lookback_days)?;
        Ok((batch, pool))
    }

    /// Fetch every drawn row on the worker pool, preserving order.
    fn fetch_all(
        &self,
        drawn: &[LabeledPoint],
        lookback_days: usize,
    ) -> Vec<feature_grid::Result<PointSeries>> {
        self.workers.install(|| {
            drawn
                .par_iter()
                .map(|p| {
                    self.source.fetch(&SeriesRequest {
                        zone: p.zone.clone(),
                        latitude: p.latitude,
                        longitude: p.longitude,
                        lookback_days,
                        end_date: p.date,
                    })
                })
                .collect()
        })
    }
}
