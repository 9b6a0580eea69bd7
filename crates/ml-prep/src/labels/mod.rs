//! Label preparation: from the forecast archive to train/test pools.
//!
//! ```text
//! archive CSV ──► load_labels ──► augment_trends ──┐
//!                                                  ├──► left_join ──► date filter ──► train / test
//! feature store ──► resolve_grid_points (cached) ──┘
//! ```

mod grid_points;
mod persist;
mod records;

pub use grid_points::{read_grid_points, resolve_grid_points, write_grid_points};
pub use persist::{
    load_split, read_pool, read_sample_ids, save_split, split_path, write_pool,
    write_sample_labels,
};
pub use records::{augment_trends, load_labels, LabelRecord};

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::info;

use avy_common::RegionCatalog;
use feature_grid::{FeatureStore, GridPoint};

use crate::config::LabelJoinConfig;
use crate::error::{PrepError, Result};
use crate::pool::{LabelPool, LabeledPoint};

/// File name of the grid-point cache.
pub const GRID_POINT_CACHE: &str = "lat_lon_union.csv";

/// Train and test pools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSplit {
    pub train: LabelPool,
    pub test: LabelPool,
}

/// One row of the grid-point/label join.
#[derive(Debug, Clone)]
pub struct JoinedRow<'a> {
    pub point: &'a GridPoint,
    /// `None` when the point's zone has no labels at all.
    pub label: Option<&'a LabelRecord>,
}

/// Left join of grid points to labels on zone.
///
/// Every point appears at least once; a point whose zone has no labels
/// appears exactly once with no label.
pub fn left_join<'a>(points: &'a [GridPoint], labels: &'a [LabelRecord]) -> Vec<JoinedRow<'a>> {
    let mut by_zone: HashMap<&str, Vec<&LabelRecord>> = HashMap::new();
    for label in labels {
        by_zone.entry(label.zone.as_str()).or_default().push(label);
    }

    let mut rows = Vec::new();
    for point in points {
        match by_zone.get(point.zone.as_str()) {
            Some(matches) => rows.extend(matches.iter().map(|label| JoinedRow {
                point,
                label: Some(*label),
            })),
            None => rows.push(JoinedRow { point, label: None }),
        }
    }
    rows
}

fn labeled_point(point: &GridPoint, label: &LabelRecord) -> LabeledPoint {
    LabeledPoint {
        id: 0,
        date: label.date,
        zone: point.zone.clone(),
        season: label.season,
        latitude: point.latitude,
        longitude: point.longitude,
        danger_below_treeline: label.danger_below_treeline.clone(),
        danger_near_treeline: label.danger_near_treeline.clone(),
        danger_above_treeline: label.danger_above_treeline.clone(),
        trend: label.trend,
        trend_label: label.trend_label.clone(),
    }
}

/// Filter joined rows to `[date_start, date_end]` and split them at the
/// cutoff. Rows without a label carry no date and are dropped here.
///
/// Both halves are sorted canonically; ids run across train then test.
pub fn split_joined(rows: &[JoinedRow<'_>], config: &LabelJoinConfig) -> LabelSplit {
    let mut train = Vec::new();
    let mut test = Vec::new();

    for row in rows {
        let Some(label) = row.label else {
            continue;
        };
        if label.date < config.date_start || label.date > config.date_end {
            continue;
        }
        let point = labeled_point(row.point, label);
        if label.date <= config.train_test_cutoff {
            train.push(point);
        } else {
            test.push(point);
        }
    }

    train.sort_by(|a, b| a.canonical_cmp(b));
    test.sort_by(|a, b| a.canonical_cmp(b));
    for (id, point) in train.iter_mut().chain(test.iter_mut()).enumerate() {
        point.id = id as u64;
    }

    LabelSplit {
        train: LabelPool::new(train),
        test: LabelPool::new(test),
    }
}

/// Build the train/test pools from the label archive and the feature store.
///
/// # Arguments
/// * `label_source` - Forecast archive CSV
/// * `store` - Feature store probed for grid points
/// * `cache_dir` - Directory holding the grid-point cache
/// * `config` - Date window, seasons, exclusions and probe settings
pub fn build_label_split<S: FeatureStore + ?Sized>(
    label_source: &Path,
    store: &S,
    cache_dir: &Path,
    config: &LabelJoinConfig,
) -> Result<LabelSplit> {
    config.validate().map_err(PrepError::InvalidConfig)?;
    let catalog = RegionCatalog::new();

    let records = load_labels(label_source, &catalog, config)?;
    let records = augment_trends(records, config.trend_band)?;

    let zones: Vec<String> = records
        .iter()
        .map(|r| r.zone.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let points = resolve_grid_points(
        store,
        &catalog,
        &zones,
        config.probe_season,
        config.probe_date,
        &cache_dir.join(GRID_POINT_CACHE),
        config.overwrite_cache,
    )?;

    let joined = left_join(&points, &records);
    let split = split_joined(&joined, config);

    info!(
        labels = records.len(),
        grid_points = points.len(),
        joined = joined.len(),
        train = split.train.len(),
        test = split.test.len(),
        "Built label split"
    );

    Ok(split)
}
