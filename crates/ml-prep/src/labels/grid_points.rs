//! Per-zone grid points with usable data, cached as CSV.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use avy_common::{RegionCatalog, Season};
use feature_grid::{probe_grid_points, FeatureStore, GridPoint, PartitionKey};

use crate::error::Result;

/// Resolve the grid points of `zones`, reading `cache_path` when present.
///
/// On a cache miss (or with `overwrite`) every zone's partition for
/// `probe_season` is probed on the time step nearest `probe_date` and the
/// union is written to `cache_path` as `zone,latitude,longitude`. A zone
/// whose probe partition is missing fails the whole resolution.
pub fn resolve_grid_points<S: FeatureStore + ?Sized>(
    store: &S,
    catalog: &RegionCatalog,
    zones: &[String],
    probe_season: Season,
    probe_date: NaiveDate,
    cache_path: &Path,
    overwrite: bool,
) -> Result<Vec<GridPoint>> {
    if !overwrite && cache_path.is_file() {
        let points = read_grid_points(cache_path)?;
        info!(
            path = %cache_path.display(),
            points = points.len(),
            "Loaded cached grid points"
        );
        return Ok(points);
    }

    let mut points = Vec::new();
    for zone in zones {
        let area = catalog.area_of(zone)?;
        let key = PartitionKey::new(probe_season, area, zone.as_str());
        let partition = store.open(&key)?;
        let report = probe_grid_points(partition.as_ref(), zone, probe_date)?;
        if report.points.is_empty() {
            warn!(zone = %zone, "Zone has no grid cells with data");
        }
        points.extend(report.points);
    }

    write_grid_points(cache_path, &points)?;
    info!(
        path = %cache_path.display(),
        zones = zones.len(),
        points = points.len(),
        "Cached grid points"
    );

    Ok(points)
}

pub fn read_grid_points(path: &Path) -> Result<Vec<GridPoint>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for row in reader.deserialize() {
        points.push(row?);
    }
    Ok(points)
}

pub fn write_grid_points(path: &Path, points: &[GridPoint]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}
