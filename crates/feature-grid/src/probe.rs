//! Discovery of grid cells that carry usable data.
//!
//! Zone partitions are rectangular, but zones are not: many cells of the
//! rectangle lie outside the zone and hold only missing or zero values.
//! Probing one representative day per zone finds the cells worth sampling.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::partition::FeaturePartition;
use crate::types::GridPoint;

/// Outcome of probing one partition.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Cells with at least one non-trivial value, latitude-major.
    pub points: Vec<GridPoint>,
    /// Cells whose read failed and were skipped.
    pub skipped: usize,
    /// Cells examined.
    pub examined: usize,
}

/// A value is non-trivial when it is present and non-zero.
fn is_non_trivial(v: f32) -> bool {
    !v.is_nan() && v != 0.0
}

/// Find the cells of `partition` with non-trivial data on the time step
/// nearest to `probe_date`.
///
/// A failed read for a single cell skips that cell; it never aborts the
/// zone.
pub fn probe_grid_points(
    partition: &dyn FeaturePartition,
    zone: &str,
    probe_date: NaiveDate,
) -> Result<ProbeReport> {
    let axes = partition.axes();
    let t = axes
        .nearest_time(probe_date)
        .ok_or_else(|| FetchError::EmptyPartition(zone.to_string()))?;

    let mut report = ProbeReport::default();
    for (lat_idx, lat) in axes.latitudes.iter().enumerate() {
        for (lon_idx, lon) in axes.longitudes.iter().enumerate() {
            report.examined += 1;
            match partition.read_cell(lat_idx, lon_idx, t..t + 1) {
                Ok(values) => {
                    if values.iter().copied().any(is_non_trivial) {
                        report.points.push(GridPoint {
                            zone: zone.to_string(),
                            latitude: *lat,
                            longitude: *lon,
                        });
                    }
                }
                Err(e) => {
                    warn!(zone, lat, lon, error = %e, "Skipping grid cell after failed probe");
                    report.skipped += 1;
                }
            }
        }
    }

    debug!(
        zone,
        examined = report.examined,
        kept = report.points.len(),
        skipped = report.skipped,
        "Probed grid cells"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::MemoryPartition;
    use crate::types::PartitionAxes;
    use ndarray::Array4;
    use std::ops::Range;

    fn axes() -> PartitionAxes {
        PartitionAxes {
            variables: vec!["A".into(), "B".into()],
            latitudes: vec![40.0, 40.5],
            longitudes: vec![-111.0, -110.5],
            times: vec![NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()],
        }
    }

    #[test]
    fn test_probe_drops_missing_and_zero_cells() {
        let mut data = Array4::from_elem((1, 2, 2, 2), f32::NAN);
        // (0,0): one real value
        data[[0, 1, 0, 0]] = 3.5;
        // (0,1): only zeros
        data[[0, 0, 0, 1]] = 0.0;
        data[[0, 1, 0, 1]] = 0.0;
        // (1,1): zero plus a value
        data[[0, 0, 1, 1]] = 0.0;
        data[[0, 1, 1, 1]] = -2.0;
        let partition = MemoryPartition::new(axes(), data).unwrap();

        let report = probe_grid_points(
            &partition,
            "Moab",
            NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
        )
        .unwrap();

        assert_eq!(report.examined, 4);
        assert_eq!(report.skipped, 0);
        let cells: Vec<(f64, f64)> = report
            .points
            .iter()
            .map(|p| (p.latitude, p.longitude))
            .collect();
        assert_eq!(cells, vec![(40.0, -111.0), (40.5, -110.5)]);
        assert!(report.points.iter().all(|p| p.zone == "Moab"));
    }

    struct FlakyPartition {
        inner: MemoryPartition,
    }

    impl FeaturePartition for FlakyPartition {
        fn axes(&self) -> &PartitionAxes {
            self.inner.axes()
        }

        fn read_cell(&self, lat_idx: usize, lon_idx: usize, time: Range<usize>) -> Result<Vec<f32>> {
            if lat_idx == 0 && lon_idx == 1 {
                return Err(FetchError::read_failed("corrupt chunk"));
            }
            self.inner.read_cell(lat_idx, lon_idx, time)
        }
    }

    #[test]
    fn test_failed_cell_is_skipped() {
        let data = Array4::from_elem((1, 2, 2, 2), 1.0);
        let partition = FlakyPartition {
            inner: MemoryPartition::new(axes(), data).unwrap(),
        };
        let report = probe_grid_points(
            &partition,
            "Moab",
            NaiveDate::from_ymd_opt(2016, 3, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.points.len(), 3);
    }
}
