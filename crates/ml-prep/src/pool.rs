//! Labeled grid points and the pool they are drawn from.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use avy_common::{ElevationBand, Season, Trend};

/// One grid cell of a zone paired with that zone's forecast for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    /// Stable row key, unique within a train/test split.
    pub id: u64,
    pub date: NaiveDate,
    pub zone: String,
    pub season: Season,
    pub latitude: f64,
    pub longitude: f64,
    pub danger_below_treeline: Option<String>,
    pub danger_near_treeline: Option<String>,
    pub danger_above_treeline: Option<String>,
    pub trend: Trend,
    /// Danger of the trend band with the trend suffix, e.g. "High_Rising".
    pub trend_label: Option<String>,
}

impl LabeledPoint {
    /// Sample identifier used to align tensors with label tables.
    pub fn sample_id(&self) -> String {
        format!("{}: {}", self.date, self.zone)
    }

    pub fn danger(&self, band: ElevationBand) -> Option<&str> {
        match band {
            ElevationBand::BelowTreeline => self.danger_below_treeline.as_deref(),
            ElevationBand::NearTreeline => self.danger_near_treeline.as_deref(),
            ElevationBand::AboveTreeline => self.danger_above_treeline.as_deref(),
        }
    }

    /// Canonical ordering: date, zone, latitude, longitude.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.zone.cmp(&other.zone))
            .then_with(|| self.latitude.total_cmp(&other.latitude))
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

/// Column used as the class label when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LabelColumn {
    /// Raw danger rating of one elevation band.
    Danger(ElevationBand),
    /// Danger with trend suffix. The band is the one trends were computed on
    /// when the split was built.
    WithTrend(ElevationBand),
}

impl LabelColumn {
    const BANDS: [ElevationBand; 3] = [
        ElevationBand::BelowTreeline,
        ElevationBand::NearTreeline,
        ElevationBand::AboveTreeline,
    ];

    /// Parse a forecast-archive column name such as
    /// `Day1DangerAboveTreeline` or `Day1DangerAboveTreelineWithTrend`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BANDS.iter().find_map(|band| {
            let base = band.column();
            if name == base {
                Some(LabelColumn::Danger(*band))
            } else if name.strip_prefix(base) == Some("WithTrend") {
                Some(LabelColumn::WithTrend(*band))
            } else {
                None
            }
        })
    }

    pub fn name(&self) -> String {
        match self {
            LabelColumn::Danger(band) => band.column().to_string(),
            LabelColumn::WithTrend(band) => format!("{}WithTrend", band.column()),
        }
    }

    /// Class value of a point in this column.
    pub fn value<'a>(&self, point: &'a LabeledPoint) -> Option<&'a str> {
        match self {
            LabelColumn::Danger(band) => point.danger(*band),
            LabelColumn::WithTrend(_) => point.trend_label.as_deref(),
        }
    }
}

impl Default for LabelColumn {
    fn default() -> Self {
        LabelColumn::Danger(ElevationBand::AboveTreeline)
    }
}

impl TryFrom<String> for LabelColumn {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LabelColumn::from_name(&value).ok_or_else(|| format!("unknown label column '{}'", value))
    }
}

impl From<LabelColumn> for String {
    fn from(column: LabelColumn) -> Self {
        column.name()
    }
}

impl fmt::Display for LabelColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Which half of the dataset a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows still available for sampling.
///
/// The pool is an owned value: every sampling call consumes it and hands
/// back what is left.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPool {
    rows: Vec<LabeledPoint>,
}

impl LabelPool {
    pub fn new(rows: Vec<LabeledPoint>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabeledPoint] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LabeledPoint> {
        self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledPoint> {
        self.rows.iter()
    }

    /// Number of rows whose `column` equals `value`.
    pub fn count_class(&self, column: LabelColumn, value: &str) -> usize {
        self.rows
            .iter()
            .filter(|p| column.value(p) == Some(value))
            .count()
    }

    /// Drop every row whose id is in `ids`, keeping the order of the rest.
    pub fn remove_ids(&mut self, ids: &HashSet<u64>) {
        self.rows.retain(|p| !ids.contains(&p.id));
    }
}

impl FromIterator<LabeledPoint> for LabelPool {
    fn from_iter<I: IntoIterator<Item = LabeledPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u64, day: u32, zone: &str, lat: f64, danger: Option<&str>) -> LabeledPoint {
        LabeledPoint {
            id,
            date: NaiveDate::from_ymd_opt(2016, 1, day).unwrap(),
            zone: zone.to_string(),
            season: Season::S15_16,
            latitude: lat,
            longitude: -111.5,
            danger_below_treeline: None,
            danger_near_treeline: None,
            danger_above_treeline: danger.map(str::to_string),
            trend: Trend::Flat,
            trend_label: danger.map(|d| format!("{}_Flat", d)),
        }
    }

    #[test]
    fn test_sample_id() {
        assert_eq!(
            point(0, 3, "Logan", 41.0, None).sample_id(),
            "2016-01-03: Logan"
        );
    }

    #[test]
    fn test_canonical_order() {
        let mut rows = vec![
            point(0, 2, "Logan", 41.0, None),
            point(1, 1, "Ogden", 41.0, None),
            point(2, 1, "Logan", 41.5, None),
            point(3, 1, "Logan", 41.0, None),
        ];
        rows.sort_by(|a, b| a.canonical_cmp(b));
        let ids: Vec<u64> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_label_column_names() {
        assert_eq!(
            LabelColumn::from_name("Day1DangerAboveTreeline"),
            Some(LabelColumn::Danger(ElevationBand::AboveTreeline))
        );
        assert_eq!(
            LabelColumn::from_name("Day1DangerNearTreelineWithTrend"),
            Some(LabelColumn::WithTrend(ElevationBand::NearTreeline))
        );
        assert_eq!(LabelColumn::from_name("Day1DangerAbove"), None);
        assert_eq!(
            LabelColumn::default().name(),
            "Day1DangerAboveTreeline".to_string()
        );
    }

    #[test]
    fn test_class_counts_and_removal() {
        let mut pool = LabelPool::new(vec![
            point(0, 1, "Logan", 41.0, Some("Low")),
            point(1, 1, "Logan", 41.5, Some("High")),
            point(2, 2, "Logan", 41.0, Some("Low")),
            point(3, 2, "Logan", 41.5, None),
        ]);
        let column = LabelColumn::default();
        assert_eq!(pool.count_class(column, "Low"), 2);
        assert_eq!(
            pool.count_class(LabelColumn::WithTrend(ElevationBand::AboveTreeline), "High_Flat"),
            1
        );

        pool.remove_ids(&HashSet::from([0, 3]));
        let ids: Vec<u64> = pool.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
