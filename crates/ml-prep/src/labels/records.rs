//! Forecast-archive label loading and trend augmentation.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use avy_common::{parse_label_date, season_of, DangerLevel, ElevationBand, RegionCatalog, Season, Trend};

use crate::config::LabelJoinConfig;
use crate::error::{PrepError, Result};

/// One daily forecast for one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub date: NaiveDate,
    /// Catalog zone name.
    pub zone: String,
    pub season: Season,
    pub danger_below_treeline: Option<String>,
    pub danger_near_treeline: Option<String>,
    pub danger_above_treeline: Option<String>,
    pub trend: Trend,
    pub trend_label: Option<String>,
}

impl LabelRecord {
    pub fn danger(&self, band: ElevationBand) -> Option<&str> {
        match band {
            ElevationBand::BelowTreeline => self.danger_below_treeline.as_deref(),
            ElevationBand::NearTreeline => self.danger_near_treeline.as_deref(),
            ElevationBand::AboveTreeline => self.danger_above_treeline.as_deref(),
        }
    }
}

/// Columns read from the archive; everything else is ignored.
#[derive(Debug, Deserialize)]
struct ArchiveRow {
    #[serde(rename = "Day1Date")]
    date: String,
    #[serde(rename = "UnifiedRegion")]
    region: String,
    #[serde(rename = "Day1DangerBelowTreeline", default)]
    below: Option<String>,
    #[serde(rename = "Day1DangerNearTreeline", default)]
    near: Option<String>,
    #[serde(rename = "Day1DangerAboveTreeline", default)]
    above: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load labels, keeping only catalog zones in the configured seasons.
///
/// Rows whose region is not in the catalog, whose date cannot be parsed or
/// falls outside every season, or that match an exclusion are dropped.
/// Trends are not yet computed.
pub fn load_labels(
    path: &Path,
    catalog: &RegionCatalog,
    config: &LabelJoinConfig,
) -> Result<Vec<LabelRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PrepError::LabelRead(format!("{}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    let mut unknown_zone = 0usize;
    let mut bad_date = 0usize;
    let mut filtered = 0usize;
    let mut total = 0usize;

    // Byte records so free-text columns need not be UTF-8.
    let headers = reader.byte_headers()?.clone();
    let mut raw = csv::ByteRecord::new();
    while reader.read_byte_record(&mut raw)? {
        let row: ArchiveRow = raw.deserialize(Some(&headers))?;
        total += 1;

        let zone = match catalog.normalize_zone_name(&row.region) {
            Ok(zone) => zone,
            Err(_) => {
                unknown_zone += 1;
                continue;
            }
        };

        let date = match parse_label_date(&row.date) {
            Ok(date) => date,
            Err(e) => {
                debug!(error = %e, "Skipping label row");
                bad_date += 1;
                continue;
            }
        };

        let season = match season_of(date) {
            Some(season) if config.seasons.contains(&season) => season,
            _ => {
                filtered += 1;
                continue;
            }
        };

        if config.is_excluded(season, zone) {
            filtered += 1;
            continue;
        }

        records.push(LabelRecord {
            date,
            zone: zone.to_string(),
            season,
            danger_below_treeline: non_blank(row.below),
            danger_near_treeline: non_blank(row.near),
            danger_above_treeline: non_blank(row.above),
            trend: Trend::Unknown,
            trend_label: None,
        });
    }

    if unknown_zone > 0 || bad_date > 0 {
        warn!(
            path = %path.display(),
            unknown_zone,
            bad_date,
            "Dropped label rows that could not be resolved"
        );
    }

    info!(
        path = %path.display(),
        total,
        kept = records.len(),
        filtered,
        "Loaded labels"
    );

    Ok(records)
}

/// Compute the day-over-day trend of `band` within every (zone, season).
///
/// The first forecast of a zone/season is `Initial`; later ones compare
/// with the previous forecast by date. Output is grouped by zone and
/// season, each group sorted by date.
pub fn augment_trends(records: Vec<LabelRecord>, band: ElevationBand) -> Result<Vec<LabelRecord>> {
    let before = records.len();

    let mut groups: BTreeMap<(String, Season), Vec<LabelRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.zone.clone(), record.season))
            .or_default()
            .push(record);
    }

    let mut out = Vec::with_capacity(before);
    for (_, mut group) in groups {
        group.sort_by_key(|r| r.date);

        let mut previous: Option<Option<u8>> = None;
        for mut record in group {
            let current = record
                .danger(band)
                .and_then(DangerLevel::parse)
                .map(|d| d.ordinal());

            record.trend = match previous {
                None => Trend::Initial,
                Some(prev) => Trend::between(prev, current),
            };
            record.trend_label = record
                .danger(band)
                .map(|base| format!("{}{}", base, record.trend.suffix()));

            previous = Some(current);
            out.push(record);
        }
    }

    if out.len() != before {
        return Err(PrepError::JoinCountMismatch {
            before,
            after: out.len(),
        });
    }

    Ok(out)
}
