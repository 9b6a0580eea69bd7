//! Forecast-archive fixtures.
//!
//! The real archive has dozens of columns; only a handful are read. The
//! writer here adds a few opaque columns so tests cover that they are
//! ignored.

use std::path::Path;

use chrono::NaiveDate;

/// One archive row.
#[derive(Debug, Clone)]
pub struct ArchiveRow {
    pub date: NaiveDate,
    /// Region name as spelled in the archive (e.g. "Cascade West - North").
    pub region: String,
    pub below: String,
    pub near: String,
    pub above: String,
}

impl ArchiveRow {
    /// Row with the same danger in every band.
    pub fn uniform(date: NaiveDate, region: &str, danger: &str) -> Self {
        Self {
            date,
            region: region.to_string(),
            below: danger.to_string(),
            near: danger.to_string(),
            above: danger.to_string(),
        }
    }
}

const HEADER: [&str; 8] = [
    "Day1Date",
    "UnifiedRegion",
    "Day1DangerBelowTreeline",
    "Day1DangerNearTreeline",
    "Day1DangerAboveTreeline",
    "SpecialStatement",
    "Day1Danger_OctagonAboveTreelineNorth",
    "image_urls",
];

/// Write `rows` as a forecast-archive CSV.
pub fn write_archive(path: &Path, rows: &[ArchiveRow]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(HEADER).unwrap();
    for row in rows {
        let date = row.date.format("%Y%m%d").to_string();
        writer
            .write_record([
                date.as_str(),
                row.region.as_str(),
                row.below.as_str(),
                row.near.as_str(),
                row.above.as_str(),
                "Watch for wind slabs, cornices",
                "",
                "https://example.org/a.png",
            ])
            .unwrap();
    }
    writer.flush().unwrap();
}

/// Cycle through the four danger levels, one row per day from `start`.
pub fn daily_rows(region: &str, start: NaiveDate, days: usize) -> Vec<ArchiveRow> {
    const LEVELS: [&str; 4] = ["Low", "Moderate", "Considerable", "High"];
    (0..days)
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            ArchiveRow::uniform(date, region, LEVELS[i % LEVELS.len()])
        })
        .collect()
}
