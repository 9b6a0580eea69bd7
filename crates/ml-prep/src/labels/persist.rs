//! CSV persistence of label pools.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::pool::{LabelPool, LabeledPoint, Split};

use super::LabelSplit;

/// Path of a split's pool file inside `dir`.
pub fn split_path(dir: &Path, split: Split) -> PathBuf {
    dir.join(format!("{}_labels.csv", split))
}

pub fn write_pool(path: &Path, pool: &LabelPool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for point in pool.iter() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_pool(path: &Path) -> Result<LabelPool> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<LabeledPoint>() {
        rows.push(row?);
    }
    Ok(LabelPool::new(rows))
}

/// Write `train_labels.csv` and `test_labels.csv` into `dir`.
pub fn save_split(dir: &Path, split: &LabelSplit) -> Result<()> {
    write_pool(&split_path(dir, Split::Train), &split.train)?;
    write_pool(&split_path(dir, Split::Test), &split.test)?;
    Ok(())
}

/// Read a split written by [`save_split`].
pub fn load_split(dir: &Path) -> Result<LabelSplit> {
    Ok(LabelSplit {
        train: read_pool(&split_path(dir, Split::Train))?,
        test: read_pool(&split_path(dir, Split::Test))?,
    })
}

/// Label table row written next to a tensor: the sample id first, then the
/// point.
#[derive(Serialize)]
struct SampleRow<'a> {
    sample: String,
    id: u64,
    date: chrono::NaiveDate,
    zone: &'a str,
    season: avy_common::Season,
    latitude: f64,
    longitude: f64,
    danger_below_treeline: Option<&'a str>,
    danger_near_treeline: Option<&'a str>,
    danger_above_treeline: Option<&'a str>,
    trend: avy_common::Trend,
    trend_label: Option<&'a str>,
}

impl<'a> From<&'a LabeledPoint> for SampleRow<'a> {
    fn from(p: &'a LabeledPoint) -> Self {
        Self {
            sample: p.sample_id(),
            id: p.id,
            date: p.date,
            zone: &p.zone,
            season: p.season,
            latitude: p.latitude,
            longitude: p.longitude,
            danger_below_treeline: p.danger_below_treeline.as_deref(),
            danger_near_treeline: p.danger_near_treeline.as_deref(),
            danger_above_treeline: p.danger_above_treeline.as_deref(),
            trend: p.trend,
            trend_label: p.trend_label.as_deref(),
        }
    }
}

/// Write the label table of a batch, one row per tensor sample in order.
pub fn write_sample_labels(path: &Path, labels: &[LabeledPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in labels {
        writer.serialize(SampleRow::from(point))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the `sample` column of a label table.
pub fn read_sample_ids(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = headers.iter().position(|h| h == "sample").unwrap_or(0);
    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        ids.push(record.get(column).unwrap_or_default().to_string());
    }
    Ok(ids)
}
