//! Label split tests against synthetic archives and feature stores.

use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use avy_common::{Area, Season, Trend};
use feature_grid::{FetchError, MemoryFeatureStore};
use ml_prep::labels::{read_grid_points, GRID_POINT_CACHE};
use ml_prep::{build_label_split, load_split, save_split, LabelJoinConfig, PrepError};
use test_utils::{daily_rows, memory_store, write_archive, ArchiveRow, PartitionSpec};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn store() -> MemoryFeatureStore {
    let mut logan = PartitionSpec::new(Season::S15_16, Area::Utah, "Logan", 2);
    logan.empty_cells = vec![(1, 1)];
    let baker = PartitionSpec::new(
        Season::S15_16,
        Area::Washington,
        "WA Cascades West, Mt Baker",
        2,
    );
    memory_store(&[logan, baker])
}

fn archive(dir: &Path) -> std::path::PathBuf {
    let mut rows = daily_rows("Logan", d(2016, 1, 1), 10);
    rows.extend(daily_rows("Cascade West - North", d(2017, 2, 1), 3));
    // Excluded zone/season.
    rows.extend(daily_rows("Steamboat & Flat Tops", d(2016, 1, 1), 4));
    // Unknown region, summer date, season without trusted labels.
    rows.push(ArchiveRow::uniform(d(2016, 1, 1), "Nowhere", "Low"));
    rows.push(ArchiveRow::uniform(d(2016, 7, 1), "Logan", "Low"));
    rows.push(ArchiveRow::uniform(d(2020, 1, 1), "Logan", "Low"));

    let path = dir.join("labels.csv");
    write_archive(&path, &rows);
    path
}

fn config() -> LabelJoinConfig {
    LabelJoinConfig {
        train_test_cutoff: d(2016, 1, 5),
        ..LabelJoinConfig::default()
    }
}

#[test]
fn test_split_counts_and_filters() {
    let dir = TempDir::new().unwrap();
    let labels = archive(dir.path());

    let split = build_label_split(&labels, &store(), dir.path(), &config()).unwrap();

    // Logan: 3 usable cells x 10 days; Mt Baker: 4 cells x 3 days, all after
    // the cutoff.
    let logan_train = split.train.iter().filter(|p| p.zone == "Logan").count();
    let logan_test = split.test.iter().filter(|p| p.zone == "Logan").count();
    assert_eq!(logan_train, 3 * 5);
    assert_eq!(logan_test, 3 * 5);
    let baker = split
        .test
        .iter()
        .filter(|p| p.zone == "WA Cascades West, Mt Baker")
        .count();
    assert_eq!(baker, 4 * 3);
    assert_eq!(split.train.len() + split.test.len(), 15 + 15 + 12);

    assert!(split
        .train
        .iter()
        .chain(split.test.iter())
        .all(|p| p.zone != "Steamboat Zone"));
    assert!(split.train.iter().all(|p| p.date <= d(2016, 1, 5)));
    assert!(split.test.iter().all(|p| p.date > d(2016, 1, 5)));
    assert!(split
        .train
        .iter()
        .all(|p| !(p.latitude == 40.75 && p.longitude == -111.5)));
}

#[test]
fn test_trends_and_ids() {
    let dir = TempDir::new().unwrap();
    let labels = archive(dir.path());
    let split = build_label_split(&labels, &store(), dir.path(), &config()).unwrap();

    let first = split.train.rows().first().unwrap();
    assert_eq!(first.date, d(2016, 1, 1));
    assert_eq!(first.trend, Trend::Initial);
    assert_eq!(first.trend_label.as_deref(), Some("Low_Initial"));

    // Considerable -> High -> Low
    let by_date = |date| {
        split
            .train
            .iter()
            .chain(split.test.iter())
            .find(|p| p.zone == "Logan" && p.date == date)
            .unwrap()
            .trend
    };
    assert_eq!(by_date(d(2016, 1, 4)), Trend::Rising);
    assert_eq!(by_date(d(2016, 1, 5)), Trend::Falling);

    let ids: Vec<u64> = split
        .train
        .iter()
        .chain(split.test.iter())
        .map(|p| p.id)
        .collect();
    let expected: Vec<u64> = (0..ids.len() as u64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_cached_grid_points_are_reused() {
    let dir = TempDir::new().unwrap();
    let labels = archive(dir.path());
    let first = build_label_split(&labels, &store(), dir.path(), &config()).unwrap();

    let cached = read_grid_points(&dir.path().join(GRID_POINT_CACHE)).unwrap();
    assert_eq!(cached.len(), 3 + 4);

    // No partitions at all: only the cache can supply grid points.
    let second =
        build_label_split(&labels, &MemoryFeatureStore::new(), dir.path(), &config()).unwrap();
    assert_eq!(first, second);

    let overwrite = LabelJoinConfig {
        overwrite_cache: true,
        ..config()
    };
    let err = build_label_split(&labels, &MemoryFeatureStore::new(), dir.path(), &overwrite)
        .unwrap_err();
    assert!(matches!(
        err,
        PrepError::Fetch(FetchError::MissingPartition(_))
    ));
}

#[test]
fn test_saved_split_loads_back() {
    let dir = TempDir::new().unwrap();
    let labels = archive(dir.path());
    let split = build_label_split(&labels, &store(), dir.path(), &config()).unwrap();

    let out = dir.path().join("pools");
    save_split(&out, &split).unwrap();
    let loaded = load_split(&out).unwrap();
    assert_eq!(loaded, split);
}

#[test]
fn test_non_utf8_free_text_is_ignored() {
    let dir = TempDir::new().unwrap();
    let labels = archive(dir.path());
    let clean = build_label_split(&labels, &store(), dir.path(), &config()).unwrap();

    // Latin-1 "café" in SpecialStatement, a column that is never parsed.
    let text = std::fs::read_to_string(&labels).unwrap();
    let latin1: Vec<u8> = text
        .replace("Watch for", "caf\u{e9}")
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap())
        .collect();
    assert!(std::str::from_utf8(&latin1).is_err());
    std::fs::write(&labels, &latin1).unwrap();

    let split = build_label_split(
        &labels,
        &store(),
        dir.path(),
        &LabelJoinConfig {
            overwrite_cache: true,
            ..config()
        },
    )
    .unwrap();
    assert_eq!(split, clean);
}
