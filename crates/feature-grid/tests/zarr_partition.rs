//! Zarr partition write/read tests against the on-disk store layout.

use chrono::NaiveDate;
use tempfile::TempDir;
use zarrs::array::Array;
use zarrs_filesystem::FilesystemStore;

use avy_common::{Area, Season};
use feature_grid::{
    probe_grid_points, FeatureStore, FetchError, PartitionAxes, PartitionKey, PointSeriesFetcher,
    ZarrFeatureStore, ZarrWriter, ZarrWriterConfig,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two variables, 2x3 grid, every day of January 2016 except the 10th.
fn axes() -> PartitionAxes {
    let times = (1..=31)
        .filter(|d| *d != 10)
        .map(|d| date(2016, 1, d))
        .collect();
    PartitionAxes {
        variables: vec!["APCP_surface".into(), "TMP_2maboveground".into()],
        latitudes: vec![40.75, 40.5],
        longitudes: vec![-111.75, -111.5, -111.25],
        times,
    }
}

/// value = day-of-month * 100 + variable * 10 + lat_idx * 3 + lon_idx,
/// with the corner cell (0, 0) left empty.
fn data(axes: &PartitionAxes) -> Vec<f32> {
    let [nt, nv, ny, nx] = axes.shape();
    let mut out = Vec::with_capacity(nt * nv * ny * nx);
    for t in &axes.times {
        for v in 0..nv {
            for y in 0..ny {
                for x in 0..nx {
                    if y == 0 && x == 0 {
                        out.push(f32::NAN);
                    } else {
                        let day = chrono::Datelike::day(t) as f32;
                        out.push(day * 100.0 + (v * 10 + y * 3 + x) as f32);
                    }
                }
            }
        }
    }
    out
}

fn write_store(root: &std::path::Path, compressed: bool) -> ZarrFeatureStore {
    let store = ZarrFeatureStore::new(root);
    let key = PartitionKey::new(Season::S15_16, Area::Utah, "Salt Lake");
    let config = if compressed {
        ZarrWriterConfig::default()
    } else {
        ZarrWriterConfig::uncompressed()
    };
    let writer = ZarrWriter::new(config).unwrap();
    let axes = axes();
    writer
        .write_partition(&store.partition_path(&key), &axes, &data(&axes))
        .unwrap();
    store
}

#[test]
fn test_fetch_from_zarr_store() {
    let dir = TempDir::new().unwrap();
    let store = write_store(dir.path(), false);
    let fetcher = PointSeriesFetcher::new(store);

    let series = fetcher
        .fetch("Salt Lake", 40.52, -111.26, 4, date(2016, 1, 11))
        .unwrap();

    assert_eq!(series.lookback_days(), 4);
    assert_eq!(series.latitude, 40.5);
    assert_eq!(series.longitude, -111.25);
    assert_eq!(
        series.dates,
        vec![date(2016, 1, 8), date(2016, 1, 9), date(2016, 1, 10), date(2016, 1, 11)]
    );
    // lat_idx 1, lon_idx 2 => +5
    assert_eq!(series.values[[0, 0]], 805.0);
    assert_eq!(series.values[[1, 1]], 915.0);
    assert!(series.values[[0, 2]].is_nan());
    assert!(series.values[[1, 2]].is_nan());
    assert_eq!(series.values[[0, 3]], 1105.0);
    assert_eq!(series.missing_count(), 2);
}

#[test]
fn test_compressed_partition_reads_the_same() {
    let plain_dir = TempDir::new().unwrap();
    let packed_dir = TempDir::new().unwrap();
    let plain = PointSeriesFetcher::new(write_store(plain_dir.path(), false));
    let packed = PointSeriesFetcher::new(write_store(packed_dir.path(), true));

    let a = plain
        .fetch("Salt Lake", 40.75, -111.5, 7, date(2016, 1, 20))
        .unwrap();
    let b = packed
        .fetch("Salt Lake", 40.75, -111.5, 7, date(2016, 1, 20))
        .unwrap();
    assert_eq!(a.values, b.values);
    assert_eq!(a.variables, b.variables);
}

#[test]
fn test_missing_partition_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = write_store(dir.path(), false);
    let key = PartitionKey::new(Season::S16_17, Area::Utah, "Salt Lake");
    assert!(matches!(
        store.open(&key),
        Err(FetchError::MissingPartition(_))
    ));

    let fetcher = PointSeriesFetcher::new(store);
    let err = fetcher
        .fetch("Salt Lake", 40.5, -111.5, 3, date(2017, 1, 5))
        .unwrap_err();
    assert!(err.is_per_sample());
}

#[test]
fn test_probe_zarr_partition() {
    let dir = TempDir::new().unwrap();
    let store = write_store(dir.path(), false);
    let key = PartitionKey::new(Season::S15_16, Area::Utah, "Salt Lake");
    let partition = store.open(&key).unwrap();

    let report = probe_grid_points(partition.as_ref(), "Salt Lake", date(2016, 1, 1)).unwrap();
    assert_eq!(report.examined, 6);
    assert_eq!(report.points.len(), 5);
    assert!(!report
        .points
        .iter()
        .any(|p| p.latitude == 40.75 && p.longitude == -111.75));
}

#[test]
fn test_tensor_attributes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("X_train_0.zarr");
    let writer = ZarrWriter::new(ZarrWriterConfig::uncompressed()).unwrap();

    let variables = vec!["a".to_string(), "b".to_string()];
    let samples = vec!["2016-01-01: Logan".to_string()];
    let values = vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let result = writer
        .write_tensor(&path, [1, 2, 3], &variables, &samples, &values)
        .unwrap();
    assert_eq!(result.shape, vec![1, 2, 3]);

    let store = std::sync::Arc::new(FilesystemStore::new(&path).unwrap());
    let array = Array::open(store, "/").unwrap();
    assert_eq!(array.shape(), &[1, 2, 3]);
    assert_eq!(array.attributes()["variables"], serde_json::json!(["a", "b"]));
    assert_eq!(
        array.attributes()["samples"],
        serde_json::json!(["2016-01-01: Logan"])
    );

    let read: Vec<f32> = array
        .retrieve_array_subset_elements(&array.subset_all())
        .unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_tensor_shape_checked() {
    let dir = TempDir::new().unwrap();
    let writer = ZarrWriter::new(ZarrWriterConfig::uncompressed()).unwrap();
    let err = writer
        .write_tensor(
            &dir.path().join("x.zarr"),
            [2, 1, 1],
            &["a".to_string()],
            &["only-one".to_string()],
            &[0.0, 0.0],
        )
        .unwrap_err();
    assert!(matches!(err, FetchError::ShapeMismatch { .. }));
}
