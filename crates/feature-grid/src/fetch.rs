//! Fixed-length point series extraction.

use chrono::NaiveDate;
use ndarray::Array2;

use avy_common::{daily_window, season_of, RegionCatalog};

use crate::error::{FetchError, Result};
use crate::partition::FeatureStore;
use crate::types::{PartitionKey, PointSeries};

/// One point-series lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub zone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub lookback_days: usize,
    /// Last day of the window (the label date).
    pub end_date: NaiveDate,
}

/// Anything that can turn a [`SeriesRequest`] into a [`PointSeries`].
///
/// Implementations are called concurrently from worker threads and must not
/// share mutable state between calls.
pub trait SeriesSource: Send + Sync {
    fn fetch(&self, request: &SeriesRequest) -> Result<PointSeries>;
}

/// Extracts gap-filled lookback windows from a feature store.
pub struct PointSeriesFetcher<S> {
    store: S,
    catalog: RegionCatalog,
}

impl<S: FeatureStore> PointSeriesFetcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            catalog: RegionCatalog::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch `lookback_days` of every variable at the grid cell nearest to
    /// (`lat`, `lon`), ending at `end_date`.
    ///
    /// Days missing from the partition (including days before the season's
    /// partition starts) are NaN; the series always has exactly
    /// `lookback_days` entries.
    pub fn fetch(
        &self,
        zone: &str,
        lat: f64,
        lon: f64,
        lookback_days: usize,
        end_date: NaiveDate,
    ) -> Result<PointSeries> {
        if lookback_days == 0 {
            return Err(FetchError::InvalidRequest(
                "lookback_days must be > 0".to_string(),
            ));
        }

        let area = self.catalog.area_of(zone)?;
        let season = season_of(end_date).ok_or(FetchError::UnknownSeason(end_date))?;
        let key = PartitionKey::new(season, area, zone);

        let partition = self.store.open(&key)?;
        let axes = partition.axes();
        if axes.is_empty() {
            return Err(FetchError::EmptyPartition(key.to_string()));
        }

        let lat_idx = axes
            .nearest_lat(lat)
            .ok_or_else(|| FetchError::EmptyPartition(key.to_string()))?;
        let lon_idx = axes
            .nearest_lon(lon)
            .ok_or_else(|| FetchError::EmptyPartition(key.to_string()))?;

        let dates = daily_window(end_date, lookback_days);
        let start = dates[0];
        let time = axes.time_range(start, end_date);
        let n_vars = axes.variables.len();

        let raw = partition.read_cell(lat_idx, lon_idx, time.clone())?;
        if raw.len() != time.len() * n_vars {
            return Err(FetchError::shape_mismatch(
                format!("{} values", time.len() * n_vars),
                format!("{} values", raw.len()),
            ));
        }

        // Reindex onto the contiguous calendar
        let mut values = Array2::from_elem((n_vars, lookback_days), f32::NAN);
        for (row, t) in time.clone().enumerate() {
            let slot = (axes.times[t] - start).num_days();
            if slot < 0 || slot as usize >= lookback_days {
                continue;
            }
            for v in 0..n_vars {
                values[[v, slot as usize]] = raw[row * n_vars + v];
            }
        }

        if values.ncols() != lookback_days || dates.len() != lookback_days {
            return Err(FetchError::shape_mismatch(
                format!("{} days", lookback_days),
                format!("{} days", values.ncols()),
            ));
        }

        tracing::trace!(
            partition = %key,
            lat_idx,
            lon_idx,
            days_present = time.len(),
            "Fetched point series"
        );

        Ok(PointSeries {
            zone: zone.to_string(),
            latitude: axes.latitudes[lat_idx],
            longitude: axes.longitudes[lon_idx],
            dates,
            variables: axes.variables.clone(),
            values,
        })
    }
}

impl<S: FeatureStore> SeriesSource for PointSeriesFetcher<S> {
    fn fetch(&self, request: &SeriesRequest) -> Result<PointSeries> {
        PointSeriesFetcher::fetch(
            self,
            &request.zone,
            request.latitude,
            request.longitude,
            request.lookback_days,
            request.end_date,
        )
    }
}
