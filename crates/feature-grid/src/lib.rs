//! Feature-grid access with Zarr V3 support.
//!
//! Weather-model features are stored as one chunked partition per
//! (season, administrative area, forecast zone). This crate opens those
//! partitions read-only and extracts what the dataset builder needs:
//!
//! - **Point series**: a fixed-length, gap-filled daily window of every
//!   variable at the grid cell nearest to a coordinate
//! - **Grid-point probes**: the cells of a zone that carry usable data
//!
//! # Architecture
//!
//! ```text
//! SeriesRequest (zone, lat, lon, lookback, end date)
//!      │
//!      ▼
//! PointSeriesFetcher::fetch
//!      │
//!      ├─► RegionCatalog: zone → area, date → season
//!      │
//!      ├─► FeatureStore::open(season/area/Region_<zone>.zarr)
//!      │
//!      ├─► nearest cell, time slice [end - lookback + 1, end]
//!      │
//!      └─► reindex onto a contiguous daily calendar (gaps = NaN)
//!               │
//!               ▼
//!          PointSeries [variable, day]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use feature_grid::{PointSeriesFetcher, ZarrFeatureStore};
//!
//! let fetcher = PointSeriesFetcher::new(ZarrFeatureStore::new("/data/4.GFSFiltered1xInterpolationZarr"));
//! let series = fetcher.fetch("Salt Lake", 40.6, -111.6, 14, date)?;
//! assert_eq!(series.lookback_days(), 14);
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod partition;
pub mod probe;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::{ZarrCompression, ZarrWriterConfig};
pub use error::{FetchError, Result};
pub use fetch::{PointSeriesFetcher, SeriesRequest, SeriesSource};
pub use partition::{
    FeaturePartition, FeatureStore, MemoryFeatureStore, MemoryPartition, ZarrFeatureStore,
    ZarrPartition,
};
pub use probe::{probe_grid_points, ProbeReport};
pub use types::{GridPoint, PartitionAxes, PartitionKey, PointSeries};
pub use writer::{ZarrWriteResult, ZarrWriter};
