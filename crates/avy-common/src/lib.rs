//! Common types and utilities shared across the avalanche ML prep crates.
//!
//! Everything here is static configuration: the forecast-zone catalog, the
//! winter-season calendar and the avalanche danger scale.

pub mod catalog;
pub mod danger;
pub mod error;
pub mod season;
pub mod time;

pub use catalog::{Area, RegionCatalog, ZoneEntry};
pub use danger::{DangerLevel, ElevationBand, Trend};
pub use error::{CatalogError, CatalogResult};
pub use season::{season_of, Season};
pub use time::{daily_window, parse_label_date, LABEL_DATE_FORMAT};
