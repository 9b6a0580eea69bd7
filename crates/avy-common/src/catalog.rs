//! Forecast-zone catalog.
//!
//! Maps administrative areas (US states) to the forecast zones that have
//! feature-grid partitions, and translates the zone spellings used by the
//! forecast archive into the spellings used by the feature grids.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Administrative area owning a set of forecast zones.
///
/// Feature-grid partitions are stored in one directory per area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Area {
    Utah,
    Colorado,
    Washington,
}

impl Area {
    pub const ALL: [Area; 3] = [Area::Utah, Area::Colorado, Area::Washington];

    /// Directory name used in partition paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Utah => "Utah",
            Area::Colorado => "Colorado",
            Area::Washington => "Washington",
        }
    }

    pub fn from_name(name: &str) -> CatalogResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CatalogError::UnknownArea(name.to_string()))
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forecast zone and the area it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEntry {
    pub area: Area,
    /// Zone name as used by the feature grids.
    pub zone: &'static str,
}

const ZONES: &[ZoneEntry] = &[
    ZoneEntry { area: Area::Utah, zone: "Abajos" },
    ZoneEntry { area: Area::Utah, zone: "Logan" },
    ZoneEntry { area: Area::Utah, zone: "Moab" },
    ZoneEntry { area: Area::Utah, zone: "Ogden" },
    ZoneEntry { area: Area::Utah, zone: "Provo" },
    ZoneEntry { area: Area::Utah, zone: "Salt Lake" },
    ZoneEntry { area: Area::Utah, zone: "Skyline" },
    ZoneEntry { area: Area::Utah, zone: "Uintas" },
    ZoneEntry { area: Area::Colorado, zone: "Grand Mesa Zone" },
    ZoneEntry { area: Area::Colorado, zone: "Sangre de Cristo Range" },
    ZoneEntry { area: Area::Colorado, zone: "Steamboat Zone" },
    ZoneEntry { area: Area::Colorado, zone: "Front Range Zone" },
    ZoneEntry { area: Area::Colorado, zone: "Vail Summit Zone" },
    ZoneEntry { area: Area::Colorado, zone: "Sawatch Zone" },
    ZoneEntry { area: Area::Colorado, zone: "Aspen Zone" },
    ZoneEntry { area: Area::Colorado, zone: "North San Juan Mountains" },
    ZoneEntry { area: Area::Colorado, zone: "South San Juan Mountains" },
    ZoneEntry { area: Area::Colorado, zone: "Gunnison Zone" },
    ZoneEntry { area: Area::Washington, zone: "Mt Hood" },
    ZoneEntry { area: Area::Washington, zone: "Olympics" },
    ZoneEntry { area: Area::Washington, zone: "Snoqualmie Pass" },
    ZoneEntry { area: Area::Washington, zone: "Stevens Pass" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades East, Central" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades East, North" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades East, South" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades West, Central" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades West, Mt Baker" },
    ZoneEntry { area: Area::Washington, zone: "WA Cascades West, South" },
];

/// Forecast-archive spelling -> feature-grid spelling.
const LABEL_ZONE_NAMES: &[(&str, &str)] = &[
    ("Mt Hood", "Mt Hood"),
    ("Olympics", "Olympics"),
    ("Cascade Pass - Snoq. Pass", "Snoqualmie Pass"),
    ("Cascade Pass - Stevens Pass", "Stevens Pass"),
    ("Cascade East - Central", "WA Cascades East, Central"),
    ("Cascade East - North", "WA Cascades East, North"),
    ("Cascade East - South", "WA Cascades East, South"),
    ("Cascade West - Central", "WA Cascades West, Central"),
    ("Cascade West - North", "WA Cascades West, Mt Baker"),
    ("Cascade West - South", "WA Cascades West, South"),
    ("Abajo", "Abajos"),
    ("Logan", "Logan"),
    ("Moab", "Moab"),
    ("Ogden", "Ogden"),
    ("Provo", "Provo"),
    ("Salt Lake", "Salt Lake"),
    ("Skyline", "Skyline"),
    ("Uintas", "Uintas"),
    ("Grand Mesa", "Grand Mesa Zone"),
    ("Sangre de Cristo", "Sangre de Cristo Range"),
    ("Steamboat & Flat Tops", "Steamboat Zone"),
    ("Front Range", "Front Range Zone"),
    ("Vail & Summit County", "Vail Summit Zone"),
    ("Sawatch Range", "Sawatch Zone"),
    ("Aspen", "Aspen Zone"),
    ("Northern San Juan", "North San Juan Mountains"),
    ("Southern San Juan", "South San Juan Mountains"),
    ("Gunnison", "Gunnison Zone"),
];

/// Static zone catalog.
///
/// The catalog is immutable; the same instance can be shared freely across
/// worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionCatalog;

impl RegionCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Every configured zone with its area, grouped by area.
    pub fn zones(&self) -> impl Iterator<Item = &'static ZoneEntry> {
        ZONES.iter()
    }

    /// Zones belonging to one area.
    pub fn zones_in(&self, area: Area) -> impl Iterator<Item = &'static str> {
        ZONES.iter().filter(move |e| e.area == area).map(|e| e.zone)
    }

    /// Whether the zone (feature-grid spelling) is configured.
    pub fn contains(&self, zone: &str) -> bool {
        ZONES.iter().any(|e| e.zone == zone)
    }

    /// Area owning `zone`.
    pub fn area_of(&self, zone: &str) -> CatalogResult<Area> {
        ZONES
            .iter()
            .find(|e| e.zone == zone)
            .map(|e| e.area)
            .ok_or_else(|| CatalogError::UnknownZone(zone.to_string()))
    }

    /// Translate a forecast-archive zone name into the feature-grid name.
    pub fn normalize_zone_name(&self, label_source_name: &str) -> CatalogResult<&'static str> {
        LABEL_ZONE_NAMES
            .iter()
            .find(|(source, _)| *source == label_source_name)
            .map(|(_, zone)| *zone)
            .ok_or_else(|| CatalogError::UnknownZone(label_source_name.to_string()))
    }
}
