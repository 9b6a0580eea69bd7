//! Tests for the zone catalog and season calendar.

use avy_common::{season_of, Area, CatalogError, RegionCatalog, Season};
use chrono::NaiveDate;

// ============================================================================
// Zone lookups
// ============================================================================

#[test]
fn test_area_of_known_zones() {
    let catalog = RegionCatalog::new();
    assert_eq!(catalog.area_of("Salt Lake").unwrap(), Area::Utah);
    assert_eq!(catalog.area_of("Aspen Zone").unwrap(), Area::Colorado);
    assert_eq!(catalog.area_of("Stevens Pass").unwrap(), Area::Washington);
}

#[test]
fn test_area_of_unknown_zone() {
    let catalog = RegionCatalog::new();
    let err = catalog.area_of("Aspen").unwrap_err();
    assert_eq!(err, CatalogError::UnknownZone("Aspen".to_string()));
}

#[test]
fn test_normalize_zone_name() {
    let catalog = RegionCatalog::new();
    assert_eq!(
        catalog.normalize_zone_name("Cascade West - North").unwrap(),
        "WA Cascades West, Mt Baker"
    );
    assert_eq!(catalog.normalize_zone_name("Abajo").unwrap(), "Abajos");
    assert_eq!(
        catalog.normalize_zone_name("Steamboat & Flat Tops").unwrap(),
        "Steamboat Zone"
    );
}

#[test]
fn test_normalize_unknown_zone_is_an_error() {
    let catalog = RegionCatalog::new();
    assert!(matches!(
        catalog.normalize_zone_name("Mount Shasta"),
        Err(CatalogError::UnknownZone(name)) if name == "Mount Shasta"
    ));
    // Feature-grid spellings are not label-source spellings.
    assert!(catalog.normalize_zone_name("Aspen Zone").is_err());
}

#[test]
fn test_zone_counts_per_area() {
    let catalog = RegionCatalog::new();
    assert_eq!(catalog.zones_in(Area::Utah).count(), 8);
    assert_eq!(catalog.zones_in(Area::Colorado).count(), 10);
    assert_eq!(catalog.zones_in(Area::Washington).count(), 10);
    assert_eq!(catalog.zones().count(), 28);
}

#[test]
fn test_area_from_name() {
    assert_eq!(Area::from_name("colorado").unwrap(), Area::Colorado);
    assert!(Area::from_name("Montana").is_err());
}

// ============================================================================
// Seasons
// ============================================================================

#[test]
fn test_season_of_each_winter() {
    for season in Season::ALL {
        assert_eq!(season_of(season.start_date()), Some(season));
        assert_eq!(season_of(season.end_date()), Some(season));
        let mid = NaiveDate::from_ymd_opt(season.start_year() + 1, 1, 15).unwrap();
        assert_eq!(season_of(mid), Some(season));
    }
}

#[test]
fn test_summer_dates_have_no_season() {
    for year in 2014..=2020 {
        for month in 5..=10 {
            let date = NaiveDate::from_ymd_opt(year, month, 10).unwrap();
            assert_eq!(season_of(date), None, "{}", date);
        }
    }
}

#[test]
fn test_season_serde_uses_label() {
    let json = serde_json::to_string(&Season::S16_17).unwrap();
    assert_eq!(json, "\"16-17\"");
    let parsed: Season = serde_json::from_str("\"18-19\"").unwrap();
    assert_eq!(parsed, Season::S18_19);
}
