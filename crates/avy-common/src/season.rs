//! Winter-season calendar.
//!
//! A season runs from November 1st through April 30th (both inclusive).
//! Only six winters are defined; any other date has no season and must be
//! filtered out before it reaches training data.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// One forecast winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "14-15")]
    S14_15,
    #[serde(rename = "15-16")]
    S15_16,
    #[serde(rename = "16-17")]
    S16_17,
    #[serde(rename = "17-18")]
    S17_18,
    #[serde(rename = "18-19")]
    S18_19,
    #[serde(rename = "19-20")]
    S19_20,
}

impl Season {
    /// All defined seasons in chronological order.
    pub const ALL: [Season; 6] = [
        Season::S14_15,
        Season::S15_16,
        Season::S16_17,
        Season::S17_18,
        Season::S18_19,
        Season::S19_20,
    ];

    /// Calendar year in which the season starts.
    pub fn start_year(&self) -> i32 {
        match self {
            Season::S14_15 => 2014,
            Season::S15_16 => 2015,
            Season::S16_17 => 2016,
            Season::S17_18 => 2017,
            Season::S18_19 => 2018,
            Season::S19_20 => 2019,
        }
    }

    /// Short label used in partition paths, e.g. "15-16".
    pub fn label(&self) -> &'static str {
        match self {
            Season::S14_15 => "14-15",
            Season::S15_16 => "15-16",
            Season::S16_17 => "16-17",
            Season::S17_18 => "17-18",
            Season::S18_19 => "18-19",
            Season::S19_20 => "19-20",
        }
    }

    /// Parse a season label such as "16-17".
    pub fn from_label(label: &str) -> CatalogResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.label() == label.trim())
            .ok_or_else(|| CatalogError::UnknownSeason(label.to_string()))
    }

    /// First day of the season (November 1st).
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year(), 11, 1).expect("Nov 1 is a valid date")
    }

    /// Last day of the season (April 30th of the following year).
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year() + 1, 4, 30).expect("Apr 30 is a valid date")
    }

    /// Whether `date` falls inside this season.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a date into its season, or `None` when it is outside every
/// defined winter.
pub fn season_of(date: NaiveDate) -> Option<Season> {
    // Nov/Dec belong to the winter starting this year, Jan-Apr to the one
    // that started last year; May-Oct belong to none.
    let start_year = match date.month() {
        11 | 12 => date.year(),
        1..=4 => date.year() - 1,
        _ => return None,
    };
    Season::ALL.iter().copied().find(|s| s.start_year() == start_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_season_boundaries_inclusive() {
        assert_eq!(season_of(d(2015, 11, 1)), Some(Season::S15_16));
        assert_eq!(season_of(d(2016, 4, 30)), Some(Season::S15_16));
        assert_eq!(season_of(d(2016, 5, 1)), None);
        assert_eq!(season_of(d(2015, 10, 31)), None);
    }

    #[test]
    fn test_season_outside_defined_winters() {
        assert_eq!(season_of(d(2014, 4, 1)), None);
        assert_eq!(season_of(d(2020, 11, 15)), None);
        assert_eq!(season_of(d(2014, 11, 1)), Some(Season::S14_15));
        assert_eq!(season_of(d(2020, 4, 30)), Some(Season::S19_20));
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(season_of(d(2016, 2, 29)), Some(Season::S15_16));
    }

    #[test]
    fn test_every_day_has_at_most_one_season() {
        let mut day = d(2014, 1, 1);
        let end = d(2021, 1, 1);
        while day < end {
            let matching: Vec<_> = Season::ALL.iter().filter(|s| s.contains(day)).collect();
            assert!(matching.len() <= 1, "{} matched {:?}", day, matching);
            assert_eq!(season_of(day), matching.first().map(|s| **s), "{}", day);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_label_roundtrip() {
        for season in Season::ALL {
            assert_eq!(Season::from_label(season.label()).unwrap(), season);
        }
        assert!(Season::from_label("20-21").is_err());
    }

    #[test]
    fn test_start_date() {
        assert_eq!(Season::S17_18.start_date(), d(2017, 11, 1));
        assert_eq!(Season::S17_18.end_date(), d(2018, 4, 30));
    }
}
