//! Date helpers for forecast labels and lookback windows.

use chrono::{Duration, NaiveDate};

use crate::error::{CatalogError, CatalogResult};

/// Date format of the forecast archive's `Day1Date` column.
pub const LABEL_DATE_FORMAT: &str = "%Y%m%d";

/// Parse a `Day1Date` value such as "20160115".
pub fn parse_label_date(s: &str) -> CatalogResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), LABEL_DATE_FORMAT)
        .map_err(|_| CatalogError::InvalidDate(s.to_string()))
}

/// Contiguous daily calendar of `days` entries ending at `end` (inclusive).
pub fn daily_window(end: NaiveDate, days: usize) -> Vec<NaiveDate> {
    if days == 0 {
        return Vec::new();
    }
    let start = end - Duration::days(days as i64 - 1);
    (0..days as i64).map(|i| start + Duration::days(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_date() {
        let d = parse_label_date("20160115").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2016, 1, 15).unwrap());
        assert!(parse_label_date("2016-01-15").is_err());
    }

    #[test]
    fn test_daily_window_crosses_month() {
        let end = NaiveDate::from_ymd_opt(2016, 3, 2).unwrap();
        let window = daily_window(end, 4);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0], NaiveDate::from_ymd_opt(2016, 2, 28).unwrap());
        assert_eq!(window[1], NaiveDate::from_ymd_opt(2016, 2, 29).unwrap());
        assert_eq!(*window.last().unwrap(), end);
    }

    #[test]
    fn test_daily_window_empty() {
        let end = NaiveDate::from_ymd_opt(2016, 3, 2).unwrap();
        assert!(daily_window(end, 0).is_empty());
    }
}
