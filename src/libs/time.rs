use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use chrono::{Local, NaiveDate, TimeZone};

/// Dates are stored and exchanged as `YYYY-MM-DD`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wall clock instant with nanosecond resolution.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TIME {
    naos: u128,
}

impl TIME {
    pub fn now() -> Result<Self, SystemTimeError> {
        let naos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        Ok(Self { naos })
    }
    pub fn from_naos(naos: u128) -> Self {
        Self { naos }
    }
    pub fn naos(&self) -> u128 {
        self.naos
    }
    pub fn seconds(&self) -> i64 {
        (self.naos / 1_000_000_000) as i64
    }
    pub fn date(&self) -> NaiveDate {
        Local.timestamp_nanos(self.naos as i64).date_naive()
    }
}

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_iso_dates() {
        assert_eq!(parse_date("2025-02-28"), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(parse_date(" 2025-02-28 "), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert!(parse_date("28/02/2025").is_none());
        assert!(parse_date("2025-02-30").is_none());
    }

    #[test]
    fn date_round_trips_through_format() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(format_date(date), "2024-07-04");
    }

    #[test]
    fn seconds_truncate_nanos() {
        assert_eq!(TIME::from_naos(1_700_000_000_999_999_999).seconds(), 1_700_000_000);
    }
}
