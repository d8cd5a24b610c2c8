//! Time utilities

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::day_key;

/// Get current UTC time
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a `YYYY-MM-DD` day
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Day keys from `today` going back, newest first
pub fn recent_days(today: NaiveDate, count: u32) -> Vec<String> {
    (0..i64::from(count.max(1)))
        .map(|offset| day_key(today - Duration::days(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_days_crosses_month() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(recent_days(today, 2), vec!["2026-03-01", "2026-02-28"]);
        assert_eq!(recent_days(today, 0), vec!["2026-03-01"]);
    }

    #[test]
    fn test_parse_day() {
        assert!(parse_day("2026-01-09").is_some());
        assert!(parse_day("09/01/2026").is_none());
    }
}
