use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn elapsed_seconds(start: i64, end: i64) -> i64 {
    end - start
}

pub fn is_expired(timestamp: i64, timeout: i64, current_time: i64) -> bool {
    elapsed_seconds(timestamp, current_time) > timeout
}

/// Wall-clock UTC time without offset, as stored on claimed cards
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // After 2020-01-01, before 2100-01-01
        assert!(ts > 1577836800);
        assert!(ts < 4102444800);
    }

    #[test]
    fn test_elapsed_seconds() {
        assert_eq!(elapsed_seconds(100, 150), 50);
        assert_eq!(elapsed_seconds(1000, 1000), 0);
        assert_eq!(elapsed_seconds(200, 100), -100);
    }

    #[test]
    fn test_is_expired() {
        let current = 1000;

        assert!(!is_expired(950, 100, current));
        assert!(is_expired(800, 100, current));

        // Exactly at timeout is still valid
        assert!(!is_expired(900, 100, current));
        assert!(is_expired(899, 100, current));
    }
}
