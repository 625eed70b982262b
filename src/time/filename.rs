//! Filename timestamp parsing

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

/// Pattern: YYYYMMDD_HHMMSS anywhere in the name (IMG_20140705_100000.jpg)
static PATTERN_COMPACT: OnceLock<Regex> = OnceLock::new();

fn pattern_compact() -> &'static Regex {
    PATTERN_COMPACT.get_or_init(|| Regex::new(r"(\d{8}_\d{6})").unwrap())
}

/// Parse timestamp from a filename
///
/// The first occurrence that forms a valid calendar date wins.
pub fn parse_filename_time(filename: &str) -> Option<NaiveDateTime> {
    for caps in pattern_compact().captures_iter(filename) {
        let candidate = caps.get(1)?.as_str();
        match NaiveDateTime::parse_from_str(candidate, "%Y%m%d_%H%M%S") {
            Ok(dt) => {
                trace!(filename, candidate, "Matched filename timestamp");
                return Some(dt);
            }
            Err(e) => trace!(filename, candidate, error = %e, "Not a valid date"),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_compact_format() {
        let dt = parse_filename_time("IMG_20240115_143000.jpg").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);

        let dt = parse_filename_time("20240115_143000.mp4").unwrap();
        assert_eq!(dt.year(), 2024);

        let dt = parse_filename_time("VID_20240115_143000_HDR.mp4").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_skips_invalid_dates() {
        let dt = parse_filename_time("20241399_000000_20240115_143000.jpg").unwrap();
        assert_eq!(dt.month(), 1);
    }

    #[test]
    fn test_invalid_formats() {
        assert!(parse_filename_time("IMG4101.jpg").is_none());
        assert!(parse_filename_time("2024-01-15 14-30-00.jpg").is_none());
        assert!(parse_filename_time("20240115-143000.jpg").is_none());
        assert!(parse_filename_time("20241315_143000.jpg").is_none());
    }
}
