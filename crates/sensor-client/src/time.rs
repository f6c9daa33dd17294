//! Fixed local zone (JST, UTC+9) helpers
//!
//! Every time-of-day rule runs against JST wall-clock time, so instants are
//! normalized here before they leave the provider layer.

use chrono::{DateTime, FixedOffset, TimeZone, Timelike};

/// JST offset from UTC in seconds
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Japan Standard Time
pub const JST: FixedOffset = match FixedOffset::east_opt(JST_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("invalid JST offset"),
};

/// Convert an instant in any zone to JST
pub fn to_jst<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<FixedOffset> {
    instant.with_timezone(&JST)
}

/// Parse an ISO-8601 timestamp (`Z` or offset suffixed) into JST
pub fn parse_to_jst(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim()).map(|t| to_jst(&t))
}

/// Hour of day (0-23) in JST
pub fn local_hour<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    to_jst(instant).hour()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_utc_suffix_converts_to_jst() {
        let t = parse_to_jst("2024-05-01T15:30:00Z").unwrap();
        assert_eq!(t.offset().local_minus_utc(), JST_OFFSET_SECS);
        assert_eq!(t.hour(), 0);
        assert_eq!(t.to_rfc3339(), "2024-05-02T00:30:00+09:00");
    }

    #[test]
    fn test_offset_suffix_preserves_instant() {
        let a = parse_to_jst("2024-05-01T12:00:00+02:00").unwrap();
        let b = parse_to_jst("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 19);
    }

    #[test]
    fn test_local_hour_ignores_source_zone() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap();
        assert_eq!(local_hour(&utc), 6);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_to_jst("yesterday").is_err());
        assert!(parse_to_jst("").is_err());
    }
}
