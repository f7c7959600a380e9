//! Timestamp rendering and lenient parsing.
//!
//! Stored timestamps are always RFC 3339 in UTC with a fixed microsecond
//! precision, so their text form sorts the same way as the instants do.
//! Input timestamps may also arrive without an offset (the browser
//! `datetime-local` form, e.g. `2024-05-01T12:30`); those are read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Renders `ts` in the fixed, sortable storage format.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses an RFC 3339 timestamp, or an offset-less one taken as UTC.
///
/// Returns `None` when `raw` matches none of the accepted forms.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde helper for optional request timestamps accepting every form
/// [`parse_timestamp`] understands.
///
/// # Errors
///
/// Fails deserialization when the string is present but unparseable.
pub fn deserialize_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        let Some(ts) = ts else {
            panic!("valid date");
        };
        assert_eq!(format_timestamp(&ts), "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let Some(ts) = parse_timestamp("2024-05-01T14:30:00+02:00") else {
            panic!("should parse");
        };
        assert_eq!(format_timestamp(&ts), "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn parses_datetime_local_as_utc() {
        let Some(ts) = parse_timestamp("2024-05-01T12:30") else {
            panic!("should parse");
        };
        assert_eq!(format_timestamp(&ts), "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn text_order_matches_time_order() {
        let a = parse_timestamp("2024-05-01T09:00:00Z");
        let b = parse_timestamp("2024-05-01T10:00:00.5Z");
        let (Some(a), Some(b)) = (a, b) else {
            panic!("should parse");
        };
        assert!(format_timestamp(&a) < format_timestamp(&b));
    }
}
