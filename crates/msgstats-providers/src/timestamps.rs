//! Parsing of the timestamp shapes the providers emit.
//!
//! Graph API returns `2024-01-01T10:00:00+0000`, Skype and HelpScout return
//! RFC 3339, and some payloads carry a bare `2024-01-01`. Everything is
//! normalised to UTC so the oldest unread message is picked by instant.

use chrono::{DateTime, NaiveDate, Utc};

/// Parses a provider timestamp into UTC, or `None` when the shape is unknown.
#[must_use]
pub fn parse_provider_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Graph API: numeric offset without a colon.
    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses `raw` when present, logging (at debug) values that do not parse.
pub(crate) fn parse_optional(raw: Option<&str>, context: &str) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_provider_timestamp(raw);
    if parsed.is_none() {
        tracing::debug!(context, value = raw, "ignoring unparseable timestamp");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_rfc3339_with_zulu() {
        let parsed = parse_provider_timestamp("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_fraction_and_offset() {
        let parsed = parse_provider_timestamp("2024-01-01T12:00:00.250+02:00").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn parses_graph_api_offset_without_colon() {
        let parsed = parse_provider_timestamp("2024-01-01T10:00:00+0000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let parsed = parse_provider_timestamp("2024-01-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_and_empty() {
        assert!(parse_provider_timestamp("").is_none());
        assert!(parse_provider_timestamp("   ").is_none());
        assert!(parse_provider_timestamp("yesterday").is_none());
    }

    #[test]
    fn offsets_are_compared_by_instant_not_text() {
        // Lexically `b` sorts first, but `a` is 08:00 UTC.
        let a = parse_provider_timestamp("2024-01-01T10:00:00+02:00").unwrap();
        let b = parse_provider_timestamp("2024-01-01T09:00:00Z").unwrap();
        assert!(a < b);
    }
}
