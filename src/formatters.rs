//! Formatting utilities for timestamps and locations.
//!
//! Pure functions converting stored send timestamps and location pairs into
//! display strings and chart-bucket keys. Stored timestamps are ISO-8601
//! text, but legacy rows may lack a timezone marker; parsing here normalizes
//! those defensively instead of erroring.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

fn tz_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:[Zz]|[+-]\d{2}:?\d{2})$").expect("hard-coded regex"))
}

fn fraction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\d+$").expect("hard-coded regex"))
}

/// Parse a stored send timestamp into an absolute instant.
///
/// Rules, in order:
/// - empty or whitespace-only input yields `None`;
/// - input carrying a timezone marker (trailing `Z` or `±HH:MM`/`±HHMM`)
///   is parsed as-is;
/// - input with a time component but no marker is treated as UTC
///   (ambiguous legacy rows), dropping any trailing fractional seconds;
/// - a bare `YYYY-MM-DD` date is treated as UTC midnight;
/// - anything else yields `None`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if tz_marker_re().is_match(trimmed) {
        return DateTime::parse_from_rfc3339(trimmed)
            .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%z"))
            .ok();
    }

    // No marker: a time component means "assume UTC", a bare date means UTC midnight.
    let normalized = trimmed.replacen(' ', "T", 1);
    if normalized.contains('T') {
        let without_fraction = fraction_re().replace(&normalized, "");
        NaiveDateTime::parse_from_str(&without_fraction, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&without_fraction, "%Y-%m-%dT%H:%M"))
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    } else {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
    }
}

/// Calendar-date key (`YYYY-MM-DD`) of a stored timestamp in the given timezone.
///
/// Returns `None` for empty or unparseable input.
#[must_use]
pub fn local_date_key<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<String> {
    parse_timestamp(raw).map(|instant| {
        instant
            .with_timezone(tz)
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    })
}

/// Format a stored timestamp as `dd/mm/yyyy` in the given timezone.
///
/// Unparseable input is rendered as `-`.
#[must_use]
pub fn display_date_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String {
    parse_timestamp(raw).map_or_else(
        || "-".to_string(),
        |instant| instant.with_timezone(tz).date_naive().format("%d/%m/%Y").to_string(),
    )
}

/// Format a stored timestamp as `dd/mm/yyyy` in the local timezone.
#[must_use]
pub fn display_date(raw: &str) -> String {
    display_date_in(raw, &Local)
}

/// Format a stored timestamp as `dd/mm/yyyy HH:MM` in the given timezone.
#[must_use]
pub fn display_date_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String {
    parse_timestamp(raw).map_or_else(
        || "-".to_string(),
        |instant| {
            instant
                .with_timezone(tz)
                .naive_local()
                .format("%d/%m/%Y %H:%M")
                .to_string()
        },
    )
}

/// Format a stored timestamp as `dd/mm/yyyy HH:MM` in the local timezone.
#[must_use]
pub fn display_date_time(raw: &str) -> String {
    display_date_time_in(raw, &Local)
}

/// Short chart label (`d/m`, no zero padding) for a `YYYY-MM-DD` bucket key.
///
/// Input that is not a dashed date is returned unchanged.
#[must_use]
pub fn chart_date(bucket_key: &str) -> String {
    let parts: Vec<&str> = bucket_key.split('-').collect();
    if let [_, month, day] = parts.as_slice() {
        if let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) {
            return format!("{day}/{month}");
        }
    }
    bucket_key.to_string()
}

/// Long-form location label: `UF - Município`, the state alone, or the
/// unclassified placeholder.
#[must_use]
pub fn location_label(state_code: Option<&str>, municipality: Option<&str>) -> String {
    match (non_empty(state_code), non_empty(municipality)) {
        (Some(state), Some(town)) => format!("{state} - {town}"),
        (Some(state), None) => state.to_string(),
        _ => "Não classificado".to_string(),
    }
}

/// Compact location label for tables: `UF / Município` or `-`.
#[must_use]
pub fn location_short(state_code: Option<&str>, municipality: Option<&str>) -> String {
    match (non_empty(state_code), non_empty(municipality)) {
        (Some(state), Some(town)) => format!("{state} / {town}"),
        _ => "-".to_string(),
    }
}

/// Convert a form input (`YYYY-MM-DDTHH:MM`) into the stored ISO form.
///
/// The time defaults to midnight when absent; the stored value is marked UTC,
/// matching what the capture path writes.
#[must_use]
pub fn datetime_local_to_iso(input: &str) -> String {
    let (date_part, time_part) = match input.split_once('T') {
        Some((date, time)) => (date, time),
        None => (input, "00:00"),
    };

    let mut pieces = time_part.split(':');
    let hours = pieces.next().unwrap_or("00");
    let minutes = pieces.next().unwrap_or("00");

    format!("{date_part}T{hours:0>2}:{minutes:0>2}:00.000Z")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_marked_timestamps_as_is() {
        let parsed = parse_timestamp("2024-03-10T09:00:00.000Z").expect("should parse");
        assert_eq!(parsed.with_timezone(&Utc).to_rfc3339(), "2024-03-10T09:00:00+00:00");

        let offset = parse_timestamp("2024-03-10T09:00:00-03:00").expect("should parse");
        assert_eq!(offset.with_timezone(&Utc).to_rfc3339(), "2024-03-10T12:00:00+00:00");
    }

    #[test]
    fn unmarked_time_is_assumed_utc() {
        let parsed = parse_timestamp("2024-03-10T09:00:00").expect("should parse");
        assert_eq!(parsed.with_timezone(&Utc).to_rfc3339(), "2024-03-10T09:00:00+00:00");

        // Fractional seconds without a marker are dropped before parsing.
        let fractional = parse_timestamp("2024-03-10T09:00:00.123").expect("should parse");
        assert_eq!(fractional.with_timezone(&Utc).to_rfc3339(), "2024-03-10T09:00:00+00:00");

        let spaced = parse_timestamp("2024-03-10 09:00:00").expect("should parse");
        assert_eq!(spaced.with_timezone(&Utc).to_rfc3339(), "2024-03-10T09:00:00+00:00");
    }

    #[test]
    fn bare_date_is_utc_midnight() {
        let parsed = parse_timestamp("2024-03-10").expect("should parse");
        assert_eq!(parsed.with_timezone(&Utc).to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn date_key_follows_the_requested_timezone() {
        let recife = FixedOffset::west_opt(3 * 3600).expect("valid offset");
        // 01:30 UTC is still the previous evening at UTC-3.
        assert_eq!(
            local_date_key("2024-03-10T01:30:00Z", &recife).as_deref(),
            Some("2024-03-09")
        );
        assert_eq!(local_date_key("2024-03-10T01:30:00Z", &Utc).as_deref(), Some("2024-03-10"));
    }

    #[test]
    fn chart_date_strips_zero_padding() {
        assert_eq!(chart_date("2024-03-05"), "5/3");
        assert_eq!(chart_date("2024-12-25"), "25/12");
        assert_eq!(chart_date("whatever"), "whatever");
    }

    #[test]
    fn location_labels() {
        assert_eq!(location_label(Some("PI"), Some("Piripiri")), "PI - Piripiri");
        assert_eq!(location_label(Some("PI"), None), "PI");
        assert_eq!(location_label(None, Some("Piripiri")), "Não classificado");
        assert_eq!(location_label(Some(""), Some("")), "Não classificado");
        assert_eq!(location_short(Some("PI"), Some("Piripiri")), "PI / Piripiri");
        assert_eq!(location_short(Some("PI"), None), "-");
    }

    #[test]
    fn datetime_local_to_iso_pads_and_marks_utc() {
        assert_eq!(datetime_local_to_iso("2024-03-10T14:30"), "2024-03-10T14:30:00.000Z");
        assert_eq!(datetime_local_to_iso("2024-03-10"), "2024-03-10T00:00:00.000Z");
        assert_eq!(datetime_local_to_iso("2024-03-10T9:5"), "2024-03-10T09:05:00.000Z");
    }
}
