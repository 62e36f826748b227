//! Aggregation engine for dashboard statistics.
//!
//! Every function here is a pure, synchronous transformation over an
//! already-fetched slice of email records: nothing is mutated, nothing
//! suspends, and malformed individual fields are skipped rather than
//! surfaced as errors. Running a function twice over the same input yields
//! identical output.

use chrono::{DateTime, Duration, TimeZone};
use std::collections::HashMap;

use crate::formatters::local_date_key;
use crate::models::{DashboardStats, EmailRecord, RecipientCount, StateCount, TrendPoint};

/// Number of days covered by the send trend, including today.
pub const TREND_DAYS: usize = 7;

/// Default number of entries returned by the recipient ranking.
pub const DEFAULT_TOP_RECIPIENTS: usize = 3;

/// Total, classified and pending counts.
///
/// Empty input yields zeroes across the board.
#[must_use]
pub fn dashboard_stats(rows: &[EmailRecord]) -> DashboardStats {
    let total = rows.len();
    let classified = rows.iter().filter(|row| row.classified).count();

    DashboardStats {
        total,
        classified,
        pending: total - classified,
    }
}

/// Record counts grouped by assigned state code, most frequent first.
///
/// Rows without a state code are excluded; the code is compared exactly
/// (state codes are canonical, no normalization). Ties keep first-seen
/// order and the full result is returned without truncation.
#[must_use]
pub fn counts_by_state(rows: &[EmailRecord]) -> Vec<StateCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for row in rows {
        let Some(code) = row.state_code.as_deref() else {
            continue;
        };
        if code.is_empty() {
            continue;
        }
        if !counts.contains_key(code) {
            order.push(code);
        }
        *counts.entry(code).or_insert(0) += 1;
    }

    let mut result: Vec<StateCount> = order
        .into_iter()
        .map(|code| StateCount {
            state_code: code.to_string(),
            count: counts[code],
        })
        .collect();

    // Stable sort: equal counts stay in first-seen order.
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// Most frequent recipient addresses across all records.
///
/// The recipient field holds one or more comma-separated addresses; each is
/// counted separately. Addresses are grouped case-insensitively and the
/// first-encountered casing is kept as the display form. Tokens without an
/// `@` are dropped silently. Ties keep insertion order under the stable
/// descending sort.
#[must_use]
pub fn top_recipients(rows: &[EmailRecord], limit: usize) -> Vec<RecipientCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut display: HashMap<String, String> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for row in rows {
        for token in row.recipient.split(',') {
            let address = token.trim();
            if address.is_empty() || !address.contains('@') {
                continue;
            }

            let normalized = address.to_lowercase();
            if !counts.contains_key(&normalized) {
                order.push(normalized.clone());
                display.insert(normalized.clone(), address.to_string());
            }
            *counts.entry(normalized).or_insert(0) += 1;
        }
    }

    let mut result: Vec<RecipientCount> = order
        .into_iter()
        .map(|normalized| RecipientCount {
            address: display
                .get(&normalized)
                .cloned()
                .unwrap_or_else(|| normalized.clone()),
            count: counts[&normalized],
        })
        .collect();

    result.sort_by(|a, b| b.count.cmp(&a.count));
    result.truncate(limit);
    result
}

/// Fixed seven-day send trend ending on the calendar date of `now`.
///
/// Buckets are keyed by calendar date in the timezone of `now` and returned
/// oldest first, always exactly [`TREND_DAYS`] entries. Each record's send
/// timestamp is resolved to that timezone's calendar date; records outside
/// the window, or with an empty or unparseable timestamp, are skipped.
#[must_use]
pub fn send_trend<Tz: TimeZone>(rows: &[EmailRecord], now: &DateTime<Tz>) -> Vec<TrendPoint> {
    let today = now.date_naive();
    let tz = now.timezone();

    let mut buckets: Vec<TrendPoint> = (0..TREND_DAYS)
        .rev()
        .map(|days_back| TrendPoint {
            date: (today - Duration::days(days_back as i64))
                .format("%Y-%m-%d")
                .to_string(),
            count: 0,
        })
        .collect();

    for row in rows {
        let Some(key) = local_date_key(&row.sent_at, &tz) else {
            continue;
        };
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.date == key) {
            bucket.count += 1;
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn record(recipient: &str, state_code: Option<&str>, classified: bool) -> EmailRecord {
        EmailRecord {
            id: "x".to_string(),
            sender: "sender@example.com".to_string(),
            recipient: recipient.to_string(),
            subject: "subject".to_string(),
            body: None,
            sent_at: "2024-03-10T09:00:00Z".to_string(),
            state_code: state_code.map(ToString::to_string),
            municipality: None,
            classified,
            created_by: None,
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn stats_on_empty_input_are_zero() {
        let stats = dashboard_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.classified, 0);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn state_counts_ignore_missing_codes_and_keep_tie_order() {
        let rows = vec![
            record("a@x.com", Some("PI"), true),
            record("a@x.com", None, false),
            record("a@x.com", Some(""), false),
            record("a@x.com", Some("CE"), true),
            record("a@x.com", Some("PI"), true),
            record("a@x.com", Some("BA"), true),
        ];

        let counts = counts_by_state(&rows);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].state_code, "PI");
        assert_eq!(counts[0].count, 2);
        // CE and BA tie at 1; CE was seen first.
        assert_eq!(counts[1].state_code, "CE");
        assert_eq!(counts[2].state_code, "BA");
    }

    #[test]
    fn recipients_are_deduplicated_case_insensitively() {
        let rows = vec![record("A@x.com, b@X.com", None, false), record("a@X.COM", None, false)];

        let top = top_recipients(&rows, DEFAULT_TOP_RECIPIENTS);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].address, "A@x.com");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].address, "b@X.com");
        assert_eq!(top[1].count, 1);
    }

    #[test]
    fn trend_buckets_follow_the_reference_timezone() {
        let tz = FixedOffset::west_opt(3 * 3600).expect("valid offset");
        let now = tz.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("valid time");

        let mut row = record("a@x.com", None, false);
        row.sent_at = "2024-03-10T09:00:00.000Z".to_string();

        let trend = send_trend(&[row], &now);
        assert_eq!(trend.len(), TREND_DAYS);
        assert_eq!(trend[0].date, "2024-03-04");
        assert_eq!(trend[6].date, "2024-03-10");
        assert_eq!(trend[6].count, 1);
        assert!(trend[..6].iter().all(|point| point.count == 0));
    }

    #[test]
    fn trend_skips_unparseable_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).single().expect("valid time");

        let mut bad = record("a@x.com", None, false);
        bad.sent_at = String::new();
        let mut garbled = record("a@x.com", None, false);
        garbled.sent_at = "yesterday-ish".to_string();

        let trend = send_trend(&[bad, garbled], &now);
        assert!(trend.iter().all(|point| point.count == 0));
    }
}
