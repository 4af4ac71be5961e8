//! Time utilities for rate snapshots.

use chrono::{DateTime, NaiveDate, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse the calendar date from the leading `YYYY-MM-DD` of a feed
/// timestamp such as `2024-05-17T11:30:00+03:00`.
pub fn calendar_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Human-readable age of a timestamp relative to now.
pub fn age_label(at: Timestamp) -> String {
    let secs = (now() - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3600),
    }
}
