//! Shared utility functions

use chrono::{DateTime, Utc};

/// Current UTC time truncated to whole milliseconds.
///
/// Stored timestamps are epoch millis, so anything finer would not survive a
/// write/read cycle.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
