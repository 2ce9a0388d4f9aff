//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for use in file names (no separators that upset
/// filesystems, second resolution)
pub fn file_stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d-%H%M%S").to_string()
}
