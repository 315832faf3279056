//! Small shared helpers: ISO-8601 timestamps used across every persisted row.

use chrono::Utc;

pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}
