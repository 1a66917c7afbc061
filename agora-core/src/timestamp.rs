//! Timestamp formatting for tool output.
//!
//! Discourse reports RFC 3339 timestamps with sub-second precision
//! (`2025-09-20T14:03:25.000Z`); tool output renders them as
//! `2025-09-20 14:03` in UTC. Input that does not parse is passed through
//! unchanged rather than dropped.

use chrono::{DateTime, Utc};

/// Formats an RFC 3339 timestamp as `YYYY-MM-DD HH:MM` in UTC.
///
/// Returns the input unchanged when it is empty or unparseable.
pub fn format_timestamp(timestamp: &str) -> String {
    if timestamp.is_empty() {
        return String::new();
    }

    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
