//! TTL-bounded response cache.
//!
//! Keyed by the fully resolved request URL and owned by one
//! [`HttpClient`](crate::HttpClient). Entries are invalidated lazily: the
//! expiry is checked at read time and there is no background eviction, so
//! the map holds at most one entry per distinct cached URL for the client's
//! lifetime.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::client::Payload;

/// One cached decoded payload.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Payload,
    expires_at: Instant,
}

/// TTL cache of decoded payloads, keyed by resolved request URL.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the stored payload when the entry is still fresh
    /// (`now < expires_at`).
    pub fn fresh(&self, url: &str, now: Instant) -> Option<Payload> {
        let entry = self.entries.get(url)?;
        if now < entry.expires_at {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Stores a payload, replacing any previous entry for the URL.
    pub fn store(&mut self, url: String, payload: Payload, expires_at: Instant) {
        self.entries.insert(url, CacheEntry { payload, expires_at });
    }

    /// Number of entries, fresh or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
