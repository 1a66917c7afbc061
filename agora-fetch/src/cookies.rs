//! Session cookie jar.
//!
//! One jar belongs to exactly one [`HttpClient`](crate::HttpClient) and
//! accumulates cookies for the lifetime of that instance: entries are never
//! expired or removed, and a same-name write overwrites the previous value.

use std::collections::BTreeMap;

use tracing::debug;

/// Accumulated session cookies for one client instance.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests one Set-Cookie header value.
    ///
    /// The value may be a single cookie or several folded into one header by
    /// an intermediary. Folded values are split on commas that are not
    /// immediately followed by a space, which keeps embedded expiry dates
    /// (`expires=Thu, 01 Jan 1970 ...`) intact. Only the `name=value` part
    /// before the first `;` is kept; attributes are discarded.
    pub fn ingest(&mut self, header_value: &str) {
        for fragment in split_folded_cookies(header_value) {
            let pair = fragment.split(';').next().unwrap_or("").trim();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            debug!(cookie = name, "stored cookie");
            self.cookies.insert(name.to_string(), value.trim().to_string());
        }
    }

    /// Builds a `Cookie` request header value, or `None` when the jar is
    /// empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Number of stored cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether the jar is empty.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Returns the stored value for a cookie name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Splits a folded Set-Cookie value on commas not followed by a space.
fn split_folded_cookies(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b',' && bytes.get(i + 1) != Some(&b' ') {
            parts.push(&value[start..i]);
            start = i + 1;
        }
    }
    parts.push(&value[start..]);
    parts
}

// ============================================================================
// Tests
// ============================================================================
