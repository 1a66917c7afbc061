//! Fetch error types and transport-failure classification.

use std::time::Duration;

use agora_core::CoreError;
use thiserror::Error;

/// Error type for fetch operations.
///
/// Heterogeneous failure modes are classified into these kinds so callers
/// can act on them: only [`FetchError::Upstream`] with status 429 or >= 500
/// is retried internally; everything else surfaces on first occurrence.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream returned a non-success HTTP status.
    #[error("{message}")]
    Upstream {
        /// The HTTP status code.
        status: u16,
        /// Human-readable message (`HTTP <status>`).
        message: String,
        /// Best-effort decoded error body: parsed JSON when the body is
        /// valid JSON, the raw text otherwise.
        body: serde_json::Value,
    },

    /// The configured deadline elapsed before the attempt completed.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure (DNS, connectivity, TLS).
    #[error("{0}")]
    Network(String),

    /// The caller cancelled the request.
    #[error("request cancelled by caller")]
    Cancelled,

    /// Any other failure, preserving the original name and message.
    #[error("{name}: {message}")]
    Unclassified {
        /// Name of the original failure.
        name: String,
        /// Original failure message.
        message: String,
    },

    /// Core error (configuration, lookups, serialization).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FetchError {
    /// Returns the upstream HTTP status, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Classifies a transport-level `reqwest` failure.
///
/// reqwest folds every failure mode into one opaque error type; split it
/// back out so callers see the taxonomy the rest of the crate promises.
pub(crate) fn classify_transport(err: &reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout(timeout);
    }
    if err.is_connect() {
        return FetchError::Network(format!(
            "network error: {err}. Possible causes: DNS resolution failure, \
             network connectivity issue, TLS error, or server unreachable"
        ));
    }
    if err.is_decode() {
        return FetchError::Unclassified {
            name: "decode error".to_string(),
            message: err.to_string(),
        };
    }
    FetchError::Unclassified {
        name: "request error".to_string(),
        message: err.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
