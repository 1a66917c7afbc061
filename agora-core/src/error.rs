//! Core error types for Agora.

use thiserror::Error;

/// Core error type for Agora operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation required an active site selection that does not exist.
    #[error("no site selected; call discourse_select_site first")]
    NoSiteSelected,

    /// A category name did not resolve against the category table.
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from an API response.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
