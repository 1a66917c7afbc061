// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Agora Fetch
//!
//! The resilient request layer for the Agora MCP server.
//!
//! This crate owns the two stateful components everything else routes
//! through:
//!
//! - [`HttpClient`] - the request engine: per-request header construction, a
//!   session cookie jar, per-attempt timeout and cooperative cancellation,
//!   exponential-backoff retries for transient upstream failures, a
//!   TTL-bounded response cache, and classification of failures into
//!   [`FetchError`] kinds.
//! - [`SiteState`] - a registry mapping normalized site origins to memoized
//!   client instances, resolving per-site authentication and login overrides
//!   and tracking the currently selected site.
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use agora_core::AuthMode;
//! use agora_fetch::SiteState;
//!
//! let state = SiteState::new(Duration::from_secs(15), AuthMode::None, Vec::new());
//! let (origin, client) = state.select_site("https://forum.example.com/")?;
//! let payload = client.get("/hot.json", None).await?;
//! ```

pub mod cache;
pub mod client;
pub mod cookies;
pub mod error;
pub mod retry;
pub mod site;

// Re-export key types at crate root
pub use client::{HttpClient, Payload};
pub use cookies::CookieJar;
pub use error::FetchError;
pub use retry::RetryPolicy;
pub use site::SiteState;
