//! Domain models for Agora.
//!
//! This module contains the data structures describing how Agora
//! authenticates against a Discourse site: the per-client authentication
//! mode, the per-site configuration overrides it is resolved from, and the
//! stored (but never submitted) login credentials.
//!
//! ## Submodules
//!
//! - [`auth`] - Authentication types (AuthMode, SiteOverride, LoginCredentials)

mod auth;

// Re-export everything at the models level
pub use auth::{AuthMode, LoginCredentials, SiteOverride};
