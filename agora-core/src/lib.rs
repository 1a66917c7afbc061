// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Agora Core
//!
//! Core types, models, and utilities for the Agora MCP server.
//!
//! This crate provides the foundational abstractions used across all other
//! Agora crates, including:
//!
//! - Authentication models ([`AuthMode`], [`SiteOverride`], [`LoginCredentials`])
//! - Error types ([`CoreError`])
//! - The static forum category table ([`categories`])
//! - Timestamp formatting ([`timestamp`])

pub mod categories;
pub mod error;
pub mod models;
pub mod timestamp;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{AuthMode, LoginCredentials, SiteOverride};

// Re-export category lookups
pub use categories::{CategoryInfo, category_by_name, category_name};

// Re-export timestamp formatting
pub use timestamp::format_timestamp;
