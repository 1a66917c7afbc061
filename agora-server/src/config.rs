//! Server configuration.
//!
//! A YAML config file provides the default site, timeout, listen address,
//! and auth overrides; command-line flags override individual file values.

use std::path::Path;
use std::time::Duration;

use agora_core::{AuthMode, SiteOverride};
use anyhow::Context;
use serde::Deserialize;

/// Site selected at startup when none is configured.
pub const DEFAULT_SITE: &str = "https://www.uscardforum.com/";
/// Per-attempt request timeout when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Listen address when none is configured.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Resolved server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Site to select at startup.
    pub site: String,
    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Address the HTTP server binds to.
    pub listen: String,
    /// Auth mode for sites without a matching override.
    pub default_auth: AuthMode,
    /// Per-site credential overrides.
    pub auth_overrides: Vec<SiteOverride>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            listen: DEFAULT_LISTEN.to_string(),
            default_auth: AuthMode::None,
            auth_overrides: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file. An empty file yields the
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// The configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
