//! Authentication models.
//!
//! Discourse supports two header-based authentication transports next to
//! anonymous access: an administrative `Api-Key` (optionally acting as a
//! named user) and a `User-Api-Key` scoped to a single end user. Which one
//! applies to a given site is resolved from [`SiteOverride`] records at
//! client-construction time; see `agora-fetch`'s site registry.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Mode
// ============================================================================

/// The authentication scheme selected for one site's HTTP client.
///
/// Exactly one variant is active per client instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMode {
    /// Anonymous access.
    #[default]
    None,
    /// Administrative API key, optionally acting as a named user.
    ApiKey {
        /// The API key sent as `Api-Key`.
        key: String,
        /// Optional acting user sent as `Api-Username`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
    /// API key scoped to one end user.
    UserApiKey {
        /// The key sent as `User-Api-Key`.
        key: String,
        /// Optional client id sent as `User-Api-Client-Id`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },
}

impl AuthMode {
    /// Returns true for anonymous access.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// ============================================================================
// Site Override
// ============================================================================

/// Per-site configuration record matched against requested origins.
///
/// Overrides are read from configuration and never mutated at runtime. A
/// record matches a target origin when its own `site` URL normalizes to the
/// same origin, or - failing that - shares the target's scheme and host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteOverride {
    /// Base URL or origin this override applies to.
    pub site: String,
    /// Administrative API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Acting username for the administrative key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_username: Option<String>,
    /// User-scoped API key. Takes precedence over `api_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_api_key: Option<String>,
    /// Client id for the user-scoped key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_api_client_id: Option<String>,
    /// Username for a future login flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for a future login flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Second-factor token for a future login flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_factor_token: Option<String>,
}

impl SiteOverride {
    /// Resolves the auth mode this override carries, if any.
    ///
    /// Precedence: user-scoped key over administrative key. Returns `None`
    /// when the override carries only login credentials.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        if let Some(key) = &self.user_api_key {
            return Some(AuthMode::UserApiKey {
                key: key.clone(),
                client_id: self.user_api_client_id.clone(),
            });
        }
        if let Some(key) = &self.api_key {
            return Some(AuthMode::ApiKey {
                key: key.clone(),
                username: self.api_username.clone(),
            });
        }
        None
    }

    /// Resolves stored login credentials, present only when both username
    /// and password are configured.
    pub fn login_credentials(&self) -> Option<LoginCredentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(LoginCredentials {
                username: username.clone(),
                password: password.clone(),
                second_factor_token: self.second_factor_token.clone(),
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Login Credentials
// ============================================================================

/// Login credentials resolved from configuration.
///
/// Stored on the client for a future authentication flow; no login request
/// is ever issued from these in the current scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Optional second-factor token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_factor_token: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
