//! Per-site client registry and credential resolution.
//!
//! [`SiteState`] maps normalized site origins to memoized [`HttpClient`]
//! instances. The registry grows monotonically: at most one client per
//! origin, never evicted, so cookie jars and caches stay scoped to their
//! origin for the process lifetime. It also tracks which site is currently
//! active; the selection starts unset and only an explicit
//! [`SiteState::select_site`] changes it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use agora_core::{AuthMode, CoreError, LoginCredentials, SiteOverride};
use tracing::debug;
use url::Url;

use crate::client::HttpClient;
use crate::error::FetchError;

/// Registry of per-origin HTTP clients with auth override resolution.
#[derive(Debug)]
pub struct SiteState {
    timeout: Duration,
    default_auth: AuthMode,
    overrides: Vec<SiteOverride>,
    clients: Mutex<HashMap<String, Arc<HttpClient>>>,
    active: Mutex<Option<String>>,
}

impl SiteState {
    /// Creates a registry with the shared timeout, default auth mode, and
    /// configured per-site overrides.
    pub fn new(timeout: Duration, default_auth: AuthMode, overrides: Vec<SiteOverride>) -> Self {
        Self {
            timeout,
            default_auth,
            overrides,
            clients: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
        }
    }

    /// Normalizes a URL to its origin: scheme + host (+ non-default port),
    /// no path, query, fragment, or trailing slash.
    pub fn normalize_origin(url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|err| CoreError::InvalidConfig(format!("invalid site URL {url}: {err}")))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(
                CoreError::InvalidConfig(format!("site URL {url} has no origin")).into()
            );
        }
        Ok(origin.ascii_serialization())
    }

    /// Builds or reuses the client for a site without changing the active
    /// selection.
    pub fn build_client_for_site(
        &self,
        url: &str,
    ) -> Result<(String, Arc<HttpClient>), FetchError> {
        let origin = Self::normalize_origin(url)?;

        let mut clients = lock(&self.clients);
        if let Some(client) = clients.get(&origin) {
            return Ok((origin, Arc::clone(client)));
        }

        let auth = self.resolve_auth(&origin);
        let login = self.resolve_login(&origin);
        debug!(%origin, auth = auth_label(&auth), has_login = login.is_some(), "building client for site");

        let client = Arc::new(HttpClient::new(&origin, self.timeout, auth, login)?);
        clients.insert(origin.clone(), Arc::clone(&client));
        Ok((origin, client))
    }

    /// Normalizes the URL, builds or reuses its client, and makes it the
    /// active selection.
    pub fn select_site(&self, url: &str) -> Result<(String, Arc<HttpClient>), FetchError> {
        let (origin, client) = self.build_client_for_site(url)?;
        *lock(&self.active) = Some(origin.clone());
        Ok((origin, client))
    }

    /// Returns the active selection, or [`CoreError::NoSiteSelected`] when
    /// no site has been chosen yet.
    pub fn ensure_selected_site(&self) -> Result<(String, Arc<HttpClient>), FetchError> {
        let origin = lock(&self.active).clone().ok_or(CoreError::NoSiteSelected)?;
        let client = lock(&self.clients)
            .get(&origin)
            .map(Arc::clone)
            .ok_or(CoreError::NoSiteSelected)?;
        Ok((origin, client))
    }

    /// The currently selected origin, if any.
    pub fn active_origin(&self) -> Option<String> {
        lock(&self.active).clone()
    }

    /// Resolves the auth mode for an origin.
    ///
    /// Precedence: matched override's user-scoped key, then its
    /// administrative key, then the configured default.
    fn resolve_auth(&self, origin: &str) -> AuthMode {
        self.matching_override(origin)
            .and_then(SiteOverride::auth_mode)
            .unwrap_or_else(|| self.default_auth.clone())
    }

    /// Resolves stored login credentials for an origin, if the matched
    /// override carries both a username and a password.
    fn resolve_login(&self, origin: &str) -> Option<LoginCredentials> {
        self.matching_override(origin)
            .and_then(SiteOverride::login_credentials)
    }

    /// Finds the first override matching an origin: exact normalized-origin
    /// equality, or a scheme+host+port fallback that tolerates overrides
    /// configured with a sub-path URL.
    fn matching_override(&self, origin: &str) -> Option<&SiteOverride> {
        self.overrides.iter().find(|o| {
            Self::normalize_origin(&o.site).is_ok_and(|base| base == origin)
                || same_scheme_host(&o.site, origin)
        })
    }
}

fn auth_label(auth: &AuthMode) -> &'static str {
    match auth {
        AuthMode::None => "none",
        AuthMode::ApiKey { .. } => "api_key",
        AuthMode::UserApiKey { .. } => "user_api_key",
    }
}

/// Whether two URLs share scheme, host, and effective port.
///
/// Ports are part of the credential scope: an override configured for a
/// non-default port must not apply to the default-port origin on the same
/// hostname.
fn same_scheme_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme()
                && a.host_str().is_some()
                && a.host_str() == b.host_str()
                && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_overrides(overrides: Vec<SiteOverride>) -> SiteState {
        SiteState::new(Duration::from_secs(15), AuthMode::None, overrides)
    }

    #[test]
    fn test_normalize_origin_strips_path_query_fragment() {
        for url in [
            "https://forum.example.com",
            "https://forum.example.com/",
            "https://forum.example.com/t/some-topic/42?page=2#post_3",
        ] {
            assert_eq!(
                SiteState::normalize_origin(url).unwrap(),
                "https://forum.example.com"
            );
        }
    }

    #[test]
    fn test_normalize_origin_keeps_non_default_port() {
        assert_eq!(
            SiteState::normalize_origin("http://localhost:8080/path").unwrap(),
            "http://localhost:8080"
        );
        // Default port is dropped.
        assert_eq!(
            SiteState::normalize_origin("https://forum.example.com:443/").unwrap(),
            "https://forum.example.com"
        );
    }

    #[test]
    fn test_normalize_origin_rejects_invalid_urls() {
        assert!(SiteState::normalize_origin("not a url").is_err());
        assert!(SiteState::normalize_origin("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_clients_are_memoized_per_origin() {
        let state = state_with_overrides(Vec::new());
        let (_, a) = state.select_site("https://forum.example.com/").unwrap();
        let (_, b) = state.select_site("https://forum.example.com/t/topic/1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let (_, other) = state.select_site("https://other.example.com/").unwrap();
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_ensure_selected_site_before_selection_fails() {
        let state = state_with_overrides(Vec::new());
        match state.ensure_selected_site() {
            Err(FetchError::Core(CoreError::NoSiteSelected)) => {}
            other => panic!("expected NoSiteSelected, got {other:?}"),
        }
    }

    #[test]
    fn test_build_client_does_not_change_active_site() {
        let state = state_with_overrides(Vec::new());
        state.build_client_for_site("https://forum.example.com/").unwrap();
        assert!(state.active_origin().is_none());

        state.select_site("https://forum.example.com/").unwrap();
        assert_eq!(state.active_origin().as_deref(), Some("https://forum.example.com"));

        // Pre-warming another site leaves the selection alone.
        state.build_client_for_site("https://other.example.com/").unwrap();
        assert_eq!(state.active_origin().as_deref(), Some("https://forum.example.com"));
    }

    #[test]
    fn test_selection_survives_reselect_only() {
        let state = state_with_overrides(Vec::new());
        state.select_site("https://a.example.com/").unwrap();
        state.select_site("https://b.example.com/").unwrap();
        assert_eq!(state.active_origin().as_deref(), Some("https://b.example.com"));
    }

    #[test]
    fn test_override_auth_applies_to_matching_origin() {
        let state = state_with_overrides(vec![SiteOverride {
            site: "https://forum.example.com".to_string(),
            api_key: Some("admin".to_string()),
            ..Default::default()
        }]);

        let (_, client) = state.select_site("https://forum.example.com/").unwrap();
        assert!(matches!(client.auth(), AuthMode::ApiKey { .. }));

        let (_, other) = state.select_site("https://other.example.com/").unwrap();
        assert!(other.auth().is_none());
    }

    #[test]
    fn test_override_with_sub_path_matches_origin() {
        let state = state_with_overrides(vec![SiteOverride {
            site: "https://forum.example.com/sub-path".to_string(),
            user_api_key: Some("user".to_string()),
            ..Default::default()
        }]);

        let (_, client) = state.select_site("https://forum.example.com").unwrap();
        assert!(matches!(client.auth(), AuthMode::UserApiKey { .. }));
    }

    #[test]
    fn test_override_on_other_port_does_not_match() {
        let state = state_with_overrides(vec![SiteOverride {
            site: "https://forum.example.com:8443/admin".to_string(),
            user_api_key: Some("scoped".to_string()),
            ..Default::default()
        }]);

        // Default-port origin on the same hostname stays anonymous.
        let (_, client) = state.select_site("https://forum.example.com/").unwrap();
        assert!(client.auth().is_none());

        // The override still applies to its own origin.
        let (_, scoped) = state.select_site("https://forum.example.com:8443/").unwrap();
        assert!(matches!(scoped.auth(), AuthMode::UserApiKey { .. }));
    }

    #[test]
    fn test_user_api_key_wins_over_api_key() {
        let state = state_with_overrides(vec![SiteOverride {
            site: "https://forum.example.com".to_string(),
            api_key: Some("admin".to_string()),
            user_api_key: Some("user".to_string()),
            user_api_client_id: Some("agora-1".to_string()),
            ..Default::default()
        }]);

        let (_, client) = state.select_site("https://forum.example.com/").unwrap();
        match client.auth() {
            AuthMode::UserApiKey { key, client_id } => {
                assert_eq!(key, "user");
                assert_eq!(client_id.as_deref(), Some("agora-1"));
            }
            other => panic!("expected user_api_key, got {other:?}"),
        }
    }

    #[test]
    fn test_login_credentials_are_stored_on_client() {
        let state = state_with_overrides(vec![SiteOverride {
            site: "https://forum.example.com".to_string(),
            username: Some("alice".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        }]);

        let (_, client) = state.select_site("https://forum.example.com/").unwrap();
        let creds = client.login_credentials().unwrap();
        assert_eq!(creds.username, "alice");
    }
}
