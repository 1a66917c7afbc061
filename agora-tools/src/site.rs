//! Site selection tool.

use agora_fetch::{FetchError, SiteState};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Parameters for switching the active site.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectSiteParams {
    /// Site URL; any path, query, or fragment is dropped during
    /// normalization.
    pub url: String,
}

/// Confirmation of a site selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSelection {
    /// The normalized origin now active.
    pub site: String,
}

/// Selects the active site, building its client if needed.
pub fn execute(state: &SiteState, params: &SelectSiteParams) -> Result<SiteSelection, FetchError> {
    let (origin, _client) = state.select_site(&params.url)?;
    info!(site = %origin, "active site changed");
    Ok(SiteSelection { site: origin })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::AuthMode;
    use std::time::Duration;

    #[test]
    fn test_select_site_normalizes_and_activates() {
        let state = SiteState::new(Duration::from_secs(15), AuthMode::None, Vec::new());
        let params = SelectSiteParams {
            url: "https://forum.example.com/t/some-topic/42".to_string(),
        };

        let selection = execute(&state, &params).unwrap();
        assert_eq!(selection.site, "https://forum.example.com");
        assert_eq!(state.active_origin().as_deref(), Some("https://forum.example.com"));
    }

    #[test]
    fn test_select_site_rejects_invalid_url() {
        let state = SiteState::new(Duration::from_secs(15), AuthMode::None, Vec::new());
        let params = SelectSiteParams { url: "not a url".to_string() };
        assert!(execute(&state, &params).is_err());
    }
}
