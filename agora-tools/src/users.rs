//! User activity listing.

use agora_core::format_timestamp;
use agora_fetch::{FetchError, SiteState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::form_urlencoded;

/// Upper bound on returned actions.
const MAX_LIMIT: usize = 50;

/// Discourse user-action filters for posts (5) and replies (4).
const POST_ACTION_FILTER: &str = "4,5";

/// Parameters for listing a user's posts.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPostsParams {
    /// The username to fetch activity for.
    pub username: String,
    /// Maximum number of posts to return (clamped to 1..=50).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// One post or reply by the requested user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPostView {
    /// Post id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    /// Containing topic id.
    pub topic_id: u64,
    /// Topic title.
    pub title: String,
    /// Direct link to the post within its topic.
    pub url: String,
    /// Post excerpt as rendered by the forum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Creation time, formatted.
    pub created_at: String,
}

/// Lists a user's recent posts and replies on the active site.
pub async fn execute(
    state: &SiteState,
    params: UserPostsParams,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<UserPostView>, FetchError> {
    let (base, client) = state.ensure_selected_site()?;
    debug!(username = %params.username, "listing user posts");

    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("username", &params.username)
        .append_pair("filter", POST_ACTION_FILTER)
        .finish();
    let data = client
        .get(&format!("/user_actions.json?{encoded}"), cancel)
        .await?
        .into_json()?;

    Ok(reshape(&base, &data, params.limit.clamp(1, MAX_LIMIT)))
}

fn reshape(base: &str, data: &Value, limit: usize) -> Vec<UserPostView> {
    let actions = data
        .get("user_actions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    actions
        .iter()
        .take(limit)
        .filter_map(|action| {
            let topic_id = action.get("topic_id").and_then(Value::as_u64)?;
            let slug = action.get("slug").and_then(Value::as_str).unwrap_or_default();
            let post_number = action.get("post_number").and_then(Value::as_u64).unwrap_or(1);
            Some(UserPostView {
                post_id: action.get("post_id").and_then(Value::as_u64),
                topic_id,
                title: action
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                url: format!("{base}/t/{slug}/{topic_id}/{post_number}"),
                excerpt: action
                    .get("excerpt")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
                created_at: format_timestamp(
                    action.get("created_at").and_then(Value::as_str).unwrap_or(""),
                ),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reshape_user_actions() {
        let data = json!({
            "user_actions": [
                {
                    "post_id": 900,
                    "topic_id": 42,
                    "title": "A topic",
                    "slug": "a-topic",
                    "post_number": 5,
                    "excerpt": "what I said",
                    "created_at": "2025-10-07T08:00:00.000Z",
                },
            ],
        });

        let posts = reshape("https://forum.example.com", &data, 20);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id, Some(900));
        assert_eq!(posts[0].url, "https://forum.example.com/t/a-topic/42/5");
        assert_eq!(posts[0].excerpt.as_deref(), Some("what I said"));
        assert_eq!(posts[0].created_at, "2025-10-07 08:00");
    }

    #[test]
    fn test_reshape_respects_limit() {
        let actions: Vec<Value> = (1..=30)
            .map(|i| json!({"topic_id": i, "slug": "s", "post_number": 1}))
            .collect();
        let data = json!({"user_actions": actions});
        assert_eq!(reshape("https://forum.example.com", &data, 20).len(), 20);
    }

    #[test]
    fn test_reshape_skips_actions_without_topic() {
        let data = json!({"user_actions": [{"post_id": 1}]});
        assert!(reshape("https://forum.example.com", &data, 20).is_empty());
    }

    #[test]
    fn test_reshape_empty_payload() {
        assert!(reshape("https://forum.example.com", &json!({}), 20).is_empty());
    }
}
