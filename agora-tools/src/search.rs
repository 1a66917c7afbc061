//! Full-text forum search.
//!
//! Builds a `/search.json` query from the structured parameters and joins
//! the returned topics with their first matching post's blurb.

use agora_core::{CoreError, category_by_name};
use agora_fetch::{FetchError, SiteState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::form_urlencoded;

/// Hard cap on returned results, matching the upstream page size.
const MAX_RESULTS: usize = 50;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrder {
    /// Upstream relevance ranking (the default; adds no order modifier).
    #[default]
    Relevance,
    /// Most liked first.
    Likes,
    /// Most recent post first.
    Latest,
    /// Most viewed first.
    Views,
    /// Most recently created topic first.
    LatestTopic,
}

impl SearchOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Likes => "likes",
            Self::Latest => "latest",
            Self::Views => "views",
            Self::LatestTopic => "latest_topic",
        }
    }
}

/// Parameters for the search tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query; may be empty when filters are provided.
    #[serde(default)]
    pub query: String,
    /// Maximum number of results (clamped to 1..=50).
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Sort order.
    #[serde(default)]
    pub order: SearchOrder,
    /// Category name to search within, resolved through the category table.
    #[serde(default)]
    pub category: Option<String>,
    /// Restrict to posts by this username.
    #[serde(default)]
    pub author: Option<String>,
    /// Only posts after this date (`YYYY-MM-DD`).
    #[serde(default)]
    pub after: Option<String>,
    /// Only posts before this date (`YYYY-MM-DD`).
    #[serde(default)]
    pub before: Option<String>,
}

fn default_max_results() -> usize {
    MAX_RESULTS
}

/// One search hit: a topic, optionally joined with its matching post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Topic id.
    pub topic_id: u64,
    /// Direct link, pointing at the matching post when one is known.
    pub url: String,
    /// Topic title.
    pub title: String,
    /// Post number of the matching post within the topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_number: Option<u64>,
    /// Highlighted excerpt of the matching post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,
}

/// Runs a search against the active site.
pub async fn execute(
    state: &SiteState,
    params: SearchParams,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<SearchResult>, FetchError> {
    let (base, client) = state.ensure_selected_site()?;
    let query = build_query(&params)?;
    debug!(%query, "running search");

    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("expanded", "true")
        .append_pair("q", &query)
        .finish();
    let data = client
        .get(&format!("/search.json?{encoded}"), cancel)
        .await?
        .into_json()?;

    let cap = params.max_results.clamp(1, MAX_RESULTS);
    Ok(reshape(&base, &data, cap))
}

/// Folds the structured filters into one Discourse query string.
///
/// An unknown category name fails with [`CoreError::CategoryNotFound`]
/// before any network traffic happens.
pub fn build_query(params: &SearchParams) -> Result<String, CoreError> {
    let mut parts: Vec<String> = Vec::new();
    if !params.query.is_empty() {
        parts.push(params.query.clone());
    }
    if let Some(author) = &params.author {
        parts.push(format!("@{author}"));
    }
    if let Some(after) = &params.after {
        parts.push(format!("after:{after}"));
    }
    if let Some(before) = &params.before {
        parts.push(format!("before:{before}"));
    }
    if let Some(category) = &params.category {
        let info = category_by_name(category)
            .ok_or_else(|| CoreError::CategoryNotFound(category.clone()))?;
        parts.push(format!("category:{}", info.id));
    }
    if params.order != SearchOrder::Relevance {
        parts.push(format!("order:{}", params.order.as_str()));
    }
    Ok(parts.join(" "))
}

/// Joins topics with the first post that matched inside each one.
fn reshape(base: &str, data: &Value, cap: usize) -> Vec<SearchResult> {
    let topics = data
        .get("topics")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let posts = data
        .get("posts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // First matching post per topic wins.
    let mut by_topic: HashMap<u64, (&str, u64)> = HashMap::new();
    for post in posts {
        let Some(topic_id) = post.get("topic_id").and_then(Value::as_u64) else {
            continue;
        };
        let Some(blurb) = post.get("blurb").and_then(Value::as_str) else {
            continue;
        };
        let post_number = post.get("post_number").and_then(Value::as_u64).unwrap_or(1);
        by_topic.entry(topic_id).or_insert((blurb, post_number));
    }

    topics
        .iter()
        .take(cap)
        .filter_map(|topic| {
            let id = topic.get("id").and_then(Value::as_u64)?;
            let slug = topic.get("slug").and_then(Value::as_str).unwrap_or_default();
            let title = topic
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let matched = by_topic.get(&id);
            let suffix = matched.map(|(_, n)| format!("/{n}")).unwrap_or_default();
            Some(SearchResult {
                topic_id: id,
                url: format!("{base}/t/{slug}/{id}{suffix}"),
                title,
                post_number: matched.map(|(_, n)| *n),
                blurb: matched.map(|(blurb, _)| (*blurb).to_string()),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
