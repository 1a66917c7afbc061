//! Topic reading and topic listings.
//!
//! `read_topic` reshapes one topic with its posts (HTML stripped, long
//! bodies truncated); `hot_topics` and `top_topics` reshape the forum's
//! ranked topic lists.

use agora_core::{category_name, format_timestamp};
use agora_fetch::{FetchError, SiteState};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound on posts returned from one topic.
const MAX_POSTS: usize = 100;
/// Upper bound on topics returned from a listing.
const MAX_LISTED: usize = 50;
/// Post bodies are cut to this many characters after HTML stripping.
const BODY_LIMIT: usize = 2000;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

// ============================================================================
// Read topic
// ============================================================================

/// Parameters for reading one topic.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadTopicParams {
    /// Topic id.
    pub topic_id: u64,
    /// Start reading at this post number instead of the beginning.
    #[serde(default)]
    pub post_number: Option<u64>,
    /// Maximum number of posts to return (clamped to 1..=100).
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
}

fn default_max_posts() -> usize {
    20
}

/// A reshaped topic with its posts.
#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    /// Topic id.
    pub topic_id: u64,
    /// Topic title.
    pub title: String,
    /// Direct link to the topic.
    pub url: String,
    /// Total number of posts in the topic.
    pub posts_count: u64,
    /// View count.
    pub views: u64,
    /// Like count across the topic.
    pub like_count: u64,
    /// Resolved category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Creation time, formatted.
    pub created_at: String,
    /// The reshaped posts.
    pub posts: Vec<PostView>,
}

/// One post within a topic view.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    /// Position within the topic.
    pub post_number: u64,
    /// Author username.
    pub username: String,
    /// Creation time, formatted.
    pub created_at: String,
    /// Post body with HTML stripped and length capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooked: Option<String>,
    /// Like count.
    pub like_count: u64,
}

/// Reads one topic from the active site.
pub async fn read_topic(
    state: &SiteState,
    params: ReadTopicParams,
    cancel: Option<&CancellationToken>,
) -> Result<TopicView, FetchError> {
    let (base, client) = state.ensure_selected_site()?;
    let path = match params.post_number {
        Some(post) => format!("/t/{}/{post}.json", params.topic_id),
        None => format!("/t/{}.json", params.topic_id),
    };
    debug!(topic_id = params.topic_id, %path, "reading topic");

    let data = client.get(&path, cancel).await?.into_json()?;
    Ok(reshape_topic(&base, &data, params.max_posts.clamp(1, MAX_POSTS)))
}

fn reshape_topic(base: &str, data: &Value, max_posts: usize) -> TopicView {
    let id = data.get("id").and_then(Value::as_u64).unwrap_or_default();
    let slug = data.get("slug").and_then(Value::as_str).unwrap_or_default();
    let posts = data
        .get("post_stream")
        .and_then(|s| s.get("posts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    TopicView {
        topic_id: id,
        title: str_field(data, "title"),
        url: format!("{base}/t/{slug}/{id}"),
        posts_count: u64_field(data, "posts_count"),
        views: u64_field(data, "views"),
        like_count: u64_field(data, "like_count"),
        category: data
            .get("category_id")
            .and_then(Value::as_u64)
            .and_then(|cid| u32::try_from(cid).ok())
            .map(category_name),
        created_at: format_timestamp(&str_field(data, "created_at")),
        posts: posts
            .iter()
            .take(max_posts)
            .map(|post| PostView {
                post_number: u64_field(post, "post_number"),
                username: str_field(post, "username"),
                created_at: format_timestamp(&str_field(post, "created_at")),
                cooked: post
                    .get("cooked")
                    .and_then(Value::as_str)
                    .map(|html| truncate(&strip_html(html), BODY_LIMIT)),
                like_count: u64_field(post, "like_count"),
            })
            .collect(),
    }
}

// ============================================================================
// Topic listings
// ============================================================================

/// Parameters for the hot-topics listing.
#[derive(Debug, Clone, Deserialize)]
pub struct HotTopicsParams {
    /// Maximum number of topics to return (clamped to 1..=50).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for HotTopicsParams {
    fn default() -> Self {
        Self { limit: default_limit() }
    }
}

/// Ranking window for the top-topics listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopPeriod {
    /// Past day.
    Daily,
    /// Past week (the default).
    #[default]
    Weekly,
    /// Past month.
    Monthly,
    /// Past quarter.
    Quarterly,
    /// Past year.
    Yearly,
    /// All time.
    All,
}

impl TopPeriod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::All => "all",
        }
    }
}

/// Parameters for the top-topics listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopTopicsParams {
    /// Ranking window.
    #[serde(default)]
    pub period: TopPeriod,
    /// Maximum number of topics to return (clamped to 1..=50).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// One topic in a ranked listing.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    /// Topic id.
    pub id: u64,
    /// Topic title.
    pub title: String,
    /// Direct link to the topic.
    pub url: String,
    /// View count.
    pub views: u64,
    /// Number of posts.
    pub posts_count: u64,
    /// Like count.
    pub like_count: u64,
    /// Resolved category name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Topic tags; present only in the hot listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Creation time, formatted.
    pub created_at: String,
}

/// Lists currently hot topics from the active site.
pub async fn hot_topics(
    state: &SiteState,
    params: HotTopicsParams,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<TopicSummary>, FetchError> {
    let (base, client) = state.ensure_selected_site()?;
    let data = client.get("/hot.json", cancel).await?.into_json()?;
    Ok(reshape_listing(&base, &data, params.limit.clamp(1, MAX_LISTED), true))
}

/// Lists top topics for a ranking window from the active site.
pub async fn top_topics(
    state: &SiteState,
    params: TopTopicsParams,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<TopicSummary>, FetchError> {
    let (base, client) = state.ensure_selected_site()?;
    let path = format!("/top/{}.json", params.period.as_str());
    let data = client.get(&path, cancel).await?.into_json()?;
    Ok(reshape_listing(&base, &data, params.limit.clamp(1, MAX_LISTED), false))
}

/// Reshapes a `topic_list` payload. Some deployments return the list at the
/// top level instead of under `topic_list`.
fn reshape_listing(base: &str, data: &Value, limit: usize, with_tags: bool) -> Vec<TopicSummary> {
    let list = data.get("topic_list").unwrap_or(data);
    let topics = list
        .get("topics")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    topics
        .iter()
        .take(limit)
        .filter_map(|topic| {
            let id = topic.get("id").and_then(Value::as_u64)?;
            let title = topic
                .get("title")
                .and_then(Value::as_str)
                .or_else(|| topic.get("fancy_title").and_then(Value::as_str))
                .map_or_else(|| format!("Topic {id}"), ToString::to_string);
            let slug = topic
                .get("slug")
                .and_then(Value::as_str)
                .map_or_else(|| id.to_string(), ToString::to_string);
            Some(TopicSummary {
                id,
                title,
                url: format!("{base}/t/{slug}/{id}"),
                views: u64_field(topic, "views"),
                posts_count: u64_field(topic, "posts_count"),
                like_count: u64_field(topic, "like_count"),
                category: topic
                    .get("category_id")
                    .and_then(Value::as_u64)
                    .and_then(|cid| u32::try_from(cid).ok())
                    .map(category_name),
                tags: with_tags.then(|| {
                    topic
                        .get("tags")
                        .and_then(Value::as_array)
                        .map(|tags| {
                            tags.iter()
                                .filter_map(Value::as_str)
                                .map(ToString::to_string)
                                .collect()
                        })
                        .unwrap_or_default()
                }),
                created_at: format_timestamp(
                    topic.get("created_at").and_then(Value::as_str).unwrap_or(""),
                ),
            })
        })
        .collect()
}

// ============================================================================
// Helpers
// ============================================================================

/// Removes all HTML tags from a post body.
pub fn strip_html(html: &str) -> String {
    TAG_PATTERN.replace_all(html, "").into_owned()
}

/// Cuts a string to at most `limit` characters.
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
