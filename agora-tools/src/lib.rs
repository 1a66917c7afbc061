// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Agora Tools
//!
//! The query tools exposed over MCP. Each tool pairs a `Deserialize`
//! parameter struct (serde defaults mirror the protocol defaults) with an
//! async execute function that runs against the active site's
//! [`HttpClient`](agora_fetch::HttpClient) and reshapes the forum's loosely
//! typed JSON into compact `Serialize` output structs.
//!
//! Tools:
//!
//! - **search**: full-text search with author, date, category, and order
//!   filters folded into the query string
//! - **topics**: read one topic with its posts; list hot and top topics
//! - **users**: a user's recent posts and replies
//! - **site**: switch the active site

pub mod search;
pub mod site;
pub mod topics;
pub mod users;

pub use search::{SearchOrder, SearchParams, SearchResult};
pub use site::{SelectSiteParams, SiteSelection};
pub use topics::{
    HotTopicsParams, ReadTopicParams, TopPeriod, TopTopicsParams, TopicSummary, TopicView,
};
pub use users::{UserPostsParams, UserPostView};
