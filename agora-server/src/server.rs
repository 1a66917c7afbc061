//! MCP tool surface.
//!
//! Implements the rmcp [`ServerHandler`] directly: tool descriptors carry
//! hand-written JSON schemas, and `call_tool` dispatches on the tool name,
//! deserializes the arguments, and renders results as pretty-printed JSON
//! text content. Tool failures become error results, never protocol errors;
//! only malformed requests are rejected at the protocol level.

use std::sync::Arc;

use agora_fetch::SiteState;
use agora_tools::{search, site, topics, users};
use rmcp::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The MCP handler, shared across sessions.
#[derive(Clone)]
pub struct AgoraServer {
    state: Arc<SiteState>,
}

impl AgoraServer {
    /// Creates a handler over the shared site registry.
    pub fn new(state: Arc<SiteState>) -> Self {
        Self { state }
    }

    async fn dispatch(
        &self,
        request: CallToolRequestParams,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, ErrorData> {
        let name = request.name.to_string();
        let args = Value::Object(request.arguments.unwrap_or_default());
        debug!(tool = %name, "tool call");

        match name.as_str() {
            "discourse_select_site" => {
                let params = parse_args(args)?;
                render(site::execute(&self.state, &params), "Failed to select site")
            }
            "discourse_search" => {
                let params = parse_args(args)?;
                render(
                    search::execute(&self.state, params, Some(&cancel)).await,
                    "Search failed",
                )
            }
            "discourse_read_topic" => {
                let params = parse_args(args)?;
                render(
                    topics::read_topic(&self.state, params, Some(&cancel)).await,
                    "Failed to read topic",
                )
            }
            "discourse_list_hot_topics" => {
                let params = parse_args(args)?;
                render(
                    topics::hot_topics(&self.state, params, Some(&cancel)).await,
                    "Failed to fetch hot topics",
                )
            }
            "discourse_list_top_topics" => {
                let params = parse_args(args)?;
                render(
                    topics::top_topics(&self.state, params, Some(&cancel)).await,
                    "Failed to fetch top topics",
                )
            }
            "discourse_list_user_posts" => {
                let params = parse_args(args)?;
                render(
                    users::execute(&self.state, params, Some(&cancel)).await,
                    "Failed to fetch user posts",
                )
            }
            other => Err(ErrorData::invalid_params(
                format!("unknown tool: {other}"),
                None,
            )),
        }
    }
}

impl ServerHandler for AgoraServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Read-only query tools for Discourse forums. Call discourse_select_site \
                 to point the tools at a different forum."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(tool_descriptors())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        self.dispatch(request, context.ct)
    }
}

/// Deserializes tool arguments, rejecting malformed shapes at the protocol
/// level.
fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, ErrorData> {
    serde_json::from_value(args)
        .map_err(|err| ErrorData::invalid_params(format!("invalid arguments: {err}"), None))
}

/// Renders a tool outcome: pretty JSON on success, an error result with a
/// contextual prefix on failure.
fn render<T: Serialize, E: std::fmt::Display>(
    outcome: Result<T, E>,
    failure_prefix: &str,
) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value)
                .map_err(|err| ErrorData::internal_error(err.to_string(), None))?;
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(err) => {
            warn!(error = %err, "tool call failed");
            Ok(CallToolResult::error(vec![Content::text(format!(
                "{failure_prefix}: {err}"
            ))]))
        }
    }
}

// ============================================================================
// Tool Descriptors
// ============================================================================

fn tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let map = schema.as_object().cloned().unwrap_or_default();
    Tool {
        name: name.into(),
        title: None,
        description: Some(description.into()),
        input_schema: Arc::new(map),
        output_schema: None,
        annotations: None,
        execution: None,
        icons: None,
        meta: None,
    }
}

fn tool_descriptors() -> Vec<Tool> {
    vec![
        tool(
            "discourse_select_site",
            "Select the Discourse forum the other tools operate on",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Forum URL; normalized to its origin",
                    },
                },
                "required": ["url"],
            }),
        ),
        tool(
            "discourse_search",
            "Search the selected forum",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (optional if filters are provided)",
                    },
                    "max_results": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "description": "Maximum number of results to return (default: 50, max: 50)",
                    },
                    "order": {
                        "type": "string",
                        "enum": ["relevance", "likes", "latest", "views", "latest_topic"],
                        "description": "Sort order: relevance (default), likes, latest, views, or latest_topic",
                    },
                    "category": {
                        "type": "string",
                        "description": "Category name in Chinese to search within. Examples: 玩卡, 旅行, 理财, 败家, 生活, 法律, 情感, 搬砖, 文艺, 闲聊, 白金, 吵架",
                    },
                    "author": {
                        "type": "string",
                        "description": "Filter results by author username (e.g., 'xxxyyy')",
                    },
                    "after": {
                        "type": "string",
                        "description": "Filter results after this date (format: YYYY-MM-DD, e.g., '2025-10-07')",
                    },
                    "before": {
                        "type": "string",
                        "description": "Filter results before this date (format: YYYY-MM-DD, e.g., '2025-10-08')",
                    },
                },
            }),
        ),
        tool(
            "discourse_read_topic",
            "Read a topic and its posts from the selected forum",
            json!({
                "type": "object",
                "properties": {
                    "topic_id": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "The topic ID to read",
                    },
                    "post_number": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Optional specific post number to read",
                    },
                    "max_posts": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 100,
                        "description": "Maximum number of posts to return (default: 20, max: 100)",
                    },
                },
                "required": ["topic_id"],
            }),
        ),
        tool(
            "discourse_list_hot_topics",
            "List currently hot topics on the selected forum",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "description": "Maximum number of hot topics to return (default: 10, max: 50)",
                    },
                },
            }),
        ),
        tool(
            "discourse_list_top_topics",
            "List top topics on the selected forum for a time period",
            json!({
                "type": "object",
                "properties": {
                    "period": {
                        "type": "string",
                        "enum": ["daily", "weekly", "monthly", "quarterly", "yearly", "all"],
                        "description": "Time period for top topics (default: weekly)",
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "description": "Maximum number of topics to return (default: 10, max: 50)",
                    },
                },
            }),
        ),
        tool(
            "discourse_list_user_posts",
            "List a user's recent posts and replies on the selected forum",
            json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "The username to fetch posts for",
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "description": "Maximum number of posts to return (default: 20, max: 50)",
                    },
                },
                "required": ["username"],
            }),
        ),
    ]
}

// ============================================================================
// Tests
// ============================================================================
