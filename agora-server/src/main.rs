// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Agora server - Discourse forum query tools over MCP.
//!
//! # Examples
//!
//! ```bash
//! # Serve the default forum on the default address
//! agora-server
//!
//! # Custom site and listen address
//! agora-server --site https://forum.example.com --listen 0.0.0.0:9000
//!
//! # With a config file carrying credentials
//! agora-server --config agora.yaml -v
//! ```

mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use agora_fetch::SiteState;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use clap::Parser;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::ServerConfig;
use server::AgoraServer;

// ============================================================================
// CLI Definition
// ============================================================================

/// Agora server - Discourse forum query tools over MCP.
#[derive(Parser)]
#[command(name = "agora-server")]
#[command(about = "Serves Discourse forum query tools over MCP")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Site to select at startup (overrides the config file).
    #[arg(long)]
    site: Option<String>,

    /// Per-attempt request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Address to bind the HTTP server to.
    #[arg(long, short)]
    listen: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(site) = cli.site {
        config.site = site;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    let state = Arc::new(SiteState::new(
        config.timeout(),
        config.default_auth.clone(),
        config.auth_overrides.clone(),
    ));
    let (origin, _) = state
        .select_site(&config.site)
        .with_context(|| format!("selecting default site {}", config.site))?;
    info!(site = %origin, "default site selected");

    let ct = CancellationToken::new();
    let handler = AgoraServer::new(Arc::clone(&state));
    let service: StreamableHttpService<AgoraServer, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(handler.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: ct.child_token(),
                ..Default::default()
            },
        );

    let router = Router::new()
        .nest_service("/mcp", service)
        .route("/health", get(health));

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("binding to {}", config.listen))?;
    info!(addr = %listener.local_addr()?, "serving MCP on /mcp");

    let shutdown = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled_owned().await })
        .await
        .context("serving HTTP")?;

    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}
