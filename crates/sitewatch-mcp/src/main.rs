//! sitewatch-mcp - deployment diagnostics tool server
//!
//! Speaks line-delimited JSON-RPC (MCP) on stdin/stdout. Logs go to stderr.
//!
//! ## Tools
//!
//! - `list_sites`, `list_deployments`
//! - `diagnose_deployment`, `recommend_retry`
//! - `analyze_build_usage`, `content_optimization_report`

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sitewatch_client::{ClientConfig, HostingApiClient};
use sitewatch_core::metrics::METRICS;
use sitewatch_core::{DiagnosticsEngine, EngineConfig};
use sitewatch_mcp::{McpServer, SitewatchTools};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "sitewatch-mcp")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deployment diagnostics for static-site hosting, served as MCP tools", long_about = None)]
struct Cli {
    /// Hosting API base URL
    #[arg(long, env = "SITEWATCH_API_URL")]
    api_url: Option<String>,

    /// Hosting API token (falls back to NETLIFY_AUTH_TOKEN)
    #[arg(long, env = "SITEWATCH_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sitewatch_core::init_tracing(cli.json, cli.log_level);

    let engine_config = EngineConfig::from_env();
    engine_config
        .validate()
        .context("Invalid engine configuration")?;

    let mut client_config = ClientConfig::from_env();
    if let Some(url) = cli.api_url.as_deref() {
        client_config = client_config.with_api_url(url);
    }
    if let Some(token) = cli.token.as_deref() {
        client_config = client_config.with_token(token);
    }
    if client_config.token.is_none() {
        warn!("no API token configured; every tool call will fail until one is set");
    }
    info!(api_url = %client_config.api_url, "hosting API configured");

    let client = HostingApiClient::new(client_config).context("Failed to build HTTP client")?;
    let tools = SitewatchTools::new(Arc::new(client), DiagnosticsEngine::new(engine_config));
    let server = McpServer::new(tools);

    let served = server.serve_stdio().await.context("stdio transport failed");
    METRICS.flush();
    served
}
