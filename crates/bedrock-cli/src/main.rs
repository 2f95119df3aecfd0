//! Minecraft Bedrock MCP Server
//!
//! Supervises a Bedrock Dedicated Server and exposes its console to MCP
//! clients over stdio. Logs go to stderr; stdout carries the protocol.

use anyhow::{Context, Result};
use bedrock_bridge::{BedrockManager, ManagerConfig};
use bedrock_server::BedrockMcpServer;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bedrock-mcp", version, about = "MCP server for Minecraft Bedrock Dedicated Server")]
struct Args {
    /// Server directory, or the server executable itself
    #[arg(long, env = "BEDROCK_SERVER_PATH")]
    server_path: PathBuf,

    /// Start the server before accepting requests
    #[arg(long)]
    auto_start: bool,

    /// JSON file with join/leave patterns replacing the built-in ones
    #[arg(long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Send console lines to the client as log notifications
    #[arg(long)]
    forward_logs: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Bedrock MCP server starting");

    let mut config = ManagerConfig::new(args.server_path.clone());
    if let Some(path) = &args.patterns {
        config = config
            .with_patterns_file(path)
            .with_context(|| format!("Failed to load patterns from {}", path.display()))?;
        info!("Loaded presence patterns from {}", path.display());
    }

    let manager = Arc::new(BedrockManager::new(config));
    if args.auto_start {
        manager
            .start()
            .await
            .context("Failed to start Bedrock server")?;
    }

    BedrockMcpServer::new(manager)
        .with_log_forwarding(args.forward_logs)
        .run_stdio()
        .await?;

    info!("Bedrock MCP server shutting down");
    Ok(())
}
