//! # bedrock-server
//!
//! MCP server exposing a Bedrock Dedicated Server console.
//!
//! This crate provides:
//! - `ConsoleServer` trait for the process side of the bridge
//! - MCP JSON-RPC protocol handling over stdio
//! - Tool implementations (send-command, get-server-status, fill, ...)
//! - Command text builders for the game tools

pub mod commands;
pub mod console;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use console::ConsoleServer;

use bedrock_core::Result;
use std::sync::Arc;

/// Name reported in `initialize`
pub const SERVER_NAME: &str = "minecraft-bedrock";

/// Bedrock MCP server
pub struct BedrockMcpServer<S: ConsoleServer> {
    /// Console the tools operate on
    console: Arc<S>,
    /// Forward ingested console lines as `notifications/message`
    forward_logs: bool,
}

impl<S: ConsoleServer> BedrockMcpServer<S> {
    /// Create a new server around a console handle
    pub fn new(console: Arc<S>) -> Self {
        Self {
            console,
            forward_logs: false,
        }
    }

    /// Enable or disable console line notifications
    pub fn with_log_forwarding(mut self, enabled: bool) -> Self {
        self.forward_logs = enabled;
        self
    }

    /// Run the server on stdio transport
    pub async fn run_stdio(self) -> Result<()> {
        transport::stdio::run(self).await
    }

    /// Console handle
    pub fn console(&self) -> &Arc<S> {
        &self.console
    }
}
