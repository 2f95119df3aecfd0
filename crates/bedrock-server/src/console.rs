//! Console server trait

use async_trait::async_trait;
use bedrock_core::{CommandTelemetry, LogEntry, Result, ServerStatus};
use tokio::sync::broadcast;

/// A supervised game server reachable only through its console.
///
/// Implement this trait to expose a server process to MCP tools. The MCP
/// server holds the implementation behind an `Arc` and passes it to every
/// handler explicitly.
#[async_trait]
pub trait ConsoleServer: Send + Sync + 'static {
    /// Start the server process. Succeeds immediately if already running.
    async fn start(&self) -> Result<()>;

    /// Stop the server process. Afterwards the server is never reported running.
    async fn stop(&self);

    /// Write a console command and return the log output seen around it
    async fn send(&self, command: &str) -> Result<CommandTelemetry>;

    /// Current lifecycle and presence snapshot
    async fn status(&self) -> ServerStatus;

    /// Last `lines` formatted console lines
    async fn recent_logs(&self, lines: usize) -> Vec<String>;

    /// Like [`send`](Self::send), rendering failures as their message text
    async fn send_text(&self, command: &str) -> String {
        match self.send(command).await {
            Ok(telemetry) => telemetry.response_text(),
            Err(e) => e.to_string(),
        }
    }

    /// Subscribe to console lines as they are ingested.
    /// Returns None if the server does not publish them.
    fn subscribe_logs(&self) -> Option<broadcast::Receiver<LogEntry>> {
        None
    }
}
