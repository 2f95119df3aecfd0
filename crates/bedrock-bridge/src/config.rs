//! Manager configuration

use bedrock_core::logs::LOG_CAPACITY;
use bedrock_core::{PatternTable, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Executable names probed in the server directory, in order
pub const DEFAULT_EXECUTABLE_NAMES: [&str; 3] =
    ["bedrock_server", "bedrock_server.exe", "BedrockServer.exe"];

/// Configuration for the Bedrock process manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Server directory, or the server executable itself
    pub server_path: PathBuf,
    /// Candidate executable names inside the server directory
    pub executable_names: Vec<String>,
    /// Wait between writing a command and snapshotting the log
    pub settle_delay: Duration,
    /// How long `stop` waits for a graceful exit before killing
    pub stop_grace: Duration,
    /// Upper bound on one write to the server's stdin
    pub write_timeout: Duration,
    /// Console command that asks the server to shut down
    pub stop_command: String,
    /// Presence classification rules
    pub patterns: PatternTable,
    /// Console lines retained
    pub log_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            server_path: PathBuf::from("."),
            executable_names: DEFAULT_EXECUTABLE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            settle_delay: Duration::from_millis(500),
            stop_grace: Duration::from_secs(2),
            write_timeout: Duration::from_secs(5),
            stop_command: "stop".to_string(),
            patterns: PatternTable::default(),
            log_capacity: LOG_CAPACITY,
        }
    }
}

impl ManagerConfig {
    /// Create config for a server directory or executable path
    pub fn new(server_path: impl Into<PathBuf>) -> Self {
        Self {
            server_path: server_path.into(),
            ..Default::default()
        }
    }

    /// Replace the pattern table with one loaded from a JSON file
    pub fn with_patterns_file(mut self, path: &Path) -> Result<Self> {
        self.patterns = PatternTable::load(path)?;
        Ok(self)
    }
}
