//! Error types for the Bedrock bridge

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Bedrock bridge operations
pub type Result<T> = std::result::Result<T, BedrockError>;

/// Bedrock bridge error types
///
/// Display strings double as the text returned to tool callers, so they
/// keep the wording callers already match on.
#[derive(Debug, Error)]
pub enum BedrockError {
    /// No candidate executable exists in the server directory
    #[error("Bedrock server executable not found in {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// Spawning the child process failed
    #[error("Failed to start server: {0}")]
    SpawnFailure(String),

    /// Command sent while the server is not running
    #[error("Error: Server is not running")]
    NotRunning,

    /// Writing to the server's stdin failed
    #[error("Error sending command: {0}")]
    SendFailed(String),

    /// Pattern table entry is not usable
    #[error("Invalid log pattern: {0}")]
    InvalidPattern(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool arguments missing or malformed
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// stdio transport failure
    #[error("IPC error: {0}")]
    IpcError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BedrockError {
    fn from(err: serde_json::Error) -> Self {
        BedrockError::SerializationError(err.to_string())
    }
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_messages_preserved() {
        assert_eq!(
            BedrockError::NotRunning.to_string(),
            "Error: Server is not running"
        );
        assert_eq!(
            BedrockError::SendFailed("Broken pipe".into()).to_string(),
            "Error sending command: Broken pipe"
        );
        assert_eq!(
            BedrockError::ExecutableNotFound(PathBuf::from("/srv/bedrock")).to_string(),
            "Bedrock server executable not found in /srv/bedrock"
        );
    }
}
