//! Bedrock bridge for the console MCP server
//!
//! Supervises a Bedrock Dedicated Server child process and turns its
//! console into something tools can call:
//!
//! - **Commands**: written line by line to the child's stdin
//! - **Output**: stdout and stderr merged into one line stream, buffered
//!   and classified into player presence by a background ingestion task
//!
//! The console has no reply framing, so a command's "response" is the log
//! context observed after a short settle delay.

mod channel;
mod config;
mod executable;
mod ingest;
mod manager;
mod state;

pub use channel::write_line;
pub use config::ManagerConfig;
pub use executable::{locate_executable, working_dir};
pub use manager::BedrockManager;
