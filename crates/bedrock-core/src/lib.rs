//! # bedrock-core
//!
//! Core types for bridging a Bedrock Dedicated Server console.
//!
//! This crate provides the pieces that do not touch the child process:
//! - Bounded, timestamped log buffer
//! - Player presence set
//! - Data-driven line classifier (pattern table)
//! - Status and command telemetry snapshots
//! - Error type shared by every crate in the workspace

pub mod console;
pub mod error;
pub mod logs;
pub mod patterns;
pub mod presence;

pub use console::{CommandTelemetry, ConsoleState, ServerStatus};
pub use error::{BedrockError, Result, error_codes};
pub use logs::{LogBuffer, LogEntry};
pub use patterns::{PatternKind, PatternRule, PatternSpec, PatternTable};
pub use presence::{PresenceChange, PresenceSet};
