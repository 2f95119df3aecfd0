//! Console state snapshots shared between the ingestion loop and callers

use crate::logs::{LogBuffer, LogEntry};
use crate::patterns::PatternTable;
use crate::presence::PresenceSet;
use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Serialize};

/// Number of log lines returned as the inferred response to a command
pub const RESPONSE_LINES: usize = 10;

/// Rendered response when nothing has been logged yet
pub const NO_ACTIVITY_PLACEHOLDER: &str = "No recent activity";

/// Everything derived from the console stream
#[derive(Debug, Clone, Default)]
pub struct ConsoleState {
    pub logs: LogBuffer,
    pub players: PresenceSet,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw console line: buffer it, then classify it.
    ///
    /// Trailing whitespace is stripped before buffering; the classifier sees
    /// the untimestamped text.
    pub fn ingest(&mut self, timestamp: NaiveTime, raw: &str, patterns: &PatternTable) -> LogEntry {
        let text = raw.trim_end();
        let entry = self.logs.push(timestamp, text).clone();
        if let Some(change) = patterns.classify(text) {
            self.players.apply(change);
        }
        entry
    }
}

/// Point-in-time view of the managed server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub running: bool,
    pub player_count: usize,
    pub player_list: Vec<String>,
    pub pid: Option<u32>,
}

impl ServerStatus {
    pub fn new(running: bool, players: &PresenceSet, pid: Option<u32>) -> Self {
        let player_list = players.to_vec();
        Self {
            running,
            player_count: player_list.len(),
            player_list,
            pid,
        }
    }
}

/// Console output observed around a command.
///
/// The server never frames replies, so this is a best-effort snapshot of
/// what was logged after the command was written, not the command's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTelemetry {
    pub command: String,
    pub requested_at: DateTime<Local>,
    /// Last [`RESPONSE_LINES`] buffered lines after the settle delay
    pub recent_logs: Vec<String>,
    /// Buffered lines that arrived after the command was written
    pub observed_logs: Vec<String>,
}

impl CommandTelemetry {
    /// Snapshot `logs` for a command written when the buffer cursor was `cursor`
    pub fn capture(
        command: impl Into<String>,
        requested_at: DateTime<Local>,
        logs: &LogBuffer,
        cursor: u64,
    ) -> Self {
        Self {
            command: command.into(),
            requested_at,
            recent_logs: logs.tail(RESPONSE_LINES).map(ToString::to_string).collect(),
            observed_logs: logs.lines_since(cursor),
        }
    }

    /// Text handed back to tool callers
    pub fn response_text(&self) -> String {
        if self.recent_logs.is_empty() {
            NO_ACTIVITY_PLACEHOLDER.to_string()
        } else {
            self.recent_logs.join("\n")
        }
    }
}
