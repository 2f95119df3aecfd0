//! Bounded, timestamped buffer of server console lines

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Number of console lines retained
pub const LOG_CAPACITY: usize = 100;

/// Returned by [`LogBuffer::recent_lines`] when nothing has been logged yet
pub const NO_LOGS_PLACEHOLDER: &str = "No logs available";

/// A single console line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the stream, starting at 1 and never reused
    pub seq: u64,
    /// Wall-clock time the line was read (second resolution)
    pub timestamp: NaiveTime,
    /// Line text with trailing whitespace removed
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// FIFO ring of the most recent console lines
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` lines
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    /// Append a line, evicting the oldest first when full
    pub fn push(&mut self, timestamp: NaiveTime, text: impl Into<String>) -> &LogEntry {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(LogEntry {
            seq,
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            text: text.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Sequence number the next pushed line will get.
    ///
    /// Lines with `seq >= cursor` arrived after the cursor was taken.
    pub fn cursor(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Last `n` entries in arrival order (all of them if fewer)
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    /// Last `n` formatted lines, or the placeholder when the buffer is empty.
    ///
    /// `n == 0` returns every buffered line.
    pub fn recent_lines(&self, n: usize) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![NO_LOGS_PLACEHOLDER.to_string()];
        }
        let n = if n == 0 { self.entries.len() } else { n };
        self.tail(n).map(ToString::to_string).collect()
    }

    /// Formatted lines that arrived at or after `cursor` and are still buffered
    pub fn lines_since(&self, cursor: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.seq >= cursor)
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_keeps_last_hundred_in_order() {
        let mut buffer = LogBuffer::default();
        for i in 0..150 {
            buffer.push(at(12, 0, 0), format!("line {i}"));
        }

        assert_eq!(buffer.len(), LOG_CAPACITY);
        let texts: Vec<&str> = buffer.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"line 50"));
        assert_eq!(texts.last(), Some(&"line 149"));
        assert!(texts.windows(2).all(|w| {
            let a: u32 = w[0][5..].parse().unwrap();
            let b: u32 = w[1][5..].parse().unwrap();
            b == a + 1
        }));
    }

    #[test]
    fn test_entry_format() {
        let mut buffer = LogBuffer::default();
        let entry = buffer.push(at(9, 5, 3), "Server started.");
        assert_eq!(entry.to_string(), "[09:05:03] Server started.");
    }

    #[test]
    fn test_timestamp_truncated_to_seconds() {
        let mut buffer = LogBuffer::default();
        let precise = NaiveTime::from_hms_milli_opt(9, 5, 3, 750).unwrap();
        let entry = buffer.push(precise, "tick");
        assert_eq!(entry.timestamp, at(9, 5, 3));
    }

    #[test]
    fn test_recent_lines_placeholder_when_empty() {
        let buffer = LogBuffer::default();
        assert_eq!(buffer.recent_lines(20), vec![NO_LOGS_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_recent_lines_clamps_to_available() {
        let mut buffer = LogBuffer::default();
        buffer.push(at(1, 0, 0), "a");
        buffer.push(at(1, 0, 1), "b");
        buffer.push(at(1, 0, 2), "c");

        assert_eq!(buffer.recent_lines(2), vec!["[01:00:01] b", "[01:00:02] c"]);
        assert_eq!(buffer.recent_lines(10).len(), 3);
        assert_eq!(buffer.recent_lines(0).len(), 3);
    }

    #[test]
    fn test_lines_since_cursor() {
        let mut buffer = LogBuffer::with_capacity(3);
        buffer.push(at(1, 0, 0), "before");
        let cursor = buffer.cursor();
        buffer.push(at(1, 0, 1), "after 1");
        buffer.push(at(1, 0, 2), "after 2");

        assert_eq!(
            buffer.lines_since(cursor),
            vec!["[01:00:01] after 1", "[01:00:02] after 2"]
        );

        // Evicted lines are gone even if newer than the cursor
        buffer.push(at(1, 0, 3), "after 3");
        buffer.push(at(1, 0, 4), "after 4");
        assert_eq!(buffer.lines_since(cursor).len(), 3);
        assert_eq!(buffer.len(), 3);
    }
}
