//! Data-driven classification of console lines into presence changes
//!
//! Bedrock's log wording changes between releases, so the rules live in a
//! table that can be loaded from JSON instead of being compiled in:
//!
//! ```json
//! [
//!   { "kind": "join",  "pattern": "Player connected: (.+?),",    "capture": 1 },
//!   { "kind": "leave", "pattern": "Player disconnected: (.+?),", "capture": 1 }
//! ]
//! ```

use crate::error::{BedrockError, Result};
use crate::presence::PresenceChange;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a matching line means for player presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Join,
    Leave,
}

/// Serialized form of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub kind: PatternKind,
    pub pattern: String,
    #[serde(default = "default_capture")]
    pub capture: usize,
}

fn default_capture() -> usize {
    1
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub kind: PatternKind,
    pub regex: Regex,
    pub capture: usize,
}

impl PatternRule {
    /// Compile a rule, rejecting capture groups the pattern does not have
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        let regex = Regex::new(&spec.pattern)
            .map_err(|e| BedrockError::InvalidPattern(format!("{}: {}", spec.pattern, e)))?;
        if spec.capture >= regex.captures_len() {
            return Err(BedrockError::InvalidPattern(format!(
                "{}: capture group {} does not exist",
                spec.pattern, spec.capture
            )));
        }
        Ok(Self {
            kind: spec.kind,
            regex,
            capture: spec.capture,
        })
    }

    fn extract(&self, line: &str) -> Option<PresenceChange> {
        let player = self
            .regex
            .captures(line)?
            .get(self.capture)?
            .as_str()
            .to_string();
        Some(match self.kind {
            PatternKind::Join => PresenceChange::Joined(player),
            PatternKind::Leave => PresenceChange::Left(player),
        })
    }
}

/// Ordered rule list; the first matching rule wins
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::from_specs(&Self::bedrock_specs())
            .expect("built-in Bedrock patterns are valid")
    }
}

impl PatternTable {
    /// Rules matching vanilla Bedrock Dedicated Server output
    pub fn bedrock_specs() -> Vec<PatternSpec> {
        vec![
            PatternSpec {
                kind: PatternKind::Join,
                pattern: r"Player connected: (.+?),".into(),
                capture: 1,
            },
            PatternSpec {
                kind: PatternKind::Leave,
                pattern: r"Player disconnected: (.+?),".into(),
                capture: 1,
            },
        ]
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(PatternRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let specs: Vec<PatternSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    /// Load a table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BedrockError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Map a raw line to at most one presence change
    pub fn classify(&self, line: &str) -> Option<PresenceChange> {
        self.rules.iter().find_map(|rule| rule.extract(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::PresenceSet;

    #[test]
    fn test_bedrock_join_and_leave() {
        let table = PatternTable::default();
        assert_eq!(
            table.classify("[2024-05-01 12:00:00:000 INFO] Player connected: Steve, xuid: 2535"),
            Some(PresenceChange::Joined("Steve".into()))
        );
        assert_eq!(
            table.classify("Player disconnected: Steve, xuid: 2535"),
            Some(PresenceChange::Left("Steve".into()))
        );
        assert_eq!(table.classify("Server started."), None);
    }

    #[test]
    fn test_replay_matches_set_semantics() {
        let table = PatternTable::default();
        let mut set = PresenceSet::new();
        for line in [
            "Player connected: Alice, xuid=1",
            "Player connected: Bob, xuid=2",
            "Player connected: Bob, xuid=2",
            "Player disconnected: Alice, xuid=1",
            "Player disconnected: Carol, xuid=3",
        ] {
            if let Some(change) = table.classify(line) {
                set.apply(change);
            }
        }
        assert_eq!(set.to_vec(), vec!["Bob"]);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = PatternTable::from_json_str(
            r#"[
                {"kind": "leave", "pattern": "kicked (\\w+)"},
                {"kind": "join", "pattern": "(\\w+) joined"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            table.classify("Steve joined then got kicked Alex"),
            Some(PresenceChange::Left("Alex".into()))
        );
    }

    #[test]
    fn test_custom_capture_index() {
        let table = PatternTable::from_json_str(
            r#"[{"kind": "join", "pattern": "(\\d+) (\\w+) logged in", "capture": 2}]"#,
        )
        .unwrap();
        assert_eq!(
            table.classify("42 Herobrine logged in"),
            Some(PresenceChange::Joined("Herobrine".into()))
        );
    }

    #[test]
    fn test_rejects_bad_regex() {
        let err = PatternTable::from_json_str(r#"[{"kind": "join", "pattern": "("}]"#)
            .unwrap_err();
        assert!(matches!(err, BedrockError::InvalidPattern(_)));
    }

    #[test]
    fn test_rejects_missing_capture_group() {
        let err = PatternTable::from_json_str(
            r#"[{"kind": "leave", "pattern": "left: (\\w+)", "capture": 2}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("capture group 2"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PatternTable::load(Path::new("/nonexistent/patterns.json")).unwrap_err();
        assert!(matches!(err, BedrockError::Config(_)));
    }
}
