//! Set of players currently connected to the server

use serde::Serialize;

/// A presence mutation extracted from one console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    Joined(String),
    Left(String),
}

/// De-duplicated set of online player names, kept in join order for display
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PresenceSet {
    players: Vec<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation. Returns true if the set changed.
    pub fn apply(&mut self, change: PresenceChange) -> bool {
        match change {
            PresenceChange::Joined(player) => {
                if self.contains(&player) {
                    return false;
                }
                self.players.push(player);
                true
            }
            PresenceChange::Left(player) => {
                let before = self.players.len();
                self.players.retain(|p| *p != player);
                self.players.len() != before
            }
        }
    }

    pub fn contains(&self, player: &str) -> bool {
        self.players.iter().any(|p| p == player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.players.clone()
    }
}
