//! High score leaderboard
//!
//! Fed by finished rounds; tracks the top 10 scores. Storage is up to the host:
//! the table round-trips through JSON.

use serde::{Deserialize, Serialize};

use crate::settings::Difficulty;
use crate::sim::{GamePhase, GameRound};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Tower height reached
    pub height: u32,
    pub difficulty: Difficulty,
    /// True if the round ended in victory
    #[serde(default)]
    pub victory: bool,
    /// Unix timestamp (ms) supplied by the host
    pub timestamp: f64,
}

/// High score leaderboard, sorted by score descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert an entry if it qualifies. Returns the rank achieved (1-indexed).
    pub fn add(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Record a finished round. Rounds still in progress are ignored.
    pub fn record_round(&mut self, round: &GameRound, timestamp: f64) -> Option<usize> {
        let phase = round.phase();
        if !phase.is_terminal() {
            return None;
        }
        let snapshot = round.snapshot();
        let rank = self.add(HighScoreEntry {
            score: snapshot.score,
            height: snapshot.height,
            difficulty: snapshot.difficulty,
            victory: phase == GamePhase::Victory,
            timestamp,
        });
        if let Some(rank) = rank {
            log::info!("New high score #{}: {}", rank, snapshot.score);
        }
        rank
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored table, keeping the size and ordering invariants
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        Ok(scores)
    }
}
