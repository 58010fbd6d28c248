//! High score leaderboard
//!
//! Ranks finished runs. Storage is the host's job; the board serializes
//! with serde so it can be written anywhere.

use serde::{Deserialize, Serialize};

use crate::sim::run::{PlayMode, RunSummary};

/// Maximum number of high scores to keep per board
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Level reached
    pub level: u32,
    pub coins: u32,
}

/// Separate boards for solo and two-player runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub solo: Vec<HighScoreEntry>,
    pub coop: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, mode: PlayMode) -> &[HighScoreEntry] {
        if mode.is_coop() { &self.coop } else { &self.solo }
    }

    fn board_mut(&mut self, mode: PlayMode) -> &mut Vec<HighScoreEntry> {
        if mode.is_coop() {
            &mut self.coop
        } else {
            &mut self.solo
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, mode: PlayMode, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let board = self.board(mode);
        if board.len() < MAX_HIGH_SCORES {
            return true;
        }
        board.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, mode: PlayMode, score: u64) -> Option<usize> {
        if !self.qualifies(mode, score) {
            return None;
        }
        let board = self.board(mode);
        let rank = board.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(board.len()) + 1)
    }

    /// Record a finished run. Returns the rank achieved, if any.
    pub fn record(&mut self, name: &str, summary: &RunSummary) -> Option<usize> {
        if !self.qualifies(summary.mode, summary.score) {
            return None;
        }
        let entry = HighScoreEntry {
            name: name.to_string(),
            score: summary.score,
            level: summary.level,
            coins: summary.coins,
        };

        let board = self.board_mut(summary.mode);
        let rank = match board.iter().position(|e| entry.score > e.score) {
            Some(i) => {
                board.insert(i, entry);
                i + 1
            }
            None => {
                board.push(entry);
                board.len()
            }
        };
        board.truncate(MAX_HIGH_SCORES);
        log::info!("High score #{rank} recorded for {name}");
        Some(rank)
    }

    pub fn top_score(&self, mode: PlayMode) -> Option<u64> {
        self.board(mode).first().map(|e| e.score)
    }
}
