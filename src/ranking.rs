//! Leaderboard
//!
//! One entry per registered user, refreshed whenever their profile changes.
//! Persisted as a plain JSON array.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, StorageError, keys, read_json, write_json};
use crate::progression::{UserProfile, rank_for_level};

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: String,
    pub name: String,
    pub score: u64,
    pub victory_points: u64,
    /// Unix timestamp (ms) of the last sync
    pub date: f64,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rank_title: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub max_level_reached: u32,
}

impl ScoreEntry {
    fn from_profile(profile: &UserProfile, timestamp: f64) -> Self {
        Self {
            id: profile.username.clone(),
            name: profile.username.clone(),
            score: profile.high_score,
            victory_points: profile.victory_points,
            date: timestamp,
            avatar: profile.avatar.clone(),
            rank_title: Some(rank_for_level(profile.level).title.to_string()),
            level: profile.level,
            max_level_reached: profile.max_level_reached,
        }
    }
}

/// Leaderboard orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingOrder {
    /// Profile level, ties broken by score
    #[default]
    Level,
    Score,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    pub entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, username: &str) -> Option<&ScoreEntry> {
        self.entries.iter().find(|e| e.name == username)
    }

    /// Insert or replace the entry for `profile`
    pub fn sync(&mut self, profile: &UserProfile, timestamp: f64) {
        let entry = ScoreEntry::from_profile(profile, timestamp);
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Entries sorted best first
    pub fn sorted(&self, order: RankingOrder) -> Vec<&ScoreEntry> {
        let mut sorted: Vec<&ScoreEntry> = self.entries.iter().collect();
        match order {
            RankingOrder::Level => {
                sorted.sort_by(|a, b| b.level.cmp(&a.level).then(b.score.cmp(&a.score)))
            }
            RankingOrder::Score => sorted.sort_by(|a, b| b.score.cmp(&a.score)),
        }
        sorted
    }

    /// Top score on the board (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.score).max()
    }

    /// Load the board; missing or malformed data reads as empty
    pub fn load(storage: &dyn Storage) -> Result<Self, StorageError> {
        let board: Option<Self> = read_json(storage, keys::RANKING)?;
        let board = board.unwrap_or_default();
        log::debug!("Loaded leaderboard ({} entries)", board.len());
        Ok(board)
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        write_json(storage, keys::RANKING, self)
    }
}
