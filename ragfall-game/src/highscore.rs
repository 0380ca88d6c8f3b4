//! Per-mode, per-level top-five score ledger.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::HighScoreStorage;
use crate::constants::HIGH_SCORE_SLOTS;
use crate::level::GameMode;

/// `mode -> level id -> scores`, each list descending and at most five long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScoreTable {
    entries: BTreeMap<GameMode, BTreeMap<u32, Vec<u64>>>,
}

impl HighScoreTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted table; malformed input is treated as absent.
    #[must_use]
    pub fn from_json_or_empty(json: &str) -> Self {
        match serde_json::from_str::<Self>(json) {
            Ok(table) => table.normalized(),
            Err(err) => {
                warn!("discarding malformed high-score data: {err}");
                Self::default()
            }
        }
    }

    /// Serialize the whole mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn top(&self, mode: GameMode, level_id: u32) -> &[u64] {
        self.entries
            .get(&mode)
            .and_then(|levels| levels.get(&level_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `score` would be admitted for this key.
    #[must_use]
    pub fn qualifies(&self, mode: GameMode, level_id: u32, score: u64) -> bool {
        let scores = self.top(mode, level_id);
        scores.len() < HIGH_SCORE_SLOTS || scores.last().is_some_and(|&lowest| score > lowest)
    }

    /// Insert a qualifying score, returning its 1-based rank.
    pub fn insert(&mut self, mode: GameMode, level_id: u32, score: u64) -> Option<usize> {
        if !self.qualifies(mode, level_id, score) {
            return None;
        }
        let scores = self
            .entries
            .entry(mode)
            .or_default()
            .entry(level_id)
            .or_default();
        scores.push(score);
        scores.sort_by(|a, b| b.cmp(a));
        scores.truncate(HIGH_SCORE_SLOTS);
        let rank = scores.iter().filter(|&&existing| existing > score).count() + 1;
        Some(rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameMode, u32, &[u64])> {
        self.entries.iter().flat_map(|(&mode, levels)| {
            levels
                .iter()
                .map(move |(&level, scores)| (mode, level, scores.as_slice()))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// Re-establish ordering and length invariants on externally sourced data.
    #[must_use]
    fn normalized(mut self) -> Self {
        for levels in self.entries.values_mut() {
            for scores in levels.values_mut() {
                scores.sort_by(|a, b| b.cmp(a));
                scores.truncate(HIGH_SCORE_SLOTS);
            }
        }
        self
    }
}

/// High-score table bound to its persistence backend.
#[derive(Debug)]
pub struct HighScoreLedger<S: HighScoreStorage> {
    table: HighScoreTable,
    storage: S,
}

impl<S: HighScoreStorage> HighScoreLedger<S> {
    /// Load the persisted table, falling back to an empty one on any failure.
    pub fn load(storage: S) -> Self {
        let table = match storage.load_table() {
            Ok(Some(table)) => table.normalized(),
            Ok(None) => HighScoreTable::default(),
            Err(err) => {
                warn!("high-score table unavailable, starting empty: {err}");
                HighScoreTable::default()
            }
        };
        Self { table, storage }
    }

    /// Offer a score; persists the whole table when it is admitted.
    pub fn record(&mut self, mode: GameMode, level_id: u32, score: u64) -> Option<usize> {
        let rank = self.table.insert(mode, level_id, score)?;
        debug!("high score {score} admitted at rank {rank} for {mode}/{level_id}");
        if let Err(err) = self.storage.save_table(&self.table) {
            warn!("failed to persist high scores: {err}");
        }
        Some(rank)
    }

    #[must_use]
    pub fn top(&self, mode: GameMode, level_id: u32) -> &[u64] {
        self.table.top(mode, level_id)
    }

    #[must_use]
    pub fn is_high_score(&self, mode: GameMode, level_id: u32, score: u64) -> bool {
        self.table.qualifies(mode, level_id, score)
    }

    #[must_use]
    pub const fn table(&self) -> &HighScoreTable {
        &self.table
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
