//! Scorecard persistence.
//!
//! Stores upsert by run id and answer two queries: the leaderboard (top
//! N by total score, optionally per scenario) and the personal best for
//! one scenario. Persistence failure is never fatal to a run; callers
//! keep the computed card and log a warning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

use super::card::ScoreCard;

/// Storage backend for finished scorecards.
pub trait ScoreStore: Send {
    /// Inserts or replaces the card with the same run id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot write.
    fn save(&mut self, card: &ScoreCard) -> Result<(), PersistenceError>;

    /// Top `limit` cards by total score, descending. `scenario` filters
    /// to one scenario id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot read.
    fn top_n(
        &self,
        limit: usize,
        scenario: Option<&str>,
    ) -> Result<Vec<ScoreCard>, PersistenceError>;

    /// Highest-scoring card for `scenario`, if any run was saved.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot read.
    fn best_for(&self, scenario: &str) -> Result<Option<ScoreCard>, PersistenceError> {
        Ok(self.top_n(1, Some(scenario))?.into_iter().next())
    }

    /// Sum of XP across all saved runs.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend cannot read.
    fn total_xp(&self) -> Result<u64, PersistenceError>;
}

fn rank(cards: &mut Vec<ScoreCard>, limit: usize, scenario: Option<&str>) {
    if let Some(id) = scenario {
        cards.retain(|c| c.scenario_id == id);
    }
    // Stable sort: ties keep insertion (save) order
    cards.sort_by_key(|c| std::cmp::Reverse(c.total_score()));
    cards.truncate(limit);
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: Vec<ScoreCard>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn save(&mut self, card: &ScoreCard) -> Result<(), PersistenceError> {
        if let Some(existing) = self.cards.iter_mut().find(|c| c.run_id == card.run_id) {
            *existing = card.clone();
        } else {
            self.cards.push(card.clone());
        }
        Ok(())
    }

    fn top_n(
        &self,
        limit: usize,
        scenario: Option<&str>,
    ) -> Result<Vec<ScoreCard>, PersistenceError> {
        let mut cards = self.cards.clone();
        rank(&mut cards, limit, scenario);
        Ok(cards)
    }

    fn total_xp(&self) -> Result<u64, PersistenceError> {
        Ok(self.cards.iter().map(ScoreCard::xp_earned).sum())
    }
}

/// On-disk JSON document holding every saved card.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreFile {
    cards: Vec<ScoreCard>,
}

/// File-backed store: one JSON document, rewritten atomically on save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store over `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ScoreFile, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ScoreFile::default()),
            Err(e) => Err(PersistenceError::Io(e)),
        }
    }

    fn persist(&self, file: &ScoreFile) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write-then-rename so a crash mid-write never truncates history
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn save(&mut self, card: &ScoreCard) -> Result<(), PersistenceError> {
        let mut file = self.load()?;
        if let Some(existing) = file.cards.iter_mut().find(|c| c.run_id == card.run_id) {
            *existing = card.clone();
        } else {
            file.cards.push(card.clone());
        }
        self.persist(&file)
    }

    fn top_n(
        &self,
        limit: usize,
        scenario: Option<&str>,
    ) -> Result<Vec<ScoreCard>, PersistenceError> {
        let mut cards = self.load()?.cards;
        rank(&mut cards, limit, scenario);
        Ok(cards)
    }

    fn total_xp(&self) -> Result<u64, PersistenceError> {
        Ok(self.load()?.cards.iter().map(ScoreCard::xp_earned).sum())
    }
}
