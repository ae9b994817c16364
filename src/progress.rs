//! Player progress: best scores, per-game counters, achievements, daily bests
//!
//! Persisted to LocalStorage as one JSON record. Game ids are stored as their
//! string form so records written by other builds still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::Difficulty;
use crate::sim::{GameId, RunResult};

/// Lifetime counters for one game
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameStats {
    pub plays: u32,
    pub wins: u32,
    pub best_combo: u32,
    pub best_tile: u32,
    pub longest_run: u32,
    pub total_score: u64,
}

/// Best score of the day for a daily challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBest {
    pub game_id: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressState {
    /// game id -> difficulty -> best score
    pub high_scores: BTreeMap<String, BTreeMap<Difficulty, u32>>,
    pub tutorials_seen: BTreeMap<String, bool>,
    /// Unlocked achievement ids in unlock order
    pub achievements: Vec<String>,
    pub stats: BTreeMap<String, GameStats>,
    /// `YYYY-MM-DD` -> best daily run
    pub daily_best: BTreeMap<String, DailyBest>,
}

/// Whole-number stat from a result, 0 when absent
fn whole_stat(result: &RunResult, key: &str) -> u32 {
    result.stat(key).map_or(0, |v| v.max(0.0).round() as u32)
}

impl ProgressState {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arcade_hub_progress";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished run into best scores and counters
    pub fn record_result(&mut self, game: GameId, difficulty: Difficulty, result: &RunResult) {
        let best = self
            .high_scores
            .entry(game.as_str().to_string())
            .or_default()
            .entry(difficulty)
            .or_insert(0);
        *best = (*best).max(result.score);

        let stats = self.stats.entry(game.as_str().to_string()).or_default();
        stats.plays += 1;
        stats.wins += result.won as u32;
        stats.best_combo = stats.best_combo.max(whole_stat(result, "combo"));
        stats.best_tile = stats.best_tile.max(whole_stat(result, "tile"));
        stats.longest_run = stats.longest_run.max(whole_stat(result, "run"));
        stats.total_score += result.score as u64;
    }

    /// Keep the day's record unless the same game already did at least as well.
    /// Returns true if the record changed.
    pub fn record_daily_best(&mut self, date_key: &str, game: GameId, score: u32) -> bool {
        if let Some(current) = self.daily_best.get(date_key) {
            if current.game_id == game.as_str() && current.score >= score {
                return false;
            }
        }
        self.daily_best.insert(
            date_key.to_string(),
            DailyBest {
                game_id: game.as_str().to_string(),
                score,
            },
        );
        true
    }

    /// Append newly unlocked ids, skipping ones already held
    pub fn unlock_achievements<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            let id = id.as_ref();
            if !self.achievements.iter().any(|a| a == id) {
                log::info!("Achievement unlocked: {}", id);
                self.achievements.push(id.to_string());
            }
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn mark_tutorial_seen(&mut self, game: GameId) {
        self.tutorials_seen.insert(game.as_str().to_string(), true);
    }

    pub fn tutorial_seen(&self, game: GameId) -> bool {
        self.tutorials_seen.get(game.as_str()).copied().unwrap_or(false)
    }

    /// Best score for one difficulty, or across all of them
    pub fn best_score(&self, game: GameId, difficulty: Option<Difficulty>) -> u32 {
        let Some(scores) = self.high_scores.get(game.as_str()) else {
            return 0;
        };
        match difficulty {
            Some(d) => scores.get(&d).copied().unwrap_or(0),
            None => scores.values().copied().max().unwrap_or(0),
        }
    }

    pub fn stats_for(&self, game: GameId) -> GameStats {
        self.stats.get(game.as_str()).copied().unwrap_or_default()
    }

    /// Games with at least one recorded play
    pub fn games_played(&self) -> usize {
        self.stats.values().filter(|s| s.plays > 0).count()
    }

    /// Parse a stored record; missing sections default, garbage resets
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable progress: {}", e);
            Self::default()
        })
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load progress from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                let progress = Self::from_json(&json);
                log::info!(
                    "Loaded progress: {} games played, {} achievements",
                    progress.games_played(),
                    progress.achievements.len()
                );
                return progress;
            }
        }

        log::info!("No progress found, starting fresh");
        Self::new()
    }

    /// Save progress to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> crate::Result<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| crate::ArcadeError::Storage("localStorage unavailable".into()))?;

        storage
            .set_item(Self::STORAGE_KEY, &self.to_json()?)
            .map_err(|_| crate::ArcadeError::Storage("progress write refused".into()))?;
        log::info!("Progress saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> crate::Result<()> {
        Ok(())
    }
}
