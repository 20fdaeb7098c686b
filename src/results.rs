//! Race results board
//!
//! Keeps the outcome of every race finished this session, fastest user wins
//! first. Cleared when the session goes back to the home menu.

use serde::{Deserialize, Serialize};

use crate::sim::entity::Side;

/// Maximum number of results to keep
pub const MAX_RESULTS: usize = 10;

/// Outcome of one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub player_name: String,
    pub winner: Side,
    /// Name of the winning vehicle
    pub winner_vehicle: String,
    /// Race seconds until the winner finished
    pub race_time: f32,
}

impl RaceResult {
    pub fn user_won(&self) -> bool {
        self.winner == Side::User
    }

    /// One-line summary for the final screen
    pub fn headline(&self) -> String {
        let name = if self.player_name.is_empty() {
            "Player"
        } else {
            self.player_name.as_str()
        };
        if self.user_won() {
            format!("{} wins with {} in {:.2}s", name, self.winner_vehicle, self.race_time)
        } else {
            format!(
                "{} beat {} in {:.2}s",
                self.winner_vehicle, name, self.race_time
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RaceResults {
    pub entries: Vec<RaceResult>,
}

impl RaceResults {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sort key: user wins by time, then losses by time
    fn ranks_before(a: &RaceResult, b: &RaceResult) -> bool {
        match (a.user_won(), b.user_won()) {
            (true, false) => true,
            (false, true) => false,
            _ => a.race_time < b.race_time,
        }
    }

    /// Add a result; returns its rank (1-indexed) or None if it fell off the board
    pub fn record(&mut self, result: RaceResult) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| Self::ranks_before(&result, e))
            .unwrap_or(self.entries.len());
        if pos >= MAX_RESULTS {
            return None;
        }
        log::info!("Race result #{}: {}", pos + 1, result.headline());
        self.entries.insert(pos, result);
        self.entries.truncate(MAX_RESULTS);
        Some(pos + 1)
    }

    /// Fastest user win
    pub fn best_time(&self) -> Option<f32> {
        self.entries
            .first()
            .filter(|e| e.user_won())
            .map(|e| e.race_time)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
