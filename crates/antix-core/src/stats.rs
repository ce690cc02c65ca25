//! Score and statistics tracking for homes and runs.

use crate::types::{HomeId, Tick};
use serde::{Deserialize, Serialize};

/// Economy counters for one home
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeStats {
    pub home: HomeId,
    /// Pucks that timed out in this home; never decreases
    pub score: u64,
    /// Pucks that came to rest inside the catchment (drops and relocations)
    pub deliveries: u64,
    /// Delivered pucks picked up again before they scored
    pub pucks_lost: u64,
    /// Pucks currently resting in the catchment
    pub delivered_now: usize,
}

impl HomeStats {
    pub fn new(home: HomeId) -> Self {
        Self {
            home,
            score: 0,
            deliveries: 0,
            pucks_lost: 0,
            delivered_now: 0,
        }
    }

    /// Fraction of deliveries that went on to score
    pub fn conversion_rate(&self) -> f64 {
        if self.deliveries == 0 {
            0.0
        } else {
            self.score as f64 / self.deliveries as f64
        }
    }
}

/// Summary of a finished (or interrupted) run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_ticks: Tick,
    pub homes: Vec<HomeStats>,
    pub pickups: u64,
    pub drops: u64,
    pub relocations: u64,
}

impl RunSummary {
    pub fn total_score(&self) -> u64 {
        self.homes.iter().map(|h| h.score).sum()
    }

    /// Highest-scoring home; ties go to the lower handle.
    pub fn leader(&self) -> Option<&HomeStats> {
        self.homes
            .iter()
            .max_by(|a, b| a.score.cmp(&b.score).then(b.home.cmp(&a.home)))
    }
}
