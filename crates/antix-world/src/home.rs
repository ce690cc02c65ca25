//! Home zones: catchment, delivered pucks and score.

use antix_core::{Color, HomeId, HomeStats, PuckId, Torus};
use std::collections::VecDeque;

/// A home zone that robots deliver pucks to
#[derive(Debug, Clone)]
pub struct Home {
    pub(crate) id: HomeId,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) r: f64,
    pub(crate) color: Color,
    score: u64,
    /// Delivered pucks, oldest delivery first
    pub(crate) delivered: VecDeque<PuckId>,
    pub(crate) deliveries: u64,
    pub(crate) pucks_lost: u64,
}

impl Home {
    pub(crate) fn new(id: HomeId, x: f64, y: f64, r: f64, color: Color) -> Self {
        Self {
            id,
            x,
            y,
            r,
            color,
            score: 0,
            delivered: VecDeque::new(),
            deliveries: 0,
            pucks_lost: 0,
        }
    }

    pub fn id(&self) -> HomeId {
        self.id
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Catchment radius
    pub fn radius(&self) -> f64 {
        self.r
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Delivered pucks in delivery order, oldest first
    pub fn delivered(&self) -> impl ExactSizeIterator<Item = PuckId> + '_ {
        self.delivered.iter().copied()
    }

    /// Torus distance to `(x, y)` when the point lies strictly inside the catchment
    pub fn catchment_distance(&self, torus: &Torus, x: f64, y: f64) -> Option<f64> {
        let distance = torus.distance(self.x, self.y, x, y);
        (distance < self.r).then_some(distance)
    }

    pub(crate) fn award_point(&mut self) {
        self.score += 1;
    }

    /// Drop a puck from the delivered set. Returns whether it was there.
    pub(crate) fn forget(&mut self, puck: PuckId) -> bool {
        match self.delivered.iter().position(|p| *p == puck) {
            Some(pos) => {
                self.delivered.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> HomeStats {
        HomeStats {
            home: self.id,
            score: self.score,
            deliveries: self.deliveries,
            pucks_lost: self.pucks_lost,
            delivered_now: self.delivered.len(),
        }
    }
}
