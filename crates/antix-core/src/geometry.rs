//! Torus-aware distance and angle normalisation.
//!
//! Every relative-position computation in the engine goes through [`Torus`],
//! so that sensing and homing behave identically across the world seam.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Convert radians to degrees.
pub fn rtod(r: f64) -> f64 {
    r.to_degrees()
}

/// Convert degrees to radians.
pub fn dtor(d: f64) -> f64 {
    d.to_radians()
}

/// Fold an angle into `(-π, π]`.
pub fn normalize_angle(a: f64) -> f64 {
    let folded = (a + PI).rem_euclid(TAU) - PI;
    if folded <= -PI {
        folded + TAU
    } else {
        folded
    }
}

/// A square world of side `size`, periodic in both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    size: f64,
}

impl Torus {
    pub fn new(size: f64) -> Self {
        Self { size }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Fold an absolute coordinate into `[0, size)`.
    pub fn normalize_distance(&self, d: f64) -> f64 {
        let folded = d.rem_euclid(self.size);
        // rem_euclid may round up to exactly `size` for tiny negative inputs
        if folded >= self.size {
            0.0
        } else {
            folded
        }
    }

    /// Fold a signed coordinate delta into `[-size/2, size/2]`, taking the
    /// shorter way around the torus.
    pub fn wrap_distance(&self, d: f64) -> f64 {
        let half = self.size * 0.5;
        let mut wrapped = d - self.size * (d / self.size).round();
        if wrapped > half {
            wrapped -= self.size;
        } else if wrapped < -half {
            wrapped += self.size;
        }
        wrapped
    }

    /// Wrapped `(dx, dy)` pointing from `(fx, fy)` to `(tx, ty)`.
    pub fn delta(&self, fx: f64, fy: f64, tx: f64, ty: f64) -> (f64, f64) {
        (self.wrap_distance(tx - fx), self.wrap_distance(ty - fy))
    }

    /// Shortest distance between two points on the torus.
    pub fn distance(&self, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
        let (dx, dy) = self.delta(ax, ay, bx, by);
        dx.hypot(dy)
    }

    /// Normalise both coordinates of a point.
    pub fn normalize_point(&self, x: f64, y: f64) -> (f64, f64) {
        (self.normalize_distance(x), self.normalize_distance(y))
    }
}
