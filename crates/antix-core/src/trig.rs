//! Exact and polynomial-approximate trigonometry.
//!
//! The approximate variants trade accuracy for per-candidate cost in the
//! sensor hot path. Their error is bounded and it perturbs detection
//! boundaries by at most that much:
//!
//! | function       | max absolute error          |
//! |----------------|-----------------------------|
//! | [`fast_sin`]   | 1.1e-3                      |
//! | [`fast_cos`]   | 1.1e-3                      |
//! | [`fast_atan2`] | 1.6e-3 rad                  |
//!
//! A bearing error of `ε` moves the FOV edge by `range·ε` at full range, and
//! a sin/cos error of `ε` moves an integrated pose by at most `v·ε` per tick.

use crate::geometry::normalize_angle;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Which trigonometric implementation the engine uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrigMode {
    #[default]
    Exact,
    Approximate,
}

impl TrigMode {
    pub fn sin(self, a: f64) -> f64 {
        match self {
            TrigMode::Exact => a.sin(),
            TrigMode::Approximate => fast_sin(a),
        }
    }

    pub fn cos(self, a: f64) -> f64 {
        match self {
            TrigMode::Exact => a.cos(),
            TrigMode::Approximate => fast_cos(a),
        }
    }

    pub fn atan2(self, y: f64, x: f64) -> f64 {
        match self {
            TrigMode::Exact => y.atan2(x),
            TrigMode::Approximate => fast_atan2(y, x),
        }
    }
}

/// Parabolic sine with one refinement step.
pub fn fast_sin(a: f64) -> f64 {
    const B: f64 = 4.0 / PI;
    const C: f64 = -4.0 / (PI * PI);
    const P: f64 = 0.225;

    let x = normalize_angle(a);
    let y = B * x + C * x * x.abs();
    P * (y * y.abs() - y) + y
}

pub fn fast_cos(a: f64) -> f64 {
    fast_sin(a + FRAC_PI_2)
}

/// Arctangent on `[-1, 1]`.
fn fast_atan_unit(z: f64) -> f64 {
    FRAC_PI_4 * z - z * (z.abs() - 1.0) * (0.2447 + 0.0663 * z.abs())
}

/// Octant-reduced `atan2`, returning a value in `[-π, π]`.
pub fn fast_atan2(y: f64, x: f64) -> f64 {
    let (ax, ay) = (x.abs(), y.abs());
    if ax == 0.0 && ay == 0.0 {
        return 0.0;
    }

    let mut angle = if ax >= ay {
        fast_atan_unit(ay / ax)
    } else {
        FRAC_PI_2 - fast_atan_unit(ax / ay)
    };
    if x < 0.0 {
        angle = PI - angle;
    }
    if y < 0.0 {
        angle = -angle;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn angle_gap(a: f64, b: f64) -> f64 {
        let d = (a - b).abs();
        d.min(TAU - d)
    }

    #[test]
    fn test_fast_sin_cos_error_bound() {
        let steps = 20_000;
        for i in 0..=steps {
            let a = -7.0 + 14.0 * i as f64 / steps as f64;
            assert!((fast_sin(a) - a.sin()).abs() <= 1.1e-3, "sin({a})");
            assert!((fast_cos(a) - a.cos()).abs() <= 1.1e-3, "cos({a})");
        }
    }

    #[test]
    fn test_fast_atan2_error_bound() {
        let steps = 20_000;
        for radius in [0.01, 1.0, 100.0] {
            for i in 0..steps {
                let t = -PI + TAU * i as f64 / steps as f64;
                let (y, x) = (radius * t.sin(), radius * t.cos());
                assert!(
                    angle_gap(fast_atan2(y, x), y.atan2(x)) <= 1.6e-3,
                    "atan2({y}, {x})"
                );
            }
        }
    }

    #[test]
    fn test_fast_atan2_axes() {
        assert_eq!(fast_atan2(0.0, 0.0), 0.0);
        assert!(fast_atan2(0.0, 1.0).abs() < 1e-12);
        assert!((fast_atan2(1.0, 0.0) - FRAC_PI_2).abs() < 1e-12);
        assert!((fast_atan2(0.0, -1.0) - PI).abs() < 1e-12);
        assert!((fast_atan2(-1.0, 0.0) + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_mode_dispatch() {
        assert_eq!(TrigMode::Exact.sin(1.0), 1.0f64.sin());
        assert_eq!(TrigMode::Approximate.cos(0.3), fast_cos(0.3));
        assert_eq!(TrigMode::default(), TrigMode::Exact);
    }
}
