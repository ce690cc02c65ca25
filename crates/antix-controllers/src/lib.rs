//! Reference robot behaviours for the Antix simulation.

pub mod forager;
pub mod swarmer;

pub use forager::Forager;
pub use swarmer::Swarmer;

use antix_core::{normalize_angle, Pose, RobotId};
use antix_world::Controller;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available controller strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    #[default]
    Forager,
    Swarmer,
}

impl ControllerKind {
    /// Build a controller for `robot`. Per-robot randomness is derived from
    /// `seed` and the robot handle so runs are reproducible.
    pub fn build(self, robot: RobotId, seed: u64, invert: bool) -> Box<dyn Controller> {
        match self {
            ControllerKind::Forager => Box::new(Forager::new(robot_seed(seed, robot))),
            ControllerKind::Swarmer => Box::new(Swarmer::new(invert)),
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Forager => write!(f, "forager"),
            ControllerKind::Swarmer => write!(f, "swarmer"),
        }
    }
}

impl FromStr for ControllerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forager" => Ok(ControllerKind::Forager),
            "swarmer" => Ok(ControllerKind::Swarmer),
            other => Err(format!(
                "unknown controller '{other}', expected forager or swarmer"
            )),
        }
    }
}

fn robot_seed(seed: u64, robot: RobotId) -> u64 {
    seed ^ (robot.index() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Turn needed to face the displacement `(dx, dy)`, clamped to `max_turn`
pub(crate) fn turn_towards(pose: Pose, dx: f64, dy: f64, max_turn: f64) -> f64 {
    normalize_angle(dy.atan2(dx) - pose.a).clamp(-max_turn, max_turn)
}
