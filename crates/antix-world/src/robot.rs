//! Robot state and sensor detections.

use antix_core::{HomeId, Pose, PuckId, RobotId, Speed};
use serde::{Deserialize, Serialize};

/// Another robot seen by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeenRobot {
    pub robot: RobotId,
    pub home: HomeId,
    pub pose: Pose,
    pub speed: Speed,
    pub range: f64,
    /// Bearing relative to the observer's heading, in `(-π, π]`
    pub bearing: f64,
    pub has_puck: bool,
}

/// A puck seen by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeenPuck {
    pub puck: PuckId,
    pub range: f64,
    pub bearing: f64,
    pub held: bool,
}

/// A robot in the simulation
#[derive(Debug, Clone)]
pub struct Robot {
    pub(crate) id: RobotId,
    pub(crate) home: HomeId,
    pub(crate) pose: Pose,
    pub(crate) speed: Speed,
    pub(crate) held_puck: Option<PuckId>,
    pub(crate) cell: usize,
    pub(crate) seen_robots: Vec<SeenRobot>,
    pub(crate) seen_pucks: Vec<SeenPuck>,
}

impl Robot {
    pub(crate) fn new(id: RobotId, home: HomeId, pose: Pose, cell: usize) -> Self {
        Self {
            id,
            home,
            pose,
            speed: Speed::default(),
            held_puck: None,
            cell,
            seen_robots: Vec::new(),
            seen_pucks: Vec::new(),
        }
    }

    pub fn id(&self) -> RobotId {
        self.id
    }

    /// Owning home; fixed for the robot's lifetime
    pub fn home(&self) -> HomeId {
        self.home
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn held_puck(&self) -> Option<PuckId> {
        self.held_puck
    }

    pub fn is_holding(&self) -> bool {
        self.held_puck.is_some()
    }

    /// Grid cell the robot is currently filed under
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Robots detected by the last sensor refresh. Valid until the next one.
    pub fn seen_robots(&self) -> &[SeenRobot] {
        &self.seen_robots
    }

    /// Pucks detected by the last sensor refresh. Valid until the next one.
    pub fn seen_pucks(&self) -> &[SeenPuck] {
        &self.seen_pucks
    }
}
