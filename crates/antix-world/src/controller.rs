//! The controller seam: what a robot strategy sees and what it may ask for.

use crate::home::Home;
use crate::robot::{SeenPuck, SeenRobot};
use crate::world::World;
use antix_core::{Pose, RobotId, SensorConfig, Speed, Tick, Torus};

/// Everything a controller may read when deciding a robot's next move
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    pub robot: RobotId,
    pub pose: Pose,
    pub speed: Speed,
    pub holding: bool,
    pub home: &'a Home,
    pub seen_robots: &'a [SeenRobot],
    pub seen_pucks: &'a [SeenPuck],
    pub torus: Torus,
    pub sensor: &'a SensorConfig,
    pub tick: Tick,
}

impl ControlInput<'_> {
    /// Displacement and distance from the robot to its home, across the seam
    pub fn home_vector(&self) -> (f64, f64, f64) {
        let (hx, hy) = self.home.position();
        let (dx, dy) = self.torus.delta(self.pose.x, self.pose.y, hx, hy);
        (dx, dy, dx.hypot(dy))
    }

    pub fn at_home(&self) -> bool {
        self.home_vector().2 < self.home.radius()
    }
}

impl World {
    /// The controller's view of `robot` as the world stands now.
    pub fn control_input(&self, robot: RobotId) -> ControlInput<'_> {
        let r = &self.robots[robot.index()];
        ControlInput {
            robot,
            pose: r.pose,
            speed: r.speed,
            holding: r.is_holding(),
            home: &self.homes[r.home.index()],
            seen_robots: &r.seen_robots,
            seen_pucks: &r.seen_pucks,
            torus: self.torus,
            sensor: &self.config.sensor,
            tick: self.tick,
        }
    }
}

/// Economy request issued alongside a speed command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    None,
    Pickup,
    Drop,
}

/// A controller's decision for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Command {
    pub speed: Speed,
    pub action: Action,
}

impl Command {
    pub fn drive(speed: Speed) -> Self {
        Self {
            speed,
            action: Action::None,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }
}

/// A robot behaviour, consulted once per tick after sensing.
pub trait Controller: Send {
    fn decide(&mut self, input: &ControlInput<'_>) -> Command;

    fn name(&self) -> &'static str {
        "anonymous"
    }
}

impl<F> Controller for F
where
    F: FnMut(&ControlInput<'_>) -> Command + Send,
{
    fn decide(&mut self, input: &ControlInput<'_>) -> Command {
        self(input)
    }
}
