//! Swarmer: circle home and crowd around it.

use antix_core::{normalize_angle, Speed};
use antix_world::{Command, ControlInput, Controller};

const SWARM_SPEED: f64 = 0.005;
const HOME_SPEED: f64 = 0.002;
const HOME_TURN: f64 = 0.05;
const AVOID_TURN: f64 = 0.03;

/// Drives at constant speed, always turning towards home, and slows down
/// inside the catchment. Inside the catchment it turns away from the
/// closest robot it can see, or towards it when `invert` is set.
/// Never picks up or drops pucks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Swarmer {
    invert: bool,
}

impl Swarmer {
    pub fn new(invert: bool) -> Self {
        Self { invert }
    }
}

impl Controller for Swarmer {
    fn decide(&mut self, input: &ControlInput<'_>) -> Command {
        let (dx, dy, distance) = input.home_vector();
        let angle_home = dy.atan2(dx);
        let mut w = if normalize_angle(input.pose.a - angle_home) < 0.0 {
            HOME_TURN
        } else {
            -HOME_TURN
        };

        if distance >= input.home.radius() {
            return Command::drive(Speed::new(SWARM_SPEED, w));
        }

        let closest = input
            .seen_robots
            .iter()
            .min_by(|a, b| a.range.total_cmp(&b.range));
        if let Some(other) = closest {
            w = if other.bearing < 0.0 { AVOID_TURN } else { -AVOID_TURN };
            if self.invert {
                w = -w;
            }
        }
        Command::drive(Speed::new(HOME_SPEED, w))
    }

    fn name(&self) -> &'static str {
        "swarmer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antix_core::{Color, Pose, SimConfig};
    use antix_world::{Action, World};
    use std::f64::consts::FRAC_PI_2;

    fn world() -> World {
        let mut config = SimConfig::default();
        config.world.home_count = 0;
        config.world.home_population = 0;
        config.world.puck_count = 0;
        let mut world = World::empty(config).unwrap();
        world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        world
    }

    #[test]
    fn test_turns_towards_home() {
        let mut world = world();
        let home = world.homes()[0].id();
        // facing north with home due east: turn clockwise
        let north = world.spawn_robot(home, Pose::new(0.2, 0.5, FRAC_PI_2)).unwrap();
        // facing south with home due east: turn anticlockwise
        let south = world.spawn_robot(home, Pose::new(0.2, 0.6, -FRAC_PI_2)).unwrap();

        let command = Swarmer::new(false).decide(&world.control_input(north));
        assert_eq!(command.speed, Speed::new(SWARM_SPEED, -HOME_TURN));
        assert_eq!(command.action, Action::None);

        let command = Swarmer::new(false).decide(&world.control_input(south));
        assert_eq!(command.speed, Speed::new(SWARM_SPEED, HOME_TURN));
    }

    #[test]
    fn test_slows_and_avoids_inside_catchment() {
        let mut world = world();
        let home = world.homes()[0].id();
        let robot = world.spawn_robot(home, Pose::new(0.5, 0.5, 0.0)).unwrap();
        // neighbour ahead and to the left
        world.spawn_robot(home, Pose::new(0.53, 0.51, 0.0)).unwrap();
        world.update_sensors(robot);

        let command = Swarmer::new(false).decide(&world.control_input(robot));
        assert_eq!(command.speed, Speed::new(HOME_SPEED, -AVOID_TURN));

        let command = Swarmer::new(true).decide(&world.control_input(robot));
        assert_eq!(command.speed, Speed::new(HOME_SPEED, AVOID_TURN));
    }
}
