//! Puck economy: pickup, drop, delivery and timeout scoring.

use crate::world::World;
use antix_core::{HomeId, PuckId, RobotId};
use rand::Rng;
use tracing::{debug, event, trace, Level};

impl World {
    /// Pick up the nearest eligible puck in the robot's last sensor snapshot.
    ///
    /// A puck is eligible when it was seen closer than `pickup_range` and is
    /// not held right now. Ties in range go to the lower puck handle. Returns
    /// false with no side effects when the robot already holds a puck or
    /// nothing qualifies.
    pub fn pickup(&mut self, robot: RobotId) -> bool {
        let carrier = &self.robots[robot.index()];
        if carrier.held_puck.is_some() {
            return false;
        }

        let pickup_range = self.config.sensor.pickup_range;
        let chosen = carrier
            .seen_pucks
            .iter()
            .filter(|seen| seen.range < pickup_range && !self.pucks[seen.puck.index()].held)
            .min_by(|a, b| a.range.total_cmp(&b.range).then(a.puck.cmp(&b.puck)))
            .map(|seen| seen.puck);

        let Some(id) = chosen else {
            return false;
        };
        let pose = carrier.pose;

        let puck = &mut self.pucks[id.index()];
        if let Some(cell) = puck.cell.take() {
            self.grid.remove_puck(cell, id);
        }
        if let Some(home) = puck.owning_home.take() {
            let home = &mut self.homes[home.index()];
            if home.forget(id) {
                home.pucks_lost += 1;
            }
        }
        puck.held = true;
        puck.x = pose.x;
        puck.y = pose.y;

        self.robots[robot.index()].held_puck = Some(id);
        self.counters.pickups += 1;
        trace!(tick = self.tick, robot = %robot, puck = %id, "Puck picked up");
        true
    }

    /// Release the held puck at the robot's position and test it for
    /// delivery. Returns false when nothing was held.
    pub fn drop_puck(&mut self, robot: RobotId) -> bool {
        let carrier = &mut self.robots[robot.index()];
        let Some(id) = carrier.held_puck.take() else {
            return false;
        };
        let (x, y, cell) = (carrier.pose.x, carrier.pose.y, carrier.cell);

        let puck = &mut self.pucks[id.index()];
        puck.held = false;
        puck.x = x;
        puck.y = y;
        puck.cell = Some(cell);
        self.grid.insert_puck(cell, id);

        self.counters.drops += 1;
        trace!(tick = self.tick, robot = %robot, puck = %id, x, y, "Puck dropped");
        self.settle_puck(id);
        true
    }

    /// Containment test for a resting puck: hand it to the closest home whose
    /// catchment holds it, if any.
    pub(crate) fn settle_puck(&mut self, id: PuckId) -> Option<HomeId> {
        let (x, y) = self.pucks[id.index()].position();
        let torus = self.torus;

        let home = self
            .homes
            .iter()
            .filter_map(|home| home.catchment_distance(&torus, x, y).map(|d| (d, home.id)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, home)| home)?;

        let puck = &mut self.pucks[id.index()];
        puck.owning_home = Some(home);
        puck.delivery_tick = self.tick;

        let target = &mut self.homes[home.index()];
        target.delivered.push_back(id);
        target.deliveries += 1;

        debug!(
            event = "puck_delivered",
            tick = self.tick,
            puck = %id,
            home = %home,
            "Puck delivered"
        );
        Some(home)
    }

    /// Score and relocate every puck that has rested in `home` for at least
    /// `score_time` ticks. Returns how many scored.
    pub fn process_home_timeouts(&mut self, home: HomeId) -> u64 {
        let score_time = self.config.economy.score_time;
        let mut scored = 0;

        loop {
            let Some(&oldest) = self.homes[home.index()].delivered.front() else {
                break;
            };
            if self.tick - self.pucks[oldest.index()].delivery_tick < score_time {
                break;
            }

            let target = &mut self.homes[home.index()];
            target.delivered.pop_front();
            target.award_point();
            scored += 1;

            event!(
                Level::DEBUG,
                counter_name = "pucks_scored",
                counter_value = 1,
                tick = self.tick,
                home = %home,
                puck = %oldest,
                score = target.score(),
                "Puck scored"
            );

            self.relocate_puck(oldest);
        }

        scored
    }

    pub(crate) fn process_all_timeouts(&mut self) -> u64 {
        (0..self.homes.len())
            .map(|h| self.process_home_timeouts(HomeId(h)))
            .sum()
    }

    /// Move a scored puck to a uniform-random position and rerun the
    /// containment test there.
    fn relocate_puck(&mut self, id: PuckId) {
        let size = self.config.world.world_size;
        let x = self.rng.gen::<f64>() * size;
        let y = self.rng.gen::<f64>() * size;
        let (x, y) = self.torus.normalize_point(x, y);
        let new_cell = self.grid.cell_of(x, y);

        let puck = &mut self.pucks[id.index()];
        match puck.cell {
            Some(old_cell) => {
                self.grid.relocate_puck(id, old_cell, new_cell);
            }
            None => self.grid.insert_puck(new_cell, id),
        }
        puck.cell = Some(new_cell);
        puck.x = x;
        puck.y = y;
        puck.held = false;
        puck.owning_home = None;

        self.counters.relocations += 1;
        trace!(tick = self.tick, puck = %id, x, y, "Puck relocated");
        self.settle_puck(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antix_core::{Color, Pose, SimConfig, Speed};

    fn world(score_time: u64) -> World {
        let mut config = SimConfig::default();
        config.world.home_count = 0;
        config.world.home_population = 0;
        config.world.puck_count = 0;
        config.economy.score_time = score_time;
        World::empty(config).unwrap()
    }

    #[test]
    fn test_puck_spawned_in_catchment_is_delivered() {
        let mut world = world(10);
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let inside = world.spawn_puck(0.52, 0.5);
        let outside = world.spawn_puck(0.2, 0.2);

        assert_eq!(world.puck(inside).owning_home(), Some(home));
        assert_eq!(world.puck(inside).delivery_tick(), 0);
        assert_eq!(world.puck(outside).owning_home(), None);
        assert_eq!(world.home(home).delivered().collect::<Vec<_>>(), vec![inside]);
    }

    #[test]
    fn test_delivery_scenario() {
        let mut world = world(5);
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let puck = world.spawn_puck(0.21, 0.2);

        world.update_sensors(robot);
        assert!(world.pickup(robot));

        // carry the puck to (0.52, 0.5) and drop it at tick 3
        world.robots[robot.index()].pose = Pose::new(0.52, 0.5, 0.0);
        world.integrate_pose(robot);
        world.tick = 3;
        assert!(world.drop_puck(robot));

        assert_eq!(world.puck(puck).owning_home(), Some(home));
        assert_eq!(world.puck(puck).delivery_tick(), 3);

        for tick in 4..8 {
            world.tick = tick;
            assert_eq!(world.process_home_timeouts(home), 0);
        }
        world.tick = 8;
        assert_eq!(world.process_home_timeouts(home), 1);
        assert_eq!(world.home(home).score(), 1);
        assert!(world.check_invariants().is_ok());

        let relocated = world.puck(puck);
        assert!(!relocated.is_held());
        assert_ne!(relocated.position(), (0.52, 0.5));
        let summary = world.summary();
        assert_eq!(summary.relocations, 1);
        assert_eq!(summary.homes[0].score, 1);
    }

    #[test]
    fn test_drop_outside_catchment_stays_free() {
        let mut world = world(5);
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let puck = world.spawn_puck(0.21, 0.2);

        world.update_sensors(robot);
        assert!(world.pickup(robot));
        assert_eq!(world.puck(puck).cell(), None);
        assert!(world.grid().cells().all(|(_, cell)| cell.pucks.is_empty()));

        world.set_speed(robot, Speed::new(0.1, 0.0));
        world.integrate_pose(robot);
        assert_eq!(world.puck(puck).position(), (world.robot(robot).pose().x, 0.2));

        assert!(world.drop_puck(robot));
        assert!(!world.drop_puck(robot));
        assert_eq!(world.puck(puck).owning_home(), None);
        assert_eq!(world.puck(puck).cell(), Some(world.robot(robot).cell()));
    }

    #[test]
    fn test_pickup_is_idempotent_while_holding() {
        let mut world = world(5);
        let home = world.spawn_home(0.9, 0.9, 0.05, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let first = world.spawn_puck(0.21, 0.2);
        let second = world.spawn_puck(0.215, 0.2);

        world.update_sensors(robot);
        assert!(world.pickup(robot));
        assert_eq!(world.robot(robot).held_puck(), Some(first));

        world.update_sensors(robot);
        assert!(!world.pickup(robot));
        assert!(!world.pickup(robot));
        assert_eq!(world.robot(robot).held_puck(), Some(first));
        assert!(!world.puck(second).is_held());
        assert_eq!(world.summary().pickups, 1);
    }

    #[test]
    fn test_pickup_tie_goes_to_lower_puck() {
        let mut world = world(5);
        let home = world.spawn_home(0.9, 0.9, 0.05, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.5, 0.5, 0.0)).unwrap();
        // mirrored about the heading, same range on both sides
        let lower = world.spawn_puck(0.515625, 0.4921875);
        let upper = world.spawn_puck(0.515625, 0.5078125);

        world.update_sensors(robot);
        let seen = world.robot(robot).seen_pucks();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].range, seen[1].range);

        assert!(world.pickup(robot));
        assert_eq!(world.robot(robot).held_puck(), Some(lower));
        assert!(!world.puck(upper).is_held());
    }

    #[test]
    fn test_pickup_out_of_range_fails() {
        let mut world = world(5);
        let home = world.spawn_home(0.9, 0.9, 0.05, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        world.spawn_puck(0.25, 0.2);

        world.update_sensors(robot);
        assert_eq!(world.robot(robot).seen_pucks().len(), 1);
        assert!(!world.pickup(robot));
        assert!(world.robot(robot).held_puck().is_none());
    }

    #[test]
    fn test_two_robots_cannot_share_a_puck() {
        let mut world = world(5);
        let home = world.spawn_home(0.9, 0.9, 0.05, Color::PALETTE[0]);
        let a = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let b = world
            .spawn_robot(home, Pose::new(0.22, 0.2, std::f64::consts::PI))
            .unwrap();
        let puck = world.spawn_puck(0.21, 0.2);

        world.update_sensors(a);
        world.update_sensors(b);
        assert!(world.pickup(a));
        assert!(!world.pickup(b));
        assert_eq!(world.robot(a).held_puck(), Some(puck));
        assert!(world.robot(b).held_puck().is_none());
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_pickup_from_catchment_counts_as_lost() {
        let mut world = world(50);
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.5, 0.5, 0.0)).unwrap();
        let puck = world.spawn_puck(0.51, 0.5);
        assert_eq!(world.puck(puck).owning_home(), Some(home));

        world.update_sensors(robot);
        assert!(world.pickup(robot));
        assert_eq!(world.puck(puck).owning_home(), None);
        assert_eq!(world.home(home).delivered().len(), 0);
        assert_eq!(world.home(home).stats().pucks_lost, 1);
    }

    #[test]
    fn test_closest_home_wins_overlap() {
        let mut world = world(5);
        world.spawn_home(0.4, 0.5, 0.2, Color::PALETTE[0]);
        let near = world.spawn_home(0.55, 0.5, 0.2, Color::PALETTE[1]);
        let puck = world.spawn_puck(0.5, 0.5);
        assert_eq!(world.puck(puck).owning_home(), Some(near));
    }

    #[test]
    fn test_timeouts_pop_oldest_first() {
        let mut world = world(3);
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let first = world.spawn_puck(0.52, 0.5);
        world.tick = 2;
        let second = world.spawn_puck(0.48, 0.5);

        world.tick = 3;
        assert_eq!(world.process_home_timeouts(home), 1);
        // a redelivered puck goes to the back of the queue
        assert_eq!(world.home(home).delivered().next(), Some(second));
        assert_ne!(world.puck(first).position(), (0.52, 0.5));
        assert_eq!(world.home(home).score(), 1);
    }
}
