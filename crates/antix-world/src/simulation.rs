//! Tick scheduler driving a world through its per-tick phases.

use crate::controller::{Action, Controller};
use crate::robot::Robot;
use crate::snapshot::WorldSnapshot;
use crate::world::World;
use antix_core::{Error, HomeId, Pose, Result, RobotId, RunSummary, Tick};
use tracing::{debug, info, instrument};

/// How often `run` logs progress, in ticks
const PROGRESS_INTERVAL: Tick = 1000;

/// A world plus one controller per robot.
///
/// Each [`step`](Simulation::step) runs four phases, each completing before
/// the next starts:
///
/// 1. home timeouts (scoring and puck relocation)
/// 2. pose integration
/// 3. sensor refresh
/// 4. controllers, in robot order, applying speed and pickup/drop requests
pub struct Simulation {
    world: World,
    controllers: Vec<Box<dyn Controller>>,
    paused: bool,
}

impl Simulation {
    /// Attach a controller built by `factory` to every robot in the world.
    pub fn new<F>(world: World, mut factory: F) -> Self
    where
        F: FnMut(&Robot) -> Box<dyn Controller>,
    {
        let controllers = world.robots().iter().map(&mut factory).collect();
        Self {
            world,
            controllers,
            paused: false,
        }
    }

    pub fn with_controllers(world: World, controllers: Vec<Box<dyn Controller>>) -> Result<Self> {
        if controllers.len() != world.robots().len() {
            return Err(Error::InvalidConfig(format!(
                "{} controllers for {} robots",
                controllers.len(),
                world.robots().len()
            )));
        }
        Ok(Self {
            world,
            controllers,
            paused: false,
        })
    }

    /// Add a robot together with its controller.
    pub fn add_robot(
        &mut self,
        home: HomeId,
        pose: Pose,
        controller: Box<dyn Controller>,
    ) -> Result<RobotId> {
        let id = self.world.spawn_robot(home, pose)?;
        self.controllers.push(controller);
        Ok(id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn tick(&self) -> Tick {
        self.world.tick()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(tick = self.tick(), paused, "Pause toggled");
        }
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// True once the configured tick ceiling has been reached. A ceiling of
    /// zero never finishes.
    pub fn is_finished(&self) -> bool {
        let ceiling = self.world.config().run.updates_max;
        ceiling > 0 && self.tick() >= ceiling
    }

    /// Advance one tick. Returns false, doing nothing, while paused.
    pub fn step(&mut self) -> bool {
        if self.paused {
            return false;
        }

        let scored = self.world.process_all_timeouts();
        self.world.integrate_poses();
        self.world.refresh_sensors();
        self.run_controllers();

        if scored > 0 {
            debug!(tick = self.tick(), scored, "Timeouts processed");
        }
        self.world.advance_tick();

        if cfg!(debug_assertions) {
            if let Err(violation) = self.world.check_invariants() {
                panic!(
                    "invariant violated at end of tick {}: {violation}",
                    self.tick()
                );
            }
        }
        true
    }

    fn run_controllers(&mut self) {
        for (i, controller) in self.controllers.iter_mut().enumerate() {
            let id = RobotId(i);
            let command = controller.decide(&self.world.control_input(id));

            self.world.set_speed(id, command.speed);
            match command.action {
                Action::None => {}
                Action::Pickup => {
                    self.world.pickup(id);
                }
                Action::Drop => {
                    self.world.drop_puck(id);
                }
            }
        }
    }

    /// Step up to `ticks` times, stopping early if paused. Returns the number
    /// of ticks actually run.
    pub fn run_for(&mut self, ticks: Tick) -> Tick {
        let mut ran = 0;
        while ran < ticks && self.step() {
            ran += 1;
        }
        ran
    }

    /// Run until the configured tick ceiling.
    #[instrument(skip(self), fields(updates_max = self.world.config().run.updates_max))]
    pub fn run(&mut self) -> Result<RunSummary> {
        let ceiling = self.world.config().run.updates_max;
        if ceiling == 0 {
            return Err(Error::InvalidConfig(
                "run needs a tick ceiling (updates_max > 0); use step or run_for".into(),
            ));
        }

        info!(
            event = "run_started",
            robots = self.world.robots().len(),
            pucks = self.world.pucks().len(),
            homes = self.world.homes().len(),
            "Starting simulation for {} ticks",
            ceiling
        );

        while !self.is_finished() {
            if !self.step() {
                break;
            }
            if self.tick() % PROGRESS_INTERVAL == 0 {
                info!(
                    tick = self.tick(),
                    ceiling,
                    total_score = self.world.summary().total_score(),
                    "Tick {}/{}",
                    self.tick(),
                    ceiling
                );
                self.world.log_tick_totals();
            }
        }

        let summary = self.summary();
        info!(
            event = "run_finished",
            total_ticks = summary.total_ticks,
            total_score = summary.total_score(),
            pickups = summary.pickups,
            drops = summary.drops,
            relocations = summary.relocations,
            "Simulation complete"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        self.world.summary()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            paused: self.paused,
            ..WorldSnapshot::capture(&self.world)
        }
    }

    pub fn controller_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.controllers.iter().map(|c| c.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Command, ControlInput};
    use antix_core::{Color, SimConfig, Speed};
    use proptest::prelude::*;

    fn empty_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.world.home_count = 0;
        config.world.home_population = 0;
        config.world.puck_count = 0;
        config
    }

    fn always_pickup() -> Box<dyn Controller> {
        Box::new(|_: &ControlInput<'_>| Command::drive(Speed::stopped()).with_action(Action::Pickup))
    }

    fn cruise(v: f64, w: f64) -> Box<dyn Controller> {
        Box::new(move |_: &ControlInput<'_>| Command::drive(Speed::new(v, w)))
    }

    #[test]
    fn test_pickup_within_one_tick() {
        let mut world = World::empty(empty_config()).unwrap();
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let puck = world.spawn_puck(0.21, 0.2);

        let mut sim = Simulation::new(world, |_| always_pickup());
        assert!(sim.step());

        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.world().robot(robot).held_puck(), Some(puck));
        assert!(sim.world().puck(puck).is_held());
    }

    #[test]
    fn test_controller_count_must_match() {
        let mut world = World::empty(empty_config()).unwrap();
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        world.spawn_robot(home, Pose::default()).unwrap();
        assert!(Simulation::with_controllers(world, Vec::new()).is_err());
    }

    #[test]
    fn test_pause_freezes_tick() {
        let mut world = World::empty(empty_config()).unwrap();
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let robot = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        let mut sim = Simulation::new(world, |_| cruise(0.01, 0.0));

        sim.run_for(3);
        assert_eq!(sim.tick(), 3);
        let pose = sim.world().robot(robot).pose();

        assert!(sim.toggle_pause());
        assert!(!sim.step());
        assert_eq!(sim.run_for(5), 0);
        assert_eq!(sim.tick(), 3);
        assert_eq!(sim.world().robot(robot).pose(), pose);
        assert!(sim.snapshot().paused);

        sim.set_paused(false);
        assert!(sim.step());
        assert_eq!(sim.tick(), 4);
    }

    #[test]
    fn test_run_stops_at_ceiling() {
        let mut config = SimConfig::default();
        config.run.updates_max = 25;
        let world = World::new(config).unwrap();
        let mut sim = Simulation::new(world, |_| cruise(0.005, 0.02));

        let summary = sim.run().unwrap();
        assert_eq!(summary.total_ticks, 25);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_unbounded_run_is_rejected() {
        let world = World::new(SimConfig::default()).unwrap();
        let mut sim = Simulation::new(world, |_| cruise(0.0, 0.0));
        assert!(sim.run().is_err());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_add_robot_gets_a_controller() {
        let mut world = World::empty(empty_config()).unwrap();
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        let mut sim = Simulation::new(world, |_| cruise(0.0, 0.0));

        let robot = sim
            .add_robot(home, Pose::new(0.1, 0.1, 0.0), cruise(0.01, 0.0))
            .unwrap();
        assert!(sim.add_robot(HomeId(3), Pose::default(), cruise(0.0, 0.0)).is_err());

        sim.step();
        assert!((sim.world().robot(robot).pose().x - 0.1).abs() < 1e-12);
        sim.step();
        assert!((sim.world().robot(robot).pose().x - 0.11).abs() < 1e-12);
        assert_eq!(sim.controller_names().count(), 1);
    }

    #[test]
    fn test_greedy_robots_never_share_pucks() {
        let mut config = SimConfig::default();
        config.world.home_count = 2;
        config.world.home_population = 40;
        config.world.puck_count = 200;
        config.economy.score_time = 5;
        let world = World::new(config).unwrap();

        let mut flip = false;
        let mut sim = Simulation::new(world, move |_| {
            flip = !flip;
            let turn = if flip { 0.1 } else { -0.1 };
            let controller: Box<dyn Controller> = Box::new(move |input: &ControlInput<'_>| {
                let action = if input.holding && input.at_home() {
                    Action::Drop
                } else {
                    Action::Pickup
                };
                Command::drive(Speed::new(0.01, turn)).with_action(action)
            });
            controller
        });

        for _ in 0..200 {
            sim.step();
            let mut holders = vec![0; sim.world().pucks().len()];
            for robot in sim.world().robots() {
                if let Some(puck) = robot.held_puck() {
                    holders[puck.index()] += 1;
                }
            }
            assert!(holders.iter().all(|&n| n <= 1));
        }
        assert!(sim.summary().pickups > 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_grid_stays_consistent(
            speeds in prop::collection::vec((0.0f64..0.3, -3.5f64..3.5), 1..12),
            ticks in 1u64..20,
            parallel in any::<bool>(),
        ) {
            let mut config = empty_config();
            config.run.parallel_sensing = parallel;
            let mut world = World::empty(config).unwrap();
            let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
            for (i, _) in speeds.iter().enumerate() {
                let t = i as f64 / speeds.len() as f64;
                world.spawn_robot(home, Pose::new(t, 1.0 - t, t * 6.0)).unwrap();
                world.spawn_puck(t, t);
            }

            let mut sim = Simulation::with_controllers(
                world,
                speeds.iter().map(|&(v, w)| cruise(v, w)).collect(),
            ).unwrap();
            sim.run_for(ticks);

            let world = sim.world();
            for robot in world.robots() {
                let pose = robot.pose();
                prop_assert_eq!(world.grid().cell_of(pose.x, pose.y), robot.cell());
            }
            prop_assert!(world.check_invariants().is_ok());
        }
    }
}
