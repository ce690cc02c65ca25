//! The world context: arenas of robots, pucks and homes plus the grid index.

use crate::grid::Grid;
use crate::home::Home;
use crate::puck::Puck;
use crate::robot::{Robot, SeenPuck, SeenRobot};
use crate::sensor::SensorField;
use antix_core::{
    normalize_angle, Color, Error, HomeId, Pose, PuckId, Result, RobotId, RunSummary, SimConfig,
    Speed, Tick, Torus,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, trace};

/// Running totals of economy events
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EconomyCounters {
    pub pickups: u64,
    pub drops: u64,
    pub relocations: u64,
}

/// Owns every entity of one simulation run.
///
/// Entities live in contiguous arenas addressed by stable handles; grid
/// cells and home delivery queues store handles, never references.
pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) torus: Torus,
    pub(crate) grid: Grid,
    pub(crate) robots: Vec<Robot>,
    pub(crate) pucks: Vec<Puck>,
    pub(crate) homes: Vec<Home>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tick: Tick,
    pub(crate) counters: EconomyCounters,
}

impl World {
    /// Build a world with no entities.
    pub fn empty(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let torus = Torus::new(config.world.world_size);
        let grid = Grid::new(torus, config.matrix_width());
        let rng = ChaCha8Rng::seed_from_u64(config.run.seed);

        Ok(Self {
            config,
            torus,
            grid,
            robots: Vec::new(),
            pucks: Vec::new(),
            homes: Vec::new(),
            rng,
            tick: 0,
            counters: EconomyCounters::default(),
        })
    }

    /// Build and populate a world from its configuration.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut world = Self::empty(config)?;
        world.populate()?;
        Ok(world)
    }

    /// Create the configured homes, then each home's robots, then the pucks.
    /// The first home sits at the world centre, the rest at random.
    fn populate(&mut self) -> Result<()> {
        let size = self.config.world.world_size;
        let radius = self.config.world.home_radius;

        for i in 0..self.config.world.home_count {
            let color = Color::for_home(i, &mut self.rng);
            let (x, y) = if i == 0 {
                (size / 2.0, size / 2.0)
            } else {
                (self.rng.gen::<f64>() * size, self.rng.gen::<f64>() * size)
            };
            self.spawn_home(x, y, radius, color);
        }

        for h in 0..self.homes.len() {
            for _ in 0..self.config.world.home_population {
                let pose = Pose::random(&mut self.rng, size);
                self.spawn_robot(HomeId(h), pose)?;
            }
        }

        for _ in 0..self.config.world.puck_count {
            let (x, y) = (self.rng.gen::<f64>() * size, self.rng.gen::<f64>() * size);
            self.spawn_puck(x, y);
        }

        info!(
            homes = self.homes.len(),
            robots = self.robots.len(),
            pucks = self.pucks.len(),
            grid_width = self.grid.width(),
            "World populated"
        );
        Ok(())
    }

    pub fn spawn_home(&mut self, x: f64, y: f64, r: f64, color: Color) -> HomeId {
        let id = HomeId(self.homes.len());
        let (x, y) = self.torus.normalize_point(x, y);
        self.homes.push(Home::new(id, x, y, r, color));
        id
    }

    pub fn spawn_robot(&mut self, home: HomeId, pose: Pose) -> Result<RobotId> {
        if home.index() >= self.homes.len() {
            return Err(Error::UnknownEntity(home.to_string()));
        }
        let id = RobotId(self.robots.len());
        let (x, y) = self.torus.normalize_point(pose.x, pose.y);
        let pose = Pose::new(x, y, normalize_angle(pose.a));
        let cell = self.grid.cell_of(x, y);

        self.grid.insert_robot(cell, id);
        self.robots.push(Robot::new(id, home, pose, cell));
        Ok(id)
    }

    /// Place a new puck. It is immediately tested for containment, so a puck
    /// spawned inside a catchment starts out delivered.
    pub fn spawn_puck(&mut self, x: f64, y: f64) -> PuckId {
        let id = PuckId(self.pucks.len());
        let (x, y) = self.torus.normalize_point(x, y);
        let cell = self.grid.cell_of(x, y);

        let mut puck = Puck::new(id, x, y);
        puck.cell = Some(cell);
        self.pucks.push(puck);
        self.grid.insert_puck(cell, id);
        self.settle_puck(id);
        id
    }

    pub fn set_speed(&mut self, robot: RobotId, speed: Speed) {
        self.robots[robot.index()].speed = speed;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn torus(&self) -> Torus {
        self.torus
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn pucks(&self) -> &[Puck] {
        &self.pucks
    }

    pub fn homes(&self) -> &[Home] {
        &self.homes
    }

    pub fn robot(&self, id: RobotId) -> &Robot {
        &self.robots[id.index()]
    }

    pub fn puck(&self, id: PuckId) -> &Puck {
        &self.pucks[id.index()]
    }

    pub fn home(&self, id: HomeId) -> &Home {
        &self.homes[id.index()]
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Unicycle step for one robot, dragging any held puck along and
    /// refiling the robot when it crosses a cell boundary.
    pub(crate) fn integrate_pose(&mut self, id: RobotId) {
        let trig = self.config.sensor.trig;
        let torus = self.torus;
        let robot = &mut self.robots[id.index()];

        let Pose { x, y, a } = robot.pose;
        let Speed { v, w } = robot.speed;
        robot.pose = Pose::new(
            torus.normalize_distance(x + v * trig.cos(a)),
            torus.normalize_distance(y + v * trig.sin(a)),
            normalize_angle(a + w),
        );

        if let Some(held) = robot.held_puck {
            let puck = &mut self.pucks[held.index()];
            puck.x = robot.pose.x;
            puck.y = robot.pose.y;
        }

        let new_cell = self.grid.cell_of(robot.pose.x, robot.pose.y);
        if self.grid.relocate_robot(id, robot.cell, new_cell) {
            trace!(robot = %id, from = robot.cell, to = new_cell, "Robot changed cell");
            robot.cell = new_cell;
        }
    }

    pub(crate) fn integrate_poses(&mut self) {
        for i in 0..self.robots.len() {
            self.integrate_pose(RobotId(i));
        }
    }

    fn sensor_field(&self) -> SensorField<'_> {
        SensorField {
            grid: &self.grid,
            robots: &self.robots,
            pucks: &self.pucks,
            config: &self.config.sensor,
            torus: self.torus,
        }
    }

    /// Recompute one robot's detections from scratch.
    pub fn update_sensors(&mut self, id: RobotId) {
        let i = id.index();
        let mut seen_robots = std::mem::take(&mut self.robots[i].seen_robots);
        let mut seen_pucks = std::mem::take(&mut self.robots[i].seen_pucks);
        self.sensor_field()
            .sense_into(&self.robots[i], &mut seen_robots, &mut seen_pucks);
        let robot = &mut self.robots[i];
        robot.seen_robots = seen_robots;
        robot.seen_pucks = seen_pucks;
    }

    /// Refresh every robot's detections. Positions are frozen for the
    /// duration, so the parallel path computes all snapshots before
    /// committing any of them.
    pub(crate) fn refresh_sensors(&mut self) {
        if self.config.run.parallel_sensing {
            let field = self.sensor_field();
            let detections: Vec<(Vec<SeenRobot>, Vec<SeenPuck>)> =
                self.robots.par_iter().map(|robot| field.sense(robot)).collect();
            for (robot, (seen_robots, seen_pucks)) in self.robots.iter_mut().zip(detections) {
                robot.seen_robots = seen_robots;
                robot.seen_pucks = seen_pucks;
            }
        } else {
            for i in 0..self.robots.len() {
                self.update_sensors(RobotId(i));
            }
        }
    }

    /// Economy totals and per-home statistics so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_ticks: self.tick,
            homes: self.homes.iter().map(Home::stats).collect(),
            pickups: self.counters.pickups,
            drops: self.counters.drops,
            relocations: self.counters.relocations,
        }
    }

    pub(crate) fn log_tick_totals(&self) {
        debug!(
            tick = self.tick,
            pickups = self.counters.pickups,
            drops = self.counters.drops,
            relocations = self.counters.relocations,
            "Economy totals"
        );
    }
}
