//! Spatial simulation engine.
//!
//! A [`World`] owns robots, pucks and homes on a toroidal plane, indexes them
//! in a uniform [`Grid`], and runs the puck economy. A [`Simulation`] drives
//! the world tick by tick, consulting one [`Controller`] per robot.

pub mod grid;
pub mod robot;
pub mod puck;
pub mod home;
pub mod sensor;
pub mod world;
pub mod economy;
pub mod invariants;
pub mod controller;
pub mod snapshot;
pub mod simulation;

pub use grid::{Aabb, Cell, Grid};
pub use robot::{Robot, SeenPuck, SeenRobot};
pub use puck::{Puck, PuckState};
pub use home::Home;
pub use sensor::{Sensor, SensorField};
pub use world::World;
pub use invariants::InvariantViolation;
pub use controller::{Action, Command, ControlInput, Controller};
pub use snapshot::{SnapshotHandle, WorldSnapshot};
pub use simulation::Simulation;
