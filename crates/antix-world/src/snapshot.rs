//! Read-only views of the world for presentation and reporting.

use crate::world::World;
use antix_core::{Color, HomeId, Pose, PuckId, RobotId, Tick};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotView {
    pub id: RobotId,
    pub home: HomeId,
    pub pose: Pose,
    pub holding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuckView {
    pub id: PuckId,
    pub x: f64,
    pub y: f64,
    pub held: bool,
    pub home: Option<HomeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    pub id: HomeId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    pub score: u64,
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub world_size: f64,
    pub paused: bool,
    pub robots: Vec<RobotView>,
    pub pucks: Vec<PuckView>,
    pub homes: Vec<HomeView>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            tick: world.tick(),
            world_size: world.torus().size(),
            paused: false,
            robots: world
                .robots()
                .iter()
                .map(|r| RobotView {
                    id: r.id(),
                    home: r.home(),
                    pose: r.pose(),
                    holding: r.is_holding(),
                })
                .collect(),
            pucks: world
                .pucks()
                .iter()
                .map(|p| {
                    let (x, y) = p.position();
                    PuckView {
                        id: p.id(),
                        x,
                        y,
                        held: p.is_held(),
                        home: p.owning_home(),
                    }
                })
                .collect(),
            homes: world
                .homes()
                .iter()
                .map(|h| {
                    let (x, y) = h.position();
                    HomeView {
                        id: h.id(),
                        x,
                        y,
                        radius: h.radius(),
                        color: h.color(),
                        score: h.score(),
                    }
                })
                .collect(),
        }
    }

    /// Scores by home, in handle order
    pub fn scores(&self) -> Vec<u64> {
        self.homes.iter().map(|h| h.score).collect()
    }
}

/// Shared latest-frame slot. The simulation publishes, readers poll.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle(Arc<RwLock<WorldSnapshot>>);

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: WorldSnapshot) {
        *self.0.write() = snapshot;
    }

    pub fn latest(&self) -> WorldSnapshot {
        self.0.read().clone()
    }

    /// Run `f` against the latest frame without cloning it
    pub fn with_latest<T>(&self, f: impl FnOnce(&WorldSnapshot) -> T) -> T {
        f(&self.0.read())
    }
}
