//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::trig::TrigMode;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;
use tracing::warn;

/// Upper bound on `matrix_width²`. Keeps the grid allocation within a few
/// hundred megabytes however small the sensing range is.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square toroidal world
    pub world_size: f64,
    /// Number of home zones
    pub home_count: usize,
    /// Robots created for each home
    pub home_population: usize,
    /// Pucks that exist in the world
    pub puck_count: usize,
    /// Catchment radius of every home
    pub home_radius: f64,
    /// Body radius of a robot (presentation only)
    pub robot_radius: f64,
    /// Grid cells per side; derived from the sensing range when unset
    pub matrix_width: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_size: 1.0,
            home_count: 1,
            home_population: 20,
            puck_count: 100,
            home_radius: 0.1,
            robot_radius: 0.01,
            matrix_width: None,
        }
    }
}

/// Sensor model parameters, shared by every robot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Maximum sensing distance
    pub range: f64,
    /// Angular width of the field of view, in radians
    pub fov: f64,
    /// Pucks closer than this can be picked up; at most `range`
    pub pickup_range: f64,
    /// Trigonometry used for pose integration and bearings
    pub trig: TrigMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            range: 0.1,
            fov: 90f64.to_radians(),
            pickup_range: 0.1 / 5.0,
            trig: TrigMode::Exact,
        }
    }
}

/// Puck economy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Ticks a puck must rest undisturbed in a home before it scores
    pub score_time: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self { score_time: 200 }
    }
}

/// Run control parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Ticks to run before stopping; 0 runs forever
    pub updates_max: u64,
    /// Wall-clock delay between ticks, in milliseconds
    pub sleep_msec: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Interval between score reports, in milliseconds
    pub report_interval_ms: u64,
    /// Refresh sensors across robots on the rayon pool
    pub parallel_sensing: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            updates_max: 0,
            sleep_msec: 10,
            seed: 0,
            report_interval_ms: 1000,
            parallel_sensing: false,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub sensor: SensorConfig,
    pub economy: EconomyConfig,
    pub run: RunConfig,
}

impl SimConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Grid cells per side: the explicit override, else `floor(world_size / range)`.
    pub fn matrix_width(&self) -> usize {
        self.world.matrix_width.unwrap_or_else(|| {
            let derived = (self.world.world_size / self.sensor.range).floor();
            if derived.is_finite() && derived >= 1.0 {
                derived as usize
            } else {
                0
            }
        })
    }

    /// Side length of one grid cell.
    pub fn cell_size(&self) -> f64 {
        self.world.world_size / self.matrix_width() as f64
    }

    /// Check every startup constraint. Any failure is fatal to the run.
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        let sensor = &self.sensor;

        if !(world.world_size.is_finite() && world.world_size > 0.0) {
            return Err(invalid(format!(
                "world_size must be positive, got {}",
                world.world_size
            )));
        }
        if !(sensor.range.is_finite() && sensor.range > 0.0) {
            return Err(invalid(format!(
                "range must be positive, got {}",
                sensor.range
            )));
        }
        if !(sensor.fov > 0.0 && sensor.fov <= TAU) {
            return Err(invalid(format!(
                "fov must lie in (0, 2π] radians, got {}",
                sensor.fov
            )));
        }
        if !(sensor.pickup_range >= 0.0 && sensor.pickup_range <= sensor.range) {
            return Err(invalid(format!(
                "pickup_range ({}) must lie in [0, range ({})]",
                sensor.pickup_range, sensor.range
            )));
        }
        if self.economy.score_time == 0 {
            return Err(invalid("score_time must be at least one tick"));
        }
        if !(world.home_radius.is_finite() && world.home_radius > 0.0) {
            return Err(invalid(format!(
                "home_radius must be positive, got {}",
                world.home_radius
            )));
        }
        if world.home_population > 0 && world.home_count == 0 {
            return Err(invalid("robots need at least one home"));
        }

        let width = self.matrix_width();
        if width == 0 {
            return Err(invalid(format!(
                "grid needs at least one cell per side (world_size {} / range {})",
                world.world_size, sensor.range
            )));
        }
        match width.checked_mul(width) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(invalid(format!(
                    "grid of {width}x{width} cells exceeds the limit of {MAX_GRID_CELLS} cells"
                )))
            }
        }
        if self.cell_size() < sensor.range {
            warn!(
                cell_size = self.cell_size(),
                range = sensor.range,
                "Grid cells are smaller than the sensing range; sensor scans will cover more cells"
            );
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}
