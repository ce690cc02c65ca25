//! Core type definitions for the simulation.

use crate::geometry::normalize_angle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// Logical simulation time, counted in ticks since the world was built.
pub type Tick = u64;

macro_rules! entity_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_handle!(
    /// Stable handle of a robot; indexes the world's robot arena.
    RobotId,
    "robot"
);
entity_handle!(
    /// Stable handle of a puck; indexes the world's puck arena.
    PuckId,
    "puck"
);
entity_handle!(
    /// Stable handle of a home zone.
    HomeId,
    "home"
);

/// Position and heading on the torus
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// Heading in radians, kept in `(-π, π]`
    pub a: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, a: f64) -> Self {
        Self { x, y, a }
    }

    /// Uniformly random pose anywhere in a world of side `world_size`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, world_size: f64) -> Self {
        Self {
            x: rng.gen::<f64>() * world_size,
            y: rng.gen::<f64>() * world_size,
            a: normalize_angle(rng.gen::<f64>() * TAU),
        }
    }
}

/// Unicycle speed command: forward `v` (distance per tick) and turn `w`
/// (radians per tick)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub v: f64,
    pub w: f64,
}

impl Speed {
    pub fn new(v: f64, w: f64) -> Self {
        Self { v, w }
    }

    pub fn stopped() -> Self {
        Self::default()
    }
}

/// RGB colour of a home. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Colours handed to the first homes of a world, in order.
    pub const PALETTE: [Color; 7] = [
        Color::new(1.0, 0.0, 0.0),
        Color::new(0.0, 0.5, 0.0),
        Color::new(0.3, 0.3, 1.0),
        Color::new(1.0, 1.0, 0.0),
        Color::new(1.0, 0.0, 1.0),
        Color::new(0.0, 1.0, 1.0),
        Color::new(1.0, 0.0, 1.0),
    ];

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }

    /// Palette colour for the `index`-th home, random once the palette runs out
    pub fn for_home<R: Rng + ?Sized>(index: usize, rng: &mut R) -> Self {
        Self::PALETTE
            .get(index)
            .copied()
            .unwrap_or_else(|| Self::random(rng))
    }
}
