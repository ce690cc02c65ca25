//! Core types and utilities for the Antix puck-foraging robot simulation.

pub mod types;
pub mod geometry;
pub mod trig;
pub mod config;
pub mod error;
pub mod stats;

pub use error::{Error, Result};
pub use types::*;
pub use geometry::*;
pub use trig::TrigMode;
pub use config::*;
pub use stats::*;
