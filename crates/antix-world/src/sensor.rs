//! Range and field-of-view sensing against the grid index.
//!
//! Candidate cells are those overlapped by the axis-aligned bounding box of
//! the sensing pie-slice, which is tighter than a fixed neighbour block when
//! the field of view is narrow.

use crate::grid::{Aabb, Grid};
use crate::puck::Puck;
use crate::robot::{Robot, SeenPuck, SeenRobot};
use antix_core::{normalize_angle, Pose, SensorConfig, Torus, TrigMode};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Bounding-box padding, as a fraction of range. Covers the bearing error
/// of approximate `atan2` at full range.
pub const BBOX_MARGIN: f64 = 2e-3;

/// One robot's sensor, positioned at its pose
#[derive(Debug, Clone, Copy)]
pub struct Sensor {
    x: f64,
    y: f64,
    heading: f64,
    range: f64,
    range_sq: f64,
    half_fov: f64,
    trig: TrigMode,
    torus: Torus,
}

impl Sensor {
    pub fn new(pose: Pose, config: &SensorConfig, torus: Torus) -> Self {
        Self {
            x: pose.x,
            y: pose.y,
            heading: pose.a,
            range: config.range,
            range_sq: config.range * config.range,
            half_fov: config.fov / 2.0,
            trig: config.trig,
            torus,
        }
    }

    /// Bounding box of the sensing pie-slice in unwrapped coordinates.
    pub fn field_of_view_box(&self) -> Aabb {
        let (x, y, r) = (self.x, self.y, self.range);
        let mut bbox = Aabb::point(x, y);

        if self.half_fov * 2.0 >= TAU {
            bbox.grow(x - r, y - r);
            bbox.grow(x + r, y + r);
        } else {
            for edge in [self.heading + self.half_fov, self.heading - self.half_fov] {
                bbox.grow(x + r * edge.cos(), y + r * edge.sin());
            }
            // the slice bulges to full range wherever it crosses a cardinal direction
            for (direction, dx, dy) in [
                (0.0, r, 0.0),
                (FRAC_PI_2, 0.0, r),
                (PI, -r, 0.0),
                (-FRAC_PI_2, 0.0, -r),
            ] {
                if normalize_angle(direction - self.heading).abs() <= self.half_fov {
                    bbox.grow(x + dx, y + dy);
                }
            }
        }

        bbox.pad(r * BBOX_MARGIN);
        bbox
    }

    /// Range and relative bearing of a point if the sensor detects it.
    pub fn locate(&self, tx: f64, ty: f64) -> Option<(f64, f64)> {
        let dx = self.torus.wrap_distance(tx - self.x);
        if dx.abs() > self.range {
            return None;
        }
        let dy = self.torus.wrap_distance(ty - self.y);
        if dy.abs() > self.range {
            return None;
        }

        let dsq = dx * dx + dy * dy;
        if dsq > self.range_sq {
            return None;
        }

        let absolute_heading = self.trig.atan2(dy, dx);
        let relative_heading = normalize_angle(absolute_heading - self.heading);
        if relative_heading.abs() > self.half_fov {
            return None;
        }

        Some((dsq.sqrt(), relative_heading))
    }
}

/// Read-only view of everything a sensor refresh looks at
#[derive(Clone, Copy)]
pub struct SensorField<'a> {
    pub grid: &'a Grid,
    pub robots: &'a [Robot],
    pub pucks: &'a [Puck],
    pub config: &'a SensorConfig,
    pub torus: Torus,
}

impl SensorField<'_> {
    /// Rebuild `observer`'s detections into the given buffers, replacing
    /// their previous contents.
    pub fn sense_into(
        &self,
        observer: &Robot,
        seen_robots: &mut Vec<SeenRobot>,
        seen_pucks: &mut Vec<SeenPuck>,
    ) {
        seen_robots.clear();
        seen_pucks.clear();

        let sensor = Sensor::new(observer.pose, self.config, self.torus);
        for index in self.grid.cells_overlapping(&sensor.field_of_view_box()) {
            let cell = self.grid.cell(index);

            for &other_id in &cell.robots {
                if other_id == observer.id {
                    continue;
                }
                let other = &self.robots[other_id.index()];
                if let Some((range, bearing)) = sensor.locate(other.pose.x, other.pose.y) {
                    seen_robots.push(SeenRobot {
                        robot: other.id,
                        home: other.home,
                        pose: other.pose,
                        speed: other.speed,
                        range,
                        bearing,
                        has_puck: other.is_holding(),
                    });
                }
            }

            for &puck_id in &cell.pucks {
                let puck = &self.pucks[puck_id.index()];
                if let Some((range, bearing)) = sensor.locate(puck.x, puck.y) {
                    seen_pucks.push(SeenPuck {
                        puck: puck.id,
                        range,
                        bearing,
                        held: puck.held,
                    });
                }
            }
        }
    }

    /// Fresh detections for `observer`.
    pub fn sense(&self, observer: &Robot) -> (Vec<SeenRobot>, Vec<SeenPuck>) {
        let mut seen_robots = Vec::new();
        let mut seen_pucks = Vec::new();
        self.sense_into(observer, &mut seen_robots, &mut seen_pucks);
        (seen_robots, seen_pucks)
    }
}
