//! Forager: fetch pucks and carry them home.

use crate::turn_towards;
use antix_core::Speed;
use antix_world::{Action, Command, ControlInput, Controller, SeenPuck};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

const CRUISE_SPEED: f64 = 0.005;
const MAX_TURN: f64 = 0.2;
const WANDER_TURN: f64 = 0.1;
/// Drop only this far inside the catchment, as a fraction of its radius
const DROP_DEPTH: f64 = 0.5;

/// Heads for the nearest free puck, picks it up, returns home and drops it
/// well inside the catchment. After a delivery it goes back to where it
/// last found a puck, and wanders when it has nowhere better to go.
#[derive(Debug, Clone)]
pub struct Forager {
    rng: ChaCha8Rng,
    last_pickup: Option<(f64, f64)>,
}

impl Forager {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_pickup: None,
        }
    }

    /// Where this forager last picked up a puck
    pub fn last_pickup(&self) -> Option<(f64, f64)> {
        self.last_pickup
    }

    fn return_home(&self, input: &ControlInput<'_>) -> Command {
        let (dx, dy, distance) = input.home_vector();
        if distance < input.home.radius() * DROP_DEPTH {
            trace!(robot = %input.robot, tick = input.tick, "Forager dropping at home");
            return Command::drive(Speed::stopped()).with_action(Action::Drop);
        }
        let w = turn_towards(input.pose, dx, dy, MAX_TURN);
        Command::drive(Speed::new(CRUISE_SPEED.min(distance), w))
    }

    fn wander(&mut self) -> Command {
        let w = self.rng.gen_range(-WANDER_TURN..=WANDER_TURN);
        Command::drive(Speed::new(CRUISE_SPEED, w))
    }
}

fn nearest_free_puck<'a>(input: &ControlInput<'a>) -> Option<&'a SeenPuck> {
    input
        .seen_pucks
        .iter()
        .filter(|p| !p.held)
        .min_by(|a, b| a.range.total_cmp(&b.range))
}

impl Controller for Forager {
    fn decide(&mut self, input: &ControlInput<'_>) -> Command {
        if input.holding {
            return self.return_home(input);
        }

        // pucks inside our own catchment are already delivered
        if !input.at_home() {
            if let Some(puck) = nearest_free_puck(input) {
                if puck.range < input.sensor.pickup_range {
                    self.last_pickup = Some((input.pose.x, input.pose.y));
                    return Command::drive(Speed::stopped()).with_action(Action::Pickup);
                }
                let w = puck.bearing.clamp(-MAX_TURN, MAX_TURN);
                return Command::drive(Speed::new(CRUISE_SPEED.min(puck.range), w));
            }
        }

        if let Some((x, y)) = self.last_pickup {
            let (dx, dy) = input.torus.delta(input.pose.x, input.pose.y, x, y);
            if dx.hypot(dy) > input.sensor.range / 2.0 {
                let w = turn_towards(input.pose, dx, dy, MAX_TURN);
                return Command::drive(Speed::new(CRUISE_SPEED, w));
            }
            self.last_pickup = None;
        }

        self.wander()
    }

    fn name(&self) -> &'static str {
        "forager"
    }
}
