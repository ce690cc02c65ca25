//! Puck state.

use antix_core::{HomeId, PuckId, Tick};
use serde::{Deserialize, Serialize};

/// Where a puck is in the pickup/delivery cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuckState {
    Free,
    Held,
    Delivered { home: HomeId, since: Tick },
}

/// A movable puck
#[derive(Debug, Clone)]
pub struct Puck {
    pub(crate) id: PuckId,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) held: bool,
    pub(crate) owning_home: Option<HomeId>,
    pub(crate) delivery_tick: Tick,
    /// Grid cell while resting; `None` while carried
    pub(crate) cell: Option<usize>,
}

impl Puck {
    pub(crate) fn new(id: PuckId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            held: false,
            owning_home: None,
            delivery_tick: 0,
            cell: None,
        }
    }

    pub fn id(&self) -> PuckId {
        self.id
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn owning_home(&self) -> Option<HomeId> {
        self.owning_home
    }

    /// Tick of the last delivery; meaningful only while delivered
    pub fn delivery_tick(&self) -> Tick {
        self.delivery_tick
    }

    pub fn cell(&self) -> Option<usize> {
        self.cell
    }

    pub fn state(&self) -> PuckState {
        match (self.held, self.owning_home) {
            (true, _) => PuckState::Held,
            (false, Some(home)) => PuckState::Delivered {
                home,
                since: self.delivery_tick,
            },
            (false, None) => PuckState::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_puck_states() {
        let mut puck = Puck::new(PuckId(0), 0.2, 0.3);
        assert_eq!(puck.state(), PuckState::Free);
        assert_eq!(puck.position(), (0.2, 0.3));

        puck.owning_home = Some(HomeId(1));
        puck.delivery_tick = 12;
        assert_eq!(
            puck.state(),
            PuckState::Delivered {
                home: HomeId(1),
                since: 12
            }
        );

        puck.owning_home = None;
        puck.held = true;
        assert_eq!(puck.state(), PuckState::Held);
    }
}
