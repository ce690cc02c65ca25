//! End-of-tick consistency checks over the whole world.

use crate::world::World;
use antix_core::{HomeId, PuckId, RobotId};
use thiserror::Error;

/// A broken data-model invariant. Always an engine defect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("{robot} is filed under cell {recorded} but its pose maps to cell {computed}")]
    RobotCell {
        robot: RobotId,
        recorded: usize,
        computed: usize,
    },

    #[error("{robot} is a member of {count} cells")]
    RobotMembership { robot: RobotId, count: usize },

    #[error("{puck} is resting but filed under {recorded:?} instead of cell {computed}")]
    PuckCell {
        puck: PuckId,
        recorded: Option<usize>,
        computed: usize,
    },

    #[error("{puck} is a member of {count} cells")]
    PuckMembership { puck: PuckId, count: usize },

    #[error("{puck} is held by {holders} robots")]
    HolderCount { puck: PuckId, holders: usize },

    #[error("{puck} is held but does not track its carrier {robot}")]
    CarrierDrift { puck: PuckId, robot: RobotId },

    #[error("{puck} and {home} disagree about delivery")]
    DeliveryMismatch { puck: PuckId, home: HomeId },
}

impl World {
    /// Verify grid membership, single ownership and delivery bookkeeping.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut robot_cells = vec![0usize; self.robots.len()];
        let mut puck_cells = vec![0usize; self.pucks.len()];
        for (_, cell) in self.grid.cells() {
            for robot in &cell.robots {
                robot_cells[robot.index()] += 1;
            }
            for puck in &cell.pucks {
                puck_cells[puck.index()] += 1;
            }
        }

        for robot in &self.robots {
            let computed = self.grid.cell_of(robot.pose.x, robot.pose.y);
            if robot.cell != computed {
                return Err(InvariantViolation::RobotCell {
                    robot: robot.id,
                    recorded: robot.cell,
                    computed,
                });
            }
            let count = robot_cells[robot.id.index()];
            if count != 1 || !self.grid.cell(computed).robots.contains(&robot.id) {
                return Err(InvariantViolation::RobotMembership {
                    robot: robot.id,
                    count,
                });
            }
        }

        let mut holders = vec![Vec::new(); self.pucks.len()];
        for robot in &self.robots {
            if let Some(puck) = robot.held_puck {
                holders[puck.index()].push(robot.id);
            }
        }

        for puck in &self.pucks {
            let id = puck.id;
            let carriers = &holders[id.index()];
            let expected = usize::from(puck.held);
            if carriers.len() != expected {
                return Err(InvariantViolation::HolderCount {
                    puck: id,
                    holders: carriers.len(),
                });
            }

            if puck.held {
                if puck_cells[id.index()] != 0 || puck.cell.is_some() {
                    return Err(InvariantViolation::PuckMembership {
                        puck: id,
                        count: puck_cells[id.index()],
                    });
                }
                let carrier = &self.robots[carriers[0].index()];
                if (puck.x, puck.y) != (carrier.pose.x, carrier.pose.y) {
                    return Err(InvariantViolation::CarrierDrift {
                        puck: id,
                        robot: carrier.id,
                    });
                }
            } else {
                let computed = self.grid.cell_of(puck.x, puck.y);
                if puck.cell != Some(computed) {
                    return Err(InvariantViolation::PuckCell {
                        puck: id,
                        recorded: puck.cell,
                        computed,
                    });
                }
                let count = puck_cells[id.index()];
                if count != 1 || !self.grid.cell(computed).pucks.contains(&id) {
                    return Err(InvariantViolation::PuckMembership { puck: id, count });
                }
            }

            if let Some(home) = puck.owning_home {
                if puck.held || !self.homes[home.index()].delivered.contains(&id) {
                    return Err(InvariantViolation::DeliveryMismatch { puck: id, home });
                }
            }
        }

        for home in &self.homes {
            for puck in home.delivered() {
                if self.pucks[puck.index()].owning_home != Some(home.id) {
                    return Err(InvariantViolation::DeliveryMismatch {
                        puck,
                        home: home.id,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antix_core::{Color, Pose, SimConfig};

    fn world() -> World {
        let mut config = SimConfig::default();
        config.world.home_count = 0;
        config.world.home_population = 0;
        config.world.puck_count = 0;
        let mut world = World::empty(config).unwrap();
        let home = world.spawn_home(0.5, 0.5, 0.1, Color::PALETTE[0]);
        world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        world.spawn_puck(0.21, 0.2);
        world.spawn_puck(0.51, 0.5);
        world
    }

    #[test]
    fn test_consistent_world_passes() {
        assert_eq!(world().check_invariants(), Ok(()));
    }

    #[test]
    fn test_stale_robot_cell_detected() {
        let mut world = world();
        world.robots[0].pose.x = 0.75;
        assert!(matches!(
            world.check_invariants(),
            Err(InvariantViolation::RobotCell { .. })
        ));
    }

    #[test]
    fn test_double_holder_detected() {
        let mut world = world();
        world.update_sensors(RobotId(0));
        assert!(world.pickup(RobotId(0)));

        let home = world.robots[0].home;
        let second = world.spawn_robot(home, Pose::new(0.2, 0.2, 0.0)).unwrap();
        world.robots[second.index()].held_puck = Some(PuckId(0));
        assert_eq!(
            world.check_invariants(),
            Err(InvariantViolation::HolderCount {
                puck: PuckId(0),
                holders: 2
            })
        );
    }

    #[test]
    fn test_delivery_mismatch_detected() {
        let mut world = world();
        world.homes[0].delivered.clear();
        assert_eq!(
            world.check_invariants(),
            Err(InvariantViolation::DeliveryMismatch {
                puck: PuckId(1),
                home: HomeId(0)
            })
        );
    }
}
