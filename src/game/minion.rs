//! Minion Behaviour
//!
//! Escort minions know one attack. They swing when the target is in melee
//! range and the cooldown allows, otherwise they close in on a tile
//! orthogonally adjacent to it. A swing never starts between tiles.

use tracing::trace;

use crate::core::grid::{Footprint, Grid, TilePos};
use crate::game::attack::{AttackKind, AttackState, MinionAttack};
use crate::game::movement::approach_goal;
use crate::game::pattern::generate;

/// What a minion did this tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinionStep {
    /// Attack selected
    pub started: Option<MinionAttack>,
    /// Attack finished
    pub finished: Option<MinionAttack>,
    /// Walk here instead of attacking
    pub approach: Option<TilePos>,
    /// In range but mid-step: stop walking and swing next tick
    pub holding: bool,
}

/// Minion brain.
#[derive(Clone, Debug, Default)]
pub struct MinionBrain {
    /// Attack machine
    pub attack: AttackState<MinionAttack>,
}

impl MinionBrain {
    /// Idle minion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Range scan over the minion's kinds (ascending range, first ready fit).
    pub fn select_attack(&self, distance: f32) -> Option<MinionAttack> {
        MinionAttack::ALL
            .iter()
            .copied()
            .find(|k| distance <= k.config().range && self.attack.is_ready(*k))
    }

    /// Update timers, run the attack machine, select or approach.
    pub fn think(
        &mut self,
        dt: f32,
        grid: &Grid,
        origin: TilePos,
        footprint: &Footprint,
        target: TilePos,
        mid_step: bool,
    ) -> MinionStep {
        let mut step = MinionStep::default();
        self.attack.tick_cooldowns(dt);

        if self.attack.is_attacking() {
            step.finished = self.attack.advance(dt).finished;
            return step;
        }

        match self.select_attack(origin.distance(target)) {
            Some(_) if mid_step => step.holding = true,
            Some(kind) => {
                let tiles = generate(kind.shape(), grid, origin, footprint, target);
                if self.attack.begin(kind, tiles) {
                    trace!(?origin, "Minion attack selected");
                    step.started = Some(kind);
                }
            }
            None => step.approach = approach_goal(grid, origin, footprint, target),
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::attack::AttackPhase;

    #[test]
    fn test_adjacent_target_gets_swung_at() {
        let grid = Grid::new(8, 8).unwrap();
        let mut brain = MinionBrain::new();
        let origin = TilePos::new(3, 3);
        let target = TilePos::new(3, 4);

        let step = brain.think(0.016, &grid, origin, &Footprint::UNIT, target, false);
        assert_eq!(step.started, Some(MinionAttack::Melee));
        assert_eq!(brain.attack.hit_tiles(), &[target]);
        assert_eq!(brain.attack.phase(), AttackPhase::Telegraph);
    }

    #[test]
    fn test_distant_target_is_approached() {
        let grid = Grid::new(8, 8).unwrap();
        let mut brain = MinionBrain::new();

        let step = brain.think(0.016, &grid, TilePos::new(0, 0), &Footprint::UNIT, TilePos::new(5, 5), false);
        assert_eq!(step.started, None);
        let goal = step.approach.unwrap();
        assert_eq!(goal.manhattan(TilePos::new(5, 5)), 1);
    }

    #[test]
    fn test_no_swing_between_tiles() {
        let grid = Grid::new(8, 8).unwrap();
        let mut brain = MinionBrain::new();
        let target = TilePos::new(3, 4);

        let step = brain.think(0.016, &grid, TilePos::new(3, 3), &Footprint::UNIT, target, true);
        assert!(step.holding);
        assert_eq!(step.started, None);
        assert!(!brain.attack.is_attacking());
    }

    #[test]
    fn test_diagonal_neighbour_is_not_in_range() {
        let grid = Grid::new(8, 8).unwrap();
        let brain = MinionBrain::new();
        let d = TilePos::new(3, 3).distance(TilePos::new(4, 4));
        assert!(grid.in_bounds(TilePos::new(4, 4)));
        assert_eq!(brain.select_attack(d), None);
    }
}
