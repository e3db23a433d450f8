//! Input Frames
//!
//! What the input layer hands the simulation each tick. Aim points arrive
//! already converted to grid tiles; the core does no device polling and no
//! screen-space conversion.

use serde::{Serialize, Deserialize};

use crate::core::grid::TilePos;

/// Player ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerAbility {
    /// Melee band toward the aim
    Slash = 0,
    /// Ring around the player
    Whirl = 1,
    /// Airborne dash to the aim
    Leap = 2,
}

/// Ability pressed this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTrigger {
    /// Which ability
    pub ability: PlayerAbility,
    /// Aim tile, if any
    pub aim: Option<TilePos>,
}

/// Input for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// New movement destination
    pub move_target: Option<TilePos>,
    /// Ability trigger
    pub ability: Option<AbilityTrigger>,
}

impl InputFrame {
    /// Empty frame.
    pub const fn new() -> Self {
        Self { move_target: None, ability: None }
    }

    /// Frame that only moves.
    pub const fn with_move(target: TilePos) -> Self {
        Self { move_target: Some(target), ability: None }
    }

    /// Frame that only triggers an ability.
    pub const fn with_ability(ability: PlayerAbility, aim: Option<TilePos>) -> Self {
        Self { move_target: None, ability: Some(AbilityTrigger { ability, aim }) }
    }

    /// Add an ability trigger.
    pub const fn and_ability(mut self, ability: PlayerAbility, aim: Option<TilePos>) -> Self {
        self.ability = Some(AbilityTrigger { ability, aim });
        self
    }

    /// Nothing pressed.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.move_target.is_none() && self.ability.is_none()
    }
}
