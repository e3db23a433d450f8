//! Player Abilities
//!
//! Slash and Whirl each own an attack machine, so both can be in flight and
//! their hits resolve independently. Leap is a short airborne dash that
//! ignores every hazard system while it lasts.

use serde::{Serialize, Deserialize};

use crate::core::grid::{Footprint, Grid, TilePos};
use crate::game::attack::{AttackId, AttackKind, AttackState, PlayerAttack};
use crate::game::input::PlayerAbility;
use crate::game::pattern::generate;

/// Seconds airborne per leap.
pub const LEAP_DURATION: f32 = 0.5;

/// Leap cooldown (seconds).
pub const LEAP_COOLDOWN: f32 = 4.0;

/// Result of triggering an ability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityOutcome {
    /// Attack began telegraphing
    Attack(AttackId),
    /// Leap began toward a tile
    Leap(TilePos),
    /// On cooldown or already running
    Refused,
}

/// Player brain.
#[derive(Clone, Debug, Default)]
pub struct PlayerBrain {
    /// Slash machine
    pub slash: AttackState<PlayerAttack>,
    /// Whirl machine
    pub whirl: AttackState<PlayerAttack>,
    airborne: f32,
    leap_cooldown: f32,
}

impl PlayerBrain {
    /// Everything ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mid-leap?
    pub fn is_airborne(&self) -> bool {
        self.airborne > 0.0
    }

    /// Remaining leap cooldown.
    pub fn leap_cooldown(&self) -> f32 {
        self.leap_cooldown
    }

    /// Trigger an ability.
    ///
    /// Without an aim tile, Slash follows `facing` and Leap goes nowhere.
    pub fn trigger(
        &mut self,
        ability: PlayerAbility,
        aim: Option<TilePos>,
        grid: &Grid,
        origin: TilePos,
        footprint: &Footprint,
        facing: (i32, i32),
    ) -> AbilityOutcome {
        match ability {
            PlayerAbility::Slash => {
                let toward = aim
                    .filter(|a| *a != origin)
                    .unwrap_or_else(|| origin.offset(facing.0, facing.1));
                let kind = PlayerAttack::Slash;
                let tiles = generate(kind.shape(), grid, origin, footprint, toward);
                if self.slash.begin(kind, tiles) {
                    AbilityOutcome::Attack(kind.id())
                } else {
                    AbilityOutcome::Refused
                }
            }
            PlayerAbility::Whirl => {
                let kind = PlayerAttack::Whirl;
                let tiles = generate(kind.shape(), grid, origin, footprint, origin);
                if self.whirl.begin(kind, tiles) {
                    AbilityOutcome::Attack(kind.id())
                } else {
                    AbilityOutcome::Refused
                }
            }
            PlayerAbility::Leap => {
                if self.is_airborne() || self.leap_cooldown > 0.0 {
                    return AbilityOutcome::Refused;
                }
                let Some(aim) = aim else { return AbilityOutcome::Refused };
                self.airborne = LEAP_DURATION;
                self.leap_cooldown = LEAP_COOLDOWN;
                AbilityOutcome::Leap(grid.clamp_origin(aim, footprint))
            }
        }
    }

    /// Advance both machines and the leap timers.
    ///
    /// Returns attacks that finished this tick.
    pub fn think(&mut self, dt: f32) -> Vec<PlayerAttack> {
        let mut finished = Vec::new();
        for state in [&mut self.slash, &mut self.whirl] {
            state.tick_cooldowns(dt);
            finished.extend(state.advance(dt).finished);
        }
        self.airborne = (self.airborne - dt).max(0.0);
        self.leap_cooldown = (self.leap_cooldown - dt).max(0.0);
        finished
    }
}
