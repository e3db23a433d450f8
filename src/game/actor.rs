//! Actors
//!
//! Everything with health on the grid: the player, the boss, its minions and
//! destructible obstacles. One struct with a role enum; role-specific state
//! (attack machines, phases) lives in the brain each role carries.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::{Footprint, Grid, GridError, GridPosition, TilePos};
use crate::core::hash::StateHasher;
use crate::game::attack::{AttackId, AttackKind, AttackPhase, AttackState, PendingHit};
use crate::game::boss::BossBrain;
use crate::game::minion::MinionBrain;
use crate::game::movement::{Blocker, Mover};
use crate::game::player::PlayerBrain;

/// Seconds the hit flash lasts after taking damage.
pub const HIT_FLASH_DURATION: f32 = 0.15;

// =============================================================================
// ACTOR ID
// =============================================================================

/// Actor identifier.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

// =============================================================================
// HEALTH
// =============================================================================

/// Refused health construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HealthError {
    /// Max health must be positive.
    #[error("max health must be positive (got {0})")]
    NonPositiveMax(i32),
}

/// Health in `[0, max]`, `max > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    /// Full health.
    pub fn new(max: i32) -> Result<Self, HealthError> {
        if max <= 0 {
            return Err(HealthError::NonPositiveMax(max));
        }
        Ok(Self { current: max, max })
    }

    /// Current value.
    #[inline]
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Maximum value.
    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// current / max.
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    /// Assign, clamped into `[0, max]`.
    pub fn set(&mut self, value: i32) {
        self.current = value.clamp(0, self.max);
    }

    /// Subtract damage (negative amounts ignored). Returns the damage dealt.
    pub fn damage(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.set(before - amount.max(0));
        before - self.current
    }

    /// At zero?
    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

// =============================================================================
// ROLES
// =============================================================================

/// Actor category, used for hostility and snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorKind {
    /// Player
    Player = 0,
    /// Boss
    Boss = 1,
    /// Boss escort
    Minion = 2,
    /// Destructible obstacle
    Obstacle = 3,
}

/// Can an attacker of kind `attacker` damage a target of kind `target`?
///
/// Player and enemies hurt each other; obstacles are damaged by everyone.
pub fn is_hostile(attacker: ActorKind, target: ActorKind) -> bool {
    use ActorKind::*;
    match (attacker, target) {
        (_, Obstacle) => attacker != Obstacle,
        (Player, Boss | Minion) => true,
        (Boss | Minion, Player) => true,
        _ => false,
    }
}

/// Footprints of every solid actor except `id`, for movement and pushes.
pub fn blockers_except(actors: &BTreeMap<ActorId, Actor>, id: ActorId) -> Vec<Blocker> {
    actors
        .values()
        .filter(|a| a.id != id && !a.is_passable())
        .flat_map(|a| a.blockers())
        .collect()
}

/// Role-specific state.
#[derive(Clone, Debug)]
pub enum ActorRole {
    /// Player abilities
    Player(PlayerBrain),
    /// Boss attack selection and phases
    Boss(BossBrain),
    /// Escort melee
    Minion(MinionBrain),
    /// Inert
    Obstacle,
}

// =============================================================================
// ACTOR
// =============================================================================

/// One actor on the grid.
#[derive(Clone, Debug)]
pub struct Actor {
    /// Identifier
    pub id: ActorId,
    /// Role and brain
    pub role: ActorRole,
    /// Health
    pub health: Health,
    alive: bool,
    /// Cosmetic flash timer, decays to 0
    pub hit_flash: f32,
    /// Occupied tiles from the origin
    pub footprint: Footprint,
    /// Discrete + smooth position (the footprint origin)
    pub position: GridPosition,
    /// Movement state
    pub mover: Mover,
}

impl Actor {
    /// Place an actor. The whole footprint must be walkable.
    pub fn new(
        id: ActorId,
        role: ActorRole,
        max_health: i32,
        footprint: Footprint,
        grid: &Grid,
        origin: TilePos,
    ) -> Result<Self, ActorError> {
        let health = Health::new(max_health)?;
        let position = GridPosition::new(grid, origin)?;
        if !grid.footprint_fits(origin, &footprint) {
            return Err(ActorError::Blocked { x: origin.x, y: origin.y });
        }
        Ok(Self {
            id,
            role,
            health,
            alive: true,
            hit_flash: 0.0,
            footprint,
            position,
            mover: Mover::new(),
        })
    }

    /// Category.
    pub fn kind(&self) -> ActorKind {
        match self.role {
            ActorRole::Player(_) => ActorKind::Player,
            ActorRole::Boss(_) => ActorKind::Boss,
            ActorRole::Minion(_) => ActorKind::Minion,
            ActorRole::Obstacle => ActorKind::Obstacle,
        }
    }

    /// Still alive (never flips back once false).
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Footprint origin tile.
    #[inline]
    pub fn origin(&self) -> TilePos {
        self.position.tile()
    }

    /// Footprint centre (tile units).
    #[inline]
    pub fn centre(&self) -> (f32, f32) {
        self.footprint.centre(self.origin())
    }

    /// Does this actor cover `tile`?
    #[inline]
    pub fn covers(&self, tile: TilePos) -> bool {
        self.footprint.contains(self.origin(), tile)
    }

    /// Player brain, if this is the player.
    pub fn player_brain(&self) -> Option<&PlayerBrain> {
        match &self.role {
            ActorRole::Player(brain) => Some(brain),
            _ => None,
        }
    }

    /// Boss brain, if this is the boss.
    pub fn boss_brain(&self) -> Option<&BossBrain> {
        match &self.role {
            ActorRole::Boss(brain) => Some(brain),
            _ => None,
        }
    }

    /// Mutable boss brain.
    pub fn boss_brain_mut(&mut self) -> Option<&mut BossBrain> {
        match &mut self.role {
            ActorRole::Boss(brain) => Some(brain),
            _ => None,
        }
    }

    /// Airborne (hazard-immune)?
    pub fn is_airborne(&self) -> bool {
        self.player_brain().is_some_and(|p| p.is_airborne())
    }

    /// Can attacks land on this actor?
    pub fn is_targetable(&self) -> bool {
        self.alive && !self.boss_brain().is_some_and(|b| b.is_hidden())
    }

    /// Other actors may walk through this one (dead, hidden, mid-bounce).
    pub fn is_passable(&self) -> bool {
        !self.alive || self.boss_brain().is_some_and(|b| b.is_passable())
    }

    /// Is any attack telegraphing or executing?
    pub fn is_attacking(&self) -> bool {
        match &self.role {
            ActorRole::Player(p) => p.slash.is_attacking() || p.whirl.is_attacking(),
            ActorRole::Boss(b) => b.attack.is_attacking(),
            ActorRole::Minion(m) => m.attack.is_attacking(),
            ActorRole::Obstacle => false,
        }
    }

    /// Movement blockers this actor contributes: its footprint, plus the
    /// tile it is stepping into.
    pub fn blockers(&self) -> Vec<Blocker> {
        let mut out = vec![Blocker { id: self.id, origin: self.origin(), footprint: self.footprint }];
        if let Some(step) = self.mover.step() {
            out.push(Blocker { id: self.id, origin: step, footprint: self.footprint });
        }
        out
    }

    /// Apply damage. Returns (damage dealt, this hit was lethal).
    ///
    /// A lethal hit flips `alive` and interrupts everything in flight.
    pub fn apply_damage(&mut self, amount: i32) -> (i32, bool) {
        if !self.alive {
            return (0, false);
        }
        let dealt = self.health.damage(amount);
        if dealt > 0 {
            self.hit_flash = HIT_FLASH_DURATION;
        }
        if self.health.is_depleted() {
            self.alive = false;
            self.interrupt();
            self.mover.clear_path();
            return (dealt, true);
        }
        (dealt, false)
    }

    /// Abandon all attacks in flight.
    pub fn interrupt(&mut self) {
        match &mut self.role {
            ActorRole::Player(p) => {
                p.slash.interrupt();
                p.whirl.interrupt();
            }
            ActorRole::Boss(b) => b.attack.interrupt(),
            ActorRole::Minion(m) => m.attack.interrupt(),
            ActorRole::Obstacle => {}
        }
    }

    /// Drain queued hits from every attack machine.
    pub fn take_pending_hits(&mut self) -> Vec<PendingHit> {
        match &mut self.role {
            ActorRole::Player(p) => {
                let mut hits = p.slash.take_pending_hits();
                hits.extend(p.whirl.take_pending_hits());
                hits
            }
            ActorRole::Boss(b) => b.attack.take_pending_hits(),
            ActorRole::Minion(m) => m.attack.take_pending_hits(),
            ActorRole::Obstacle => Vec::new(),
        }
    }

    /// Decay cosmetic timers.
    pub fn tick_timers(&mut self, dt: f32) {
        self.hit_flash = (self.hit_flash - dt).max(0.0);
    }

    /// Presentation view.
    pub fn view(&self) -> ActorView {
        let attacks = match &self.role {
            ActorRole::Player(p) => [attack_view(&p.slash), attack_view(&p.whirl)].into_iter().flatten().collect(),
            ActorRole::Boss(b) => attack_view(&b.attack).into_iter().collect(),
            ActorRole::Minion(m) => attack_view(&m.attack).into_iter().collect(),
            ActorRole::Obstacle => Vec::new(),
        };
        ActorView {
            id: self.id,
            kind: self.kind(),
            tile: self.origin(),
            smooth: self.position.smooth(),
            footprint: self.footprint,
            health: self.health.current(),
            max_health: self.health.max(),
            alive: self.alive,
            hit_flash: self.hit_flash,
            airborne: self.is_airborne(),
            hidden: self.boss_brain().is_some_and(|b| b.is_hidden()),
            attacks,
        }
    }

    /// Feed this actor into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.kind() as u8);
        hasher.update_tile(self.origin());
        let (sx, sy) = self.position.smooth();
        hasher.update_f32(sx);
        hasher.update_f32(sy);
        hasher.update_i32(self.health.current());
        hasher.update_bool(self.alive);
        for view in self.view().attacks {
            hasher.update_u8(view.phase as u8);
            hasher.update_f32(view.progress);
            hasher.update_u32(view.tiles.len() as u32);
        }
    }
}

fn attack_view<K: AttackKind>(state: &AttackState<K>) -> Option<AttackView> {
    let kind = state.kind()?;
    Some(AttackView {
        attack: kind.id(),
        phase: state.phase(),
        progress: state.progress(),
        tiles: state.hit_tiles().to_vec(),
    })
}

/// Refused actor placement.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActorError {
    /// Invalid health.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Origin off the grid.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Footprint covers a wall or leaves the grid.
    #[error("footprint at ({x}, {y}) is not walkable")]
    Blocked {
        /// Origin x
        x: i32,
        /// Origin y
        y: i32,
    },
}

// =============================================================================
// VIEWS
// =============================================================================

/// Attack in flight, for presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackView {
    /// Attack kind
    pub attack: AttackId,
    /// Phase
    pub phase: AttackPhase,
    /// Phase progress in [0,1]
    pub progress: f32,
    /// Cached hit tiles
    pub tiles: Vec<TilePos>,
}

/// Read-only actor snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorView {
    /// Identifier
    pub id: ActorId,
    /// Category
    pub kind: ActorKind,
    /// Discrete tile (footprint origin)
    pub tile: TilePos,
    /// Smooth position
    pub smooth: (f32, f32),
    /// Footprint
    pub footprint: Footprint,
    /// Current health
    pub health: i32,
    /// Max health
    pub max_health: i32,
    /// Alive flag
    pub alive: bool,
    /// Hit flash timer
    pub hit_flash: f32,
    /// Player mid-leap
    pub airborne: bool,
    /// Boss hidden during the portal dash
    pub hidden: bool,
    /// Attacks in flight
    pub attacks: Vec<AttackView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_and_refuses_bad_max() {
        assert_eq!(Health::new(0), Err(HealthError::NonPositiveMax(0)));

        let mut hp = Health::new(50).unwrap();
        hp.set(80);
        assert_eq!(hp.current(), 50);
        hp.set(-5);
        assert_eq!(hp.current(), 0);

        hp.set(10);
        assert_eq!(hp.damage(25), 10);
        assert!(hp.is_depleted());
        assert_eq!(hp.damage(-3), 0);
    }

    #[test]
    fn test_hostility() {
        use ActorKind::*;
        assert!(is_hostile(Player, Boss));
        assert!(is_hostile(Minion, Player));
        assert!(is_hostile(Boss, Obstacle));
        assert!(is_hostile(Player, Obstacle));
        assert!(!is_hostile(Boss, Minion));
        assert!(!is_hostile(Player, Player));
        assert!(!is_hostile(Obstacle, Obstacle));
    }

    #[test]
    fn test_lethal_damage_is_one_way() {
        let grid = Grid::new(4, 4).unwrap();
        let mut rock = Actor::new(ActorId(3), ActorRole::Obstacle, 10, Footprint::UNIT, &grid, TilePos::new(1, 1)).unwrap();

        assert_eq!(rock.apply_damage(4), (4, false));
        assert!(rock.hit_flash > 0.0);
        assert_eq!(rock.apply_damage(20), (6, true));
        assert!(!rock.is_alive());
        assert!(rock.is_passable());

        // Dead stays dead and takes nothing further
        assert_eq!(rock.apply_damage(5), (0, false));
        rock.health.set(10);
        assert!(!rock.is_alive());
    }

    #[test]
    fn test_placement_refused_on_wall() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.add_wall(TilePos::new(2, 2)).unwrap();
        let err = Actor::new(ActorId(1), ActorRole::Obstacle, 5, Footprint::new(2, 2), &grid, TilePos::new(1, 1));
        assert_eq!(err.unwrap_err(), ActorError::Blocked { x: 1, y: 1 });

        let err = Actor::new(ActorId(1), ActorRole::Obstacle, 5, Footprint::UNIT, &grid, TilePos::new(9, 0));
        assert!(matches!(err, Err(ActorError::Grid(_))));
    }
}
