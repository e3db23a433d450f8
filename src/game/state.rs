//! Encounter State
//!
//! The orchestrator: owns the grid, every actor and the three hazard
//! systems. Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::grid::{Footprint, Grid, TilePos};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::actor::{Actor, ActorError, ActorId, ActorRole, ActorView};
use crate::game::boss::{BossBrain, BossPhase};
use crate::game::config::{ConfigError, EncounterConfig};
use crate::game::events::GameEvent;
use crate::game::hazard::{GroundHazards, Hazard, HazardTarget};
use crate::game::input::InputFrame;
use crate::game::laser::{Laser, LaserSystem};
use crate::game::minion::MinionBrain;
use crate::game::pattern::ring;
use crate::game::player::PlayerBrain;
use crate::game::portal::{PortalDash, PortalView};
use crate::game::tick::{tick, TickResult};

// =============================================================================
// OUTCOME
// =============================================================================

/// Encounter result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncounterOutcome {
    /// Still running
    #[default]
    InProgress = 0,
    /// Boss defeated
    Victory = 1,
    /// Player defeated
    Defeat = 2,
}

impl EncounterOutcome {
    /// Victory or defeat.
    #[inline]
    pub fn is_over(self) -> bool {
        self != EncounterOutcome::InProgress
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything the presentation layer reads, in one serializable value.
#[derive(Clone, Debug, Serialize)]
pub struct EncounterSnapshot {
    /// Ticks simulated
    pub tick: u32,
    /// Seconds simulated
    pub elapsed: f32,
    /// Result so far
    pub outcome: EncounterOutcome,
    /// Boss phase (None once the boss is gone)
    pub boss_phase: Option<BossPhase>,
    /// Actors in id order
    pub actors: Vec<ActorView>,
    /// Ground pools in tile order
    pub hazards: Vec<Hazard>,
    /// Live lasers
    pub lasers: Vec<Laser>,
    /// Active portal sweep
    pub portal: Option<PortalView>,
}

// =============================================================================
// ENCOUNTER
// =============================================================================

/// Complete encounter state.
#[derive(Clone, Debug)]
pub struct Encounter {
    /// Configuration it was built from
    pub config: EncounterConfig,

    /// Ticks simulated
    pub tick: u32,

    /// Seconds simulated (sum of clamped dt)
    pub elapsed: f32,

    /// The map
    pub grid: Grid,

    /// Deterministic RNG
    pub rng: DeterministicRng,

    /// All actors (BTreeMap for deterministic iteration)
    pub actors: BTreeMap<ActorId, Actor>,

    /// The player
    pub player_id: ActorId,

    /// The boss
    pub boss_id: ActorId,

    /// Ground pools
    pub hazards: GroundHazards,

    /// Phase Two lasers
    pub lasers: LaserSystem,

    /// Phase Two portal dash
    pub portal: PortalDash,

    /// Result so far
    pub outcome: EncounterOutcome,

    next_actor_id: u32,
    events: Vec<GameEvent>,
}

impl Encounter {
    /// Build the grid and place the player, the boss and the obstacles.
    pub fn new(config: EncounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut grid = Grid::new(config.grid_width, config.grid_height)?.with_tile_size(config.tile_size);
        for wall in &config.walls {
            grid.add_wall(*wall)?;
        }

        let mut encounter = Self {
            tick: 0,
            elapsed: 0.0,
            grid,
            rng: DeterministicRng::for_encounter(&config.encounter_id, config.seed),
            actors: BTreeMap::new(),
            player_id: ActorId::default(),
            boss_id: ActorId::default(),
            hazards: GroundHazards::new(config.hazards.tick_interval),
            lasers: LaserSystem::new(config.lasers.clone()),
            portal: PortalDash::new(config.portal.clone()),
            outcome: EncounterOutcome::InProgress,
            next_actor_id: 1,
            events: Vec::new(),
            config,
        };

        let c = &encounter.config;
        let (player_health, player_spawn) = (c.player_health, c.player_spawn);
        let (boss_health, boss_footprint, boss_spawn) = (c.boss_health, c.boss_footprint, c.boss_spawn);
        let (obstacle_health, obstacles) = (c.obstacle_health, c.obstacles.clone());

        encounter.player_id = encounter.spawn_actor(
            ActorRole::Player(PlayerBrain::new()),
            player_health,
            Footprint::UNIT,
            player_spawn,
        )?;
        encounter.boss_id = encounter.spawn_actor(
            ActorRole::Boss(BossBrain::new()),
            boss_health,
            boss_footprint,
            boss_spawn,
        )?;
        for tile in obstacles {
            encounter.spawn_actor(ActorRole::Obstacle, obstacle_health, Footprint::UNIT, tile)?;
        }

        info!(
            encounter = %hex::encode(encounter.config.encounter_id),
            seed = encounter.config.seed,
            actors = encounter.actors.len(),
            "Encounter created"
        );
        Ok(encounter)
    }

    /// Place an actor. Its footprint may not overlap a live actor.
    pub fn spawn_actor(
        &mut self,
        role: ActorRole,
        max_health: i32,
        footprint: Footprint,
        origin: TilePos,
    ) -> Result<ActorId, ActorError> {
        if self.is_occupied(origin, &footprint) {
            return Err(ActorError::Blocked { x: origin.x, y: origin.y });
        }
        let id = ActorId(self.next_actor_id);
        let actor = Actor::new(id, role, max_health, footprint, &self.grid, origin)?;
        self.next_actor_id += 1;
        self.actors.insert(id, actor);
        Ok(id)
    }

    /// Place one escort minion.
    pub fn spawn_minion(&mut self, tile: TilePos) -> Result<ActorId, ActorError> {
        let health = self.config.minion_health;
        self.spawn_actor(ActorRole::Minion(MinionBrain::new()), health, Footprint::UNIT, tile)
    }

    /// Spawn the escort on free tiles around the boss, nearest ring first.
    ///
    /// Spawns fewer than `escort_count` when the rings are crowded.
    pub fn spawn_escort(&mut self) -> Vec<ActorId> {
        let Some(boss) = self.actors.get(&self.boss_id) else { return Vec::new() };
        let (origin, footprint) = (boss.origin(), boss.footprint);
        let wanted = self.config.escort_count as usize;

        let mut spawned = Vec::new();
        for radius in 1..=2 {
            for tile in ring(&self.grid, origin, &footprint, radius) {
                if spawned.len() >= wanted {
                    return spawned;
                }
                if let Ok(id) = self.spawn_minion(tile) {
                    debug!(?id, ?tile, "Minion spawned");
                    spawned.push(id);
                }
            }
        }
        spawned
    }

    /// Does `footprint` at `origin` overlap a live actor?
    pub fn is_occupied(&self, origin: TilePos, footprint: &Footprint) -> bool {
        self.actors
            .values()
            .any(|a| a.is_alive() && a.footprint.overlaps(a.origin(), footprint, origin))
    }

    /// Get an actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Get a mutable actor.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// The player.
    pub fn player(&self) -> Option<&Actor> {
        self.actors.get(&self.player_id)
    }

    /// The boss.
    pub fn boss(&self) -> Option<&Actor> {
        self.actors.get(&self.boss_id)
    }

    /// Hazard-system view of the player, if alive.
    pub fn hazard_target(&self) -> Option<HazardTarget> {
        let player = self.player().filter(|p| p.is_alive())?;
        Some(HazardTarget {
            id: player.id,
            origin: player.origin(),
            footprint: player.footprint,
            immune: player.is_airborne(),
        })
    }

    /// Live actor count by predicate.
    pub fn count_alive(&self, pred: impl Fn(&Actor) -> bool) -> usize {
        self.actors.values().filter(|a| a.is_alive() && pred(a)).count()
    }

    /// Encounter finished?
    pub fn is_over(&self) -> bool {
        self.outcome.is_over()
    }

    /// Views of every actor in id order.
    pub fn actor_views(&self) -> Vec<ActorView> {
        self.actors.values().map(Actor::view).collect()
    }

    /// Ground pools in tile order.
    pub fn hazard_snapshot(&self) -> Vec<Hazard> {
        self.hazards.snapshot()
    }

    /// Live lasers.
    pub fn lasers(&self) -> &[Laser] {
        self.lasers.lasers()
    }

    /// Active portal sweep (telegraph tiles and band edge).
    pub fn portal_view(&self) -> Option<PortalView> {
        self.portal.view(&self.grid)
    }

    /// Full presentation snapshot.
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            outcome: self.outcome,
            boss_phase: self.boss().and_then(|b| b.boss_brain()).map(|b| b.phase()),
            actors: self.actor_views(),
            hazards: self.hazard_snapshot(),
            lasers: self.lasers().to_vec(),
            portal: self.portal_view(),
        }
    }

    /// Run one tick.
    pub fn advance(&mut self, input: &InputFrame, dt: f32) -> TickResult {
        tick(self, input, dt)
    }

    /// Compute state hash for determinism checks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.config.seed, |hasher| {
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
            hasher.update_u8(self.outcome as u8);

            // Actors in sorted order (BTreeMap guarantees this)
            hasher.update_u32(self.actors.len() as u32);
            for actor in self.actors.values() {
                actor.hash_into(hasher);
            }

            hasher.update_u32(self.hazards.len() as u32);
            for hazard in self.hazards.iter() {
                hasher.update_tile(hazard.position);
                hasher.update_u8(hazard.kind as u8);
                hasher.update_f32(hazard.remaining);
                hasher.update_f32(hazard.tick_countdown);
            }

            hasher.update_bool(self.lasers.is_enabled());
            hasher.update_f32(self.lasers.spawn_timer());
            for laser in self.lasers() {
                hasher.update_u8(laser.orientation as u8);
                hasher.update_i32(laser.coordinate);
                hasher.update_u8(laser.phase as u8);
                hasher.update_f32(laser.timer);
            }

            hasher.update_bool(self.portal.is_active());
            if let Some(view) = self.portal_view() {
                hasher.update_u32(view.index as u32);
                hasher.update_u8(view.phase as u8);
                hasher.update_f32(view.progress);
            }
        })
    }

    /// Take all pending events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Push an event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
