//! Encounter Events
//!
//! Everything the presentation layer (or a log) needs to know happened
//! during a tick. Events sort by tick, then priority, then actor.

use serde::{Serialize, Deserialize};

use crate::core::grid::TilePos;
use crate::game::actor::{ActorId, ActorKind};
use crate::game::attack::AttackId;
use crate::game::boss::BossPhase;
use crate::game::combat::DamageEvent;
use crate::game::hazard::HazardKind;
use crate::game::laser::LineOrientation;
use crate::game::state::EncounterOutcome;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Deaths first
    Death = 0,
    /// Then damage
    Damage = 1,
    /// Then attacks
    Attack = 2,
    /// Then hazards
    Hazard = 3,
    /// Then boss phases and scripted sequences
    Phase = 4,
    /// Lowest priority
    Other = 255,
}

/// Event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Damage applied
    DamageDealt(DamageEvent),

    /// Actor died
    ActorDied {
        /// Who
        actor: ActorId,
        /// What it was
        kind: ActorKind,
    },

    /// Attack started telegraphing
    AttackStarted {
        /// Attacker
        actor: ActorId,
        /// Attack kind
        attack: AttackId,
        /// Cached hit tiles
        tiles: Vec<TilePos>,
    },

    /// Player leapt
    LeapStarted {
        /// Player
        actor: ActorId,
        /// Destination
        to: TilePos,
    },

    /// Ground pools seeded
    HazardsSeeded {
        /// Seeding actor
        actor: ActorId,
        /// Pool kind
        kind: HazardKind,
        /// New records
        count: usize,
    },

    /// Laser spawned
    LaserSpawned {
        /// Orientation
        orientation: LineOrientation,
        /// Line coordinate
        coordinate: i32,
    },

    /// Boss phase changed
    BossPhaseChanged {
        /// Previous phase
        old_phase: BossPhase,
        /// New phase
        new_phase: BossPhase,
    },

    /// Escort minions spawned
    EscortSpawned {
        /// New minions
        minions: Vec<ActorId>,
    },

    /// Portal dash began
    PortalDashStarted {
        /// Number of sweeps
        sweeps: usize,
    },

    /// Portal dash finished
    PortalDashCompleted,

    /// Encounter ended
    EncounterEnded {
        /// Result
        outcome: EncounterOutcome,
        /// Ticks played
        duration_ticks: u32,
    },
}

/// An event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Actor involved (for tie-breaking)
    pub actor: Option<ActorId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let actor = match &data {
            GameEventData::DamageDealt(d) => Some(d.target),
            GameEventData::ActorDied { actor, .. } => Some(*actor),
            GameEventData::AttackStarted { actor, .. } => Some(*actor),
            GameEventData::LeapStarted { actor, .. } => Some(*actor),
            GameEventData::HazardsSeeded { actor, .. } => Some(*actor),
            _ => None,
        };

        Self { tick, priority, actor, data }
    }

    /// Create damage event.
    pub fn damage(tick: u32, damage: DamageEvent) -> Self {
        Self::new(tick, EventPriority::Damage, GameEventData::DamageDealt(damage))
    }

    /// Create death event.
    pub fn actor_died(tick: u32, actor: ActorId, kind: ActorKind) -> Self {
        Self::new(tick, EventPriority::Death, GameEventData::ActorDied { actor, kind })
    }

    /// Create attack started event.
    pub fn attack_started(tick: u32, actor: ActorId, attack: AttackId, tiles: Vec<TilePos>) -> Self {
        Self::new(tick, EventPriority::Attack, GameEventData::AttackStarted { actor, attack, tiles })
    }

    /// Create leap event.
    pub fn leap_started(tick: u32, actor: ActorId, to: TilePos) -> Self {
        Self::new(tick, EventPriority::Attack, GameEventData::LeapStarted { actor, to })
    }

    /// Create hazards seeded event.
    pub fn hazards_seeded(tick: u32, actor: ActorId, kind: HazardKind, count: usize) -> Self {
        Self::new(tick, EventPriority::Hazard, GameEventData::HazardsSeeded { actor, kind, count })
    }

    /// Create laser spawned event.
    pub fn laser_spawned(tick: u32, orientation: LineOrientation, coordinate: i32) -> Self {
        Self::new(tick, EventPriority::Hazard, GameEventData::LaserSpawned { orientation, coordinate })
    }

    /// Create boss phase event.
    pub fn boss_phase_changed(tick: u32, old_phase: BossPhase, new_phase: BossPhase) -> Self {
        Self::new(tick, EventPriority::Phase, GameEventData::BossPhaseChanged { old_phase, new_phase })
    }

    /// Create escort event.
    pub fn escort_spawned(tick: u32, minions: Vec<ActorId>) -> Self {
        Self::new(tick, EventPriority::Phase, GameEventData::EscortSpawned { minions })
    }

    /// Create portal dash started event.
    pub fn portal_dash_started(tick: u32, sweeps: usize) -> Self {
        Self::new(tick, EventPriority::Phase, GameEventData::PortalDashStarted { sweeps })
    }

    /// Create portal dash completed event.
    pub fn portal_dash_completed(tick: u32) -> Self {
        Self::new(tick, EventPriority::Phase, GameEventData::PortalDashCompleted)
    }

    /// Create encounter ended event.
    pub fn encounter_ended(tick: u32, outcome: EncounterOutcome) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::EncounterEnded { outcome, duration_ticks: tick },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.actor == other.actor
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then actor
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.actor.cmp(&other.actor))
    }
}
