//! Game Logic Module
//!
//! The encounter simulation. Deterministic for a given seed and dt stream.
//!
//! ## Module Structure
//!
//! - `config`: Encounter tunables and validation
//! - `pattern`: Attack tile patterns
//! - `attack`: Attack kinds and the telegraph/execute state machine
//! - `hazard`: Ground pools (fire, poison)
//! - `laser`: Row/column lasers
//! - `portal`: Portal band-dash sweeps
//! - `movement`: A* detours and per-actor movement
//! - `actor`: Health, roles, views
//! - `boss`, `minion`, `player`: Per-role behaviour
//! - `combat`: Hit resolution and knockback
//! - `input`: Per-tick input frames
//! - `events`: Game events for presentation and replay
//! - `state`: The encounter orchestrator
//! - `tick`: Authoritative simulation loop

pub mod config;
pub mod pattern;
pub mod attack;
pub mod hazard;
pub mod laser;
pub mod portal;
pub mod movement;
pub mod actor;
pub mod boss;
pub mod minion;
pub mod player;
pub mod combat;
pub mod input;
pub mod events;
pub mod state;
pub mod tick;

// Re-export key types
pub use actor::{Actor, ActorId, ActorKind, ActorView};
pub use config::{ConfigError, EncounterConfig};
pub use events::{GameEvent, GameEventData};
pub use input::{InputFrame, PlayerAbility};
pub use state::{Encounter, EncounterOutcome, EncounterSnapshot};
pub use tick::{tick, replay_encounter, TickResult};
