//! # Gridfall
//!
//! Tile-grid boss encounter simulation core: telegraphed attacks, ground
//! hazards, lasers, a portal dash and combat resolution.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        GRIDFALL                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── grid.rs     - Tiles, footprints, walls                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Encounter logic (deterministic)           │
//! │  ├── pattern.rs  - Attack tile patterns                      │
//! │  ├── attack.rs   - Telegraph/execute state machine           │
//! │  ├── hazard.rs   - Ground pools                              │
//! │  ├── laser.rs    - Row/column lasers                         │
//! │  ├── portal.rs   - Band-dash sweeps                          │
//! │  ├── movement.rs - A* detours, smooth stepping               │
//! │  ├── boss.rs     - Boss selection and phases                 │
//! │  ├── combat.rs   - Hit resolution                            │
//! │  ├── state.rs    - Encounter orchestrator                    │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! - No HashMap (BTreeMap for sorted iteration)
//! - No system time; the caller supplies dt, clamped per tick
//! - All randomness from the seeded Xorshift128+
//!
//! Given the same config, inputs and dt stream, the simulation produces
//! the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::grid::{Footprint, Grid, TilePos};
pub use core::rng::DeterministicRng;
pub use game::config::EncounterConfig;
pub use game::input::{InputFrame, PlayerAbility};
pub use game::state::{Encounter, EncounterOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
