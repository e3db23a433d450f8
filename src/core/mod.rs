//! Core deterministic primitives.
//!
//! Grid geometry, the seeded RNG and state hashing. Everything above builds
//! on these.

pub mod grid;
pub mod rng;
pub mod hash;

// Re-export core types
pub use grid::{Footprint, Grid, GridError, GridPosition, TilePos};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
