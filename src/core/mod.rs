//! Core deterministic primitives.
//!
//! Everything the simulation needs that is not game logic: vectors,
//! seeded randomness and state fingerprints.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::{DeterministicRng, Lcg, RandomSource};
pub use hash::{compute_state_hash, StateHash, StateHasher};
