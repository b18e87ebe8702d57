//! # Tag Infinity
//!
//! Deterministic simulation for a local 1-4 player platformer tag game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TAG INFINITY                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── rng.rs      - Xorshift128+ and LCG generators           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── state.rs    - Players and power-up kinds                │
//! │  ├── map.rs      - Tile maps and rotation                    │
//! │  ├── physics.rs  - Platformer movement                       │
//! │  ├── tag.rs      - "It" and contact tags                     │
//! │  ├── score.rs    - Passive score and combos                  │
//! │  ├── powerup.rs  - Pickups and activations                   │
//! │  ├── ghost.rs    - Ghost opponent                            │
//! │  └── round.rs    - Fixed-step loop and session lifecycle     │
//! │                                                              │
//! │  platform/       - Host collaborators (async, best-effort)   │
//! │  ├── mod.rs      - Storage and platform hooks                │
//! │  └── profile.rs  - Coins and skins                           │
//! │                                                              │
//! │  config.rs       - JSON configuration                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - Simulation advances only in fixed 1/120 s steps
//! - Frame chunking never changes the outcome
//! - No wall clock inside the simulation
//! - All randomness from seeded generators, one stream per subsystem
//!
//! Given identical seeds and per-step inputs, the simulation produces
//! identical snapshots and state hashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod platform;
pub mod config;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use config::{GameConfig, SessionOptions, SimulationConfig};
pub use game::input::{InputFrame, PlayerInput};
pub use game::round::{RoundManager, SessionPhase};
pub use game::state::{PlayerId, PlayerSlots};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed simulation step (ms)
pub const FIXED_STEP_MS: f64 = 1000.0 / 120.0;

/// Round length (ms)
pub const ROUND_DURATION_MS: f64 = 90_000.0;

/// Rounds per session
pub const TOTAL_ROUNDS: u32 = 3;
