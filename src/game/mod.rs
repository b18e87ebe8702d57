//! Game Logic Module
//!
//! All simulation code. Deterministic given seeds and inputs.
//!
//! ## Module Structure
//!
//! - `state`: Player ids, slots, entities and power-up kinds
//! - `input`: Per-player button flags
//! - `map` / `maps`: Tile maps, the built-in catalog and map rotation
//! - `collision`: Hitbox overlap
//! - `physics`: Platformer movement and tile resolution
//! - `tag`: "It" ownership and contact tags
//! - `score`: Passive score and tag combos
//! - `powerup`: Pickups, activations, effects, mines and decoys
//! - `anti_stall`: Forced "it" handoff
//! - `ghost`: Computer-controlled filler player
//! - `events`: Ordered game events
//! - `snapshot`: Read-only session view
//! - `round`: Fixed-step loop and session lifecycle

pub mod state;
pub mod input;
pub mod map;
pub mod maps;
pub mod collision;
pub mod physics;
pub mod tag;
pub mod score;
pub mod powerup;
pub mod anti_stall;
pub mod ghost;
pub mod events;
pub mod snapshot;
pub mod round;

// Re-export key types
pub use state::{PlayerEntity, PlayerId, PlayerSlots, PowerupType, MAX_PLAYERS};
pub use input::{InputFrame, PlayerInput};
pub use map::{MapData, MapManager};
pub use events::{GameEvent, GameEventData};
pub use snapshot::RoundSnapshot;
pub use round::{FrameResult, RoundManager, SessionError, SessionPhase};
