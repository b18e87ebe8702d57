//! Round Snapshot
//!
//! Immutable per-frame projection of the session for renderers, logs and
//! determinism checks.

use std::sync::Arc;

use serde::Serialize;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::map::MapData;
use crate::game::powerup::{Decoy, Mine, Pickup};
use crate::game::round::SessionPhase;
use crate::game::state::{PlayerEntity, PlayerId, PlayerSlots};
use crate::platform::SaveProfile;

/// Everything a presentation layer may read about the session.
#[derive(Clone, Debug, Serialize)]
pub struct RoundSnapshot {
    /// Session seed
    pub seed: u64,
    /// Current round, 1-based
    pub round_index: u32,
    /// Rounds per session
    pub total_rounds: u32,
    /// Remaining round clock (ms)
    pub round_time_left_ms: f64,
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Current map
    pub map: Arc<MapData>,
    /// All four slots, active or not
    pub players: PlayerSlots<PlayerEntity>,
    /// "It" holder
    pub it_player: PlayerId,
    /// Display scores (floored)
    pub scores: PlayerSlots<u32>,
    /// Visible pickups (empty when power-ups are disabled)
    pub pickups: Vec<Pickup>,
    /// Armed mines
    pub mines: Vec<Mine>,
    /// Live decoys
    pub decoys: Vec<Decoy>,
    /// Humans plus the ghost, if any
    pub joined_players: Vec<PlayerId>,
    /// Slot driven by the ghost
    pub ghost_player: Option<PlayerId>,
    /// All rounds are done
    pub session_complete: bool,
    /// Player progress
    pub profile: SaveProfile,
    /// Remaining tag flash (ms)
    pub tag_flash_ms: f64,
}

impl RoundSnapshot {
    /// Number of visible pickups.
    pub fn pickup_count(&self) -> usize {
        self.pickups.len()
    }

    /// Whether `player` takes part in the round.
    pub fn is_joined(&self, player: PlayerId) -> bool {
        self.joined_players.contains(&player)
    }

    /// SHA-256 fingerprint of the simulation-relevant state.
    ///
    /// Covers the round clock, map, every player's kinematics and held
    /// power-up, "it" and scores, and the pickup field. Profile and
    /// presentation timers are left out.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.round_index, self.seed, |h| {
            h.update_f64(self.round_time_left_ms);
            h.update_str(self.map.id());

            for player in self.players.values() {
                h.update_u8(player.id.get());
                h.update_vec2(player.position);
                h.update_vec2(player.velocity);
                h.update_bool(player.on_ground);
                h.update_f64(player.facing.sign());
                h.update_u8(player.active_powerup.map_or(u8::MAX, |p| p as u8));
                h.update_f64(player.powerup_cooldown_ms);
            }

            h.update_u8(self.it_player.get());
            for score in self.scores.values() {
                h.update_u32(*score);
            }

            h.update_u32(self.pickups.len() as u32);
            for pickup in &self.pickups {
                h.update_u32(pickup.id);
                h.update_u8(pickup.powerup as u8);
                h.update_vec2(pickup.position);
            }
        })
    }
}
