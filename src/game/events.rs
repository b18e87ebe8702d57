//! Game Events
//!
//! Cues generated during simulation (tag flashes, pickup claims, round
//! results) for presentation layers and logs.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::state::{PlayerId, PowerupType};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// "It" changes first
    ItChange = 0,
    /// Then activations
    PowerupEffect = 1,
    /// Then hazards
    Hazard = 2,
    /// Then pickups
    Pickup = 3,
    /// Round and session transitions
    Lifecycle = 4,
}

/// Why "it" moved without a contact tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReassignReason {
    /// Fairness watchdog
    AntiStall,
    /// Swap Zap activation
    SwapZap,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Contact tag
    Tagged {
        /// Previous "it"
        from: PlayerId,
        /// New "it"
        to: PlayerId,
        /// Points awarded to the tagger, combo bonus included
        points: f64,
    },

    /// "It" forced onto a player
    ItReassigned {
        /// Player who stopped being "it"
        from: PlayerId,
        /// Player who became "it"
        to: PlayerId,
        /// What forced the change
        reason: ReassignReason,
    },

    /// Pickup appeared
    PickupSpawned {
        /// Session-unique pickup id
        pickup_id: u32,
        /// Power-up the pickup grants
        powerup: PowerupType,
        /// Center in world pixels
        position: Vec2,
    },

    /// Player claimed a pickup
    PickupClaimed {
        /// Claiming player
        player_id: PlayerId,
        /// Pickup removed from the map
        pickup_id: u32,
        /// Power-up now held by the player
        powerup: PowerupType,
    },

    /// Player activated a held power-up
    PowerupUsed {
        /// Activating player
        player_id: PlayerId,
        /// Power-up consumed
        powerup: PowerupType,
    },

    /// Mine caught a player
    MineTriggered {
        /// Player who placed the mine
        owner_id: PlayerId,
        /// Player who stepped on it
        victim_id: PlayerId,
    },

    /// Round clock ran out
    RoundEnded {
        /// 1-based round number
        round_index: u32,
        /// Highest score, lowest id on ties
        winner_id: PlayerId,
        /// Longest combo, lowest id on ties
        best_combo_id: PlayerId,
    },

    /// Final round finalized
    SessionCompleted {
        /// Rounds finalized this session
        rounds_played: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Fixed step of the round when the event occurred
    pub step: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Player involved (for tie-breaking)
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(step: u32, priority: EventPriority, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::Tagged { to, .. } => Some(*to),
            GameEventData::ItReassigned { to, .. } => Some(*to),
            GameEventData::PickupClaimed { player_id, .. } => Some(*player_id),
            GameEventData::PowerupUsed { player_id, .. } => Some(*player_id),
            GameEventData::MineTriggered { victim_id, .. } => Some(*victim_id),
            GameEventData::RoundEnded { winner_id, .. } => Some(*winner_id),
            GameEventData::PickupSpawned { .. } | GameEventData::SessionCompleted { .. } => None,
        };

        Self {
            step,
            priority,
            player_id,
            data,
        }
    }

    /// Create contact tag event.
    pub fn tagged(step: u32, from: PlayerId, to: PlayerId, points: f64) -> Self {
        Self::new(step, EventPriority::ItChange, GameEventData::Tagged { from, to, points })
    }

    /// Create forced reassignment event.
    pub fn it_reassigned(step: u32, from: PlayerId, to: PlayerId, reason: ReassignReason) -> Self {
        Self::new(
            step,
            EventPriority::ItChange,
            GameEventData::ItReassigned { from, to, reason },
        )
    }

    /// Create pickup spawned event.
    pub fn pickup_spawned(step: u32, pickup_id: u32, powerup: PowerupType, position: Vec2) -> Self {
        Self::new(
            step,
            EventPriority::Pickup,
            GameEventData::PickupSpawned {
                pickup_id,
                powerup,
                position,
            },
        )
    }

    /// Create pickup claimed event.
    pub fn pickup_claimed(step: u32, player_id: PlayerId, pickup_id: u32, powerup: PowerupType) -> Self {
        Self::new(
            step,
            EventPriority::Pickup,
            GameEventData::PickupClaimed {
                player_id,
                pickup_id,
                powerup,
            },
        )
    }

    /// Create power-up used event.
    pub fn powerup_used(step: u32, player_id: PlayerId, powerup: PowerupType) -> Self {
        Self::new(
            step,
            EventPriority::PowerupEffect,
            GameEventData::PowerupUsed { player_id, powerup },
        )
    }

    /// Create mine triggered event.
    pub fn mine_triggered(step: u32, owner_id: PlayerId, victim_id: PlayerId) -> Self {
        Self::new(
            step,
            EventPriority::Hazard,
            GameEventData::MineTriggered { owner_id, victim_id },
        )
    }

    /// Create round ended event.
    pub fn round_ended(step: u32, round_index: u32, winner_id: PlayerId, best_combo_id: PlayerId) -> Self {
        Self::new(
            step,
            EventPriority::Lifecycle,
            GameEventData::RoundEnded {
                round_index,
                winner_id,
                best_combo_id,
            },
        )
    }

    /// Create session completed event.
    pub fn session_completed(step: u32, rounds_played: u32) -> Self {
        Self::new(
            step,
            EventPriority::Lifecycle,
            GameEventData::SessionCompleted { rounds_played },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.step == other.step
            && self.priority == other.priority
            && self.player_id == other.player_id
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
        // Sort by: step, then priority, then player_id
        self.step
            .cmp(&other.step)
            .then(self.priority.cmp(&other.priority))
            .then(self.player_id.cmp(&other.player_id))
    }
}
