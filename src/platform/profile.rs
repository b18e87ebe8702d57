//! Save Profile
//!
//! Coins and unlocked skins, persisted as JSON through a [`KeyValueStore`].
//! Loading never fails: missing, malformed or unreachable data falls back
//! to the default profile.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{bounded, KeyValueStore, PlatformError};

/// Storage key of the profile.
pub const PROFILE_KEY: &str = "tag_infinity_profile_v1";

/// Default storage timeout (ms).
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 2000;

/// Coins for finishing a round.
pub const REWARD_BASE: u64 = 40;
/// Bonus when a human wins the round.
pub const REWARD_ROUND_WIN: u64 = 30;
/// Bonus when a human holds the best combo.
pub const REWARD_BEST_COMBO: u64 = 20;

/// Price of the n-th skin bought beyond the free ones; the last entry
/// repeats.
pub const SKIN_COSTS: [u64; 8] = [100, 200, 350, 550, 800, 1100, 1450, 1850];

/// Skins every profile starts with.
pub const FREE_SKIN_IDS: [u32; 4] = [0, 1, 2, 3];

// =============================================================================
// SKINS
// =============================================================================

/// A cosmetic player skin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkinDefinition {
    /// Stable id
    pub id: u32,
    /// Display name
    pub name: &'static str,
    /// 0xRRGGBB tint
    pub color: u32,
}

const fn skin(id: u32, name: &'static str, color: u32) -> SkinDefinition {
    SkinDefinition { id, name, color }
}

/// Skin catalog in unlock order.
pub const SKINS: [SkinDefinition; 11] = [
    skin(0, "Neon Blue", 0x7df9ff),
    skin(1, "Peach", 0xffc98f),
    skin(2, "Mint", 0x9fff9f),
    skin(3, "Violet", 0xe4b5ff),
    skin(4, "Coral", 0xff9ca8),
    skin(5, "Sunbeam", 0xffef96),
    skin(6, "Sky", 0xa8d0ff),
    skin(7, "Aqua", 0xb4ffda),
    skin(8, "Earth", 0x8b6a44),
    skin(9, "Chef", 0xf2f5f8),
    skin(10, "Mask", 0x2f2f3a),
];

/// Tint of skin `id`, if it exists.
pub fn skin_color(id: u32) -> Option<u32> {
    SKINS.iter().find(|s| s.id == id).map(|s| s.color)
}

// =============================================================================
// PROFILE
// =============================================================================

/// Errors writing the profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile could not be encoded
    #[error("failed to encode profile: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Store rejected the write
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Persistent player progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfile {
    /// Spendable currency
    pub tag_coins: u64,
    /// Owned skins, ascending and unique
    pub unlocked_skin_ids: Vec<u32>,
}

impl Default for SaveProfile {
    fn default() -> Self {
        Self {
            tag_coins: 0,
            unlocked_skin_ids: FREE_SKIN_IDS.to_vec(),
        }
    }
}

impl SaveProfile {
    /// Sort and de-duplicate skin ids.
    pub fn normalized(mut self) -> Self {
        self.unlocked_skin_ids.sort_unstable();
        self.unlocked_skin_ids.dedup();
        self
    }

    /// Whether skin `id` is owned.
    pub fn owns(&self, id: u32) -> bool {
        self.unlocked_skin_ids.contains(&id)
    }

    /// Price of the next purchase.
    pub fn next_skin_cost(&self) -> u64 {
        let bought = self
            .unlocked_skin_ids
            .iter()
            .filter(|id| !FREE_SKIN_IDS.contains(id))
            .count();
        SKIN_COSTS[bought.min(SKIN_COSTS.len() - 1)]
    }
}

/// Coins earned for a finished round.
pub fn round_reward(human_won: bool, human_best_combo: bool) -> u64 {
    let mut earned = REWARD_BASE;
    if human_won {
        earned += REWARD_ROUND_WIN;
    }
    if human_best_combo {
        earned += REWARD_BEST_COMBO;
    }
    earned
}

// =============================================================================
// SAVE MANAGER
// =============================================================================

/// Reads and writes the profile through a store.
#[derive(Debug)]
pub struct SaveManager<S> {
    store: S,
    timeout_ms: u64,
}

impl<S: KeyValueStore> SaveManager<S> {
    /// Manager with the default storage timeout.
    pub fn new(store: S) -> Self {
        Self::with_timeout(store, DEFAULT_STORAGE_TIMEOUT_MS)
    }

    /// Manager with a custom storage timeout.
    pub fn with_timeout(store: S, timeout_ms: u64) -> Self {
        Self { store, timeout_ms }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the profile, falling back to the default on any problem.
    pub async fn load_profile(&self) -> SaveProfile {
        let raw = match bounded(self.timeout_ms, self.store.get(PROFILE_KEY)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return SaveProfile::default(),
            Err(e) => {
                warn!(error = %e, "profile load failed, using defaults");
                return SaveProfile::default();
            }
        };

        match serde_json::from_str::<SaveProfile>(&raw) {
            Ok(profile) => profile.normalized(),
            Err(e) => {
                warn!(error = %e, "stored profile is malformed, using defaults");
                SaveProfile::default()
            }
        }
    }

    /// Normalize and persist `profile`. Returns what was written.
    pub async fn save_profile(&self, profile: &SaveProfile) -> Result<SaveProfile, ProfileError> {
        let safe = profile.clone().normalized();
        let json = serde_json::to_string(&safe)?;
        bounded(self.timeout_ms, self.store.set(PROFILE_KEY, &json)).await?;
        Ok(safe)
    }

    /// Credit a round's reward and persist.
    pub async fn grant_round_rewards(
        &self,
        profile: &SaveProfile,
        human_won: bool,
        human_best_combo: bool,
    ) -> Result<SaveProfile, ProfileError> {
        let earned = round_reward(human_won, human_best_combo);
        let next = SaveProfile {
            tag_coins: profile.tag_coins + earned,
            ..profile.clone()
        };
        debug!(earned, total = next.tag_coins, "round rewards granted");
        self.save_profile(&next).await
    }

    /// Buy the lowest locked skin if affordable.
    ///
    /// Returns the purchased id, or None when everything is owned or the
    /// coins do not cover the price. `profile` is only changed on purchase.
    pub async fn unlock_next_skin(&self, profile: &mut SaveProfile) -> Result<Option<u32>, ProfileError> {
        let Some(next) = SKINS.iter().find(|s| !profile.owns(s.id)) else {
            return Ok(None);
        };

        let cost = profile.next_skin_cost();
        if profile.tag_coins < cost {
            return Ok(None);
        }

        let mut bought = profile.clone();
        bought.tag_coins -= cost;
        bought.unlocked_skin_ids.push(next.id);
        *profile = self.save_profile(&bought).await?;
        debug!(skin = next.name, cost, "skin unlocked");
        Ok(Some(next.id))
    }
}
