//! Game State Definitions
//!
//! Player identity, the fixed 4-slot player arena and the per-player
//! entity record mutated by physics and power-ups.

use std::fmt;
use std::ops::{Index, IndexMut};
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

/// Number of player slots in a session.
pub const MAX_PLAYERS: usize = 4;

/// Player hitbox width (pixels).
pub const PLAYER_WIDTH: f64 = 12.0;

/// Player hitbox height (pixels).
pub const PLAYER_HEIGHT: f64 = 20.0;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Slot index of a player (0..=3).
///
/// Implements Ord so that every "first in scan order" rule is simply
/// ascending id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// All player ids in fixed scan order.
    pub const ALL: [PlayerId; MAX_PLAYERS] = [PlayerId(0), PlayerId(1), PlayerId(2), PlayerId(3)];

    /// Create from a slot index. Returns None outside 0..=3.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_PLAYERS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Slot index as usize.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Slot index as u8.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PlayerId::new(value).ok_or_else(|| format!("player id {} out of range 0..=3", value))
    }
}

impl From<PlayerId> for u8 {
    fn from(id: PlayerId) -> u8 {
        id.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// =============================================================================
// PLAYER SLOTS
// =============================================================================

/// Fixed 4-slot arena indexed by [`PlayerId`].
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSlots<T>(pub [T; MAX_PLAYERS]);

impl<T> PlayerSlots<T> {
    /// Build every slot from its id.
    pub fn from_fn(mut f: impl FnMut(PlayerId) -> T) -> Self {
        Self([
            f(PlayerId::ALL[0]),
            f(PlayerId::ALL[1]),
            f(PlayerId::ALL[2]),
            f(PlayerId::ALL[3]),
        ])
    }

    /// Iterate `(id, value)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        PlayerId::ALL.into_iter().zip(self.0.iter())
    }

    /// Iterate `(id, value)` mutably in ascending id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        PlayerId::ALL.into_iter().zip(self.0.iter_mut())
    }

    /// Iterate values in ascending id order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Iterate values mutably in ascending id order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.0.iter_mut()
    }

    /// Mutable access to two distinct slots at once.
    ///
    /// Returns None when `a == b`.
    pub fn pair_mut(&mut self, a: PlayerId, b: PlayerId) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }
        let (lo, hi, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
        let (left, right) = self.0.split_at_mut(hi.index());
        let lo_ref = &mut left[lo.index()];
        let hi_ref = &mut right[0];
        if swapped {
            Some((hi_ref, lo_ref))
        } else {
            Some((lo_ref, hi_ref))
        }
    }
}

impl<T> Index<PlayerId> for PlayerSlots<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: PlayerId) -> &T {
        &self.0[id.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerSlots<T> {
    #[inline]
    fn index_mut(&mut self, id: PlayerId) -> &mut T {
        &mut self.0[id.index()]
    }
}

// =============================================================================
// POWER-UP TYPES
// =============================================================================

/// The 14 power-up kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerupType {
    /// Timed: speed x1.8
    HyperDash = 0,
    /// Instant: teleport 64px along facing
    BlinkStep = 1,
    /// Instant: upward launch plus forward kick
    BounceBurst = 2,
    /// Instant: teleport to a random spawn tile
    WarpGate = 3,
    /// Instant: drop a slowing hazard
    IceMine = 4,
    /// Timed: cannot be tagged
    TagShield = 5,
    /// Timed: cannot be tagged
    PhaseCloak = 6,
    /// Timed: doubled passive score
    ScoreSurge = 7,
    /// Timed: gravity x0.6
    LowGrav = 8,
    /// Instant: swap places with "it" and take "it"
    SwapZap = 9,
    /// Timed: slows every other player
    TimeCrush = 10,
    /// Instant: cosmetic decoy
    DecoyClone = 11,
    /// Instant: vertical launch
    RocketHop = 12,
    /// Instant: strip everyone else's timed effects
    EmpBurst = 13,
}

impl PowerupType {
    /// All power-up types in declaration order.
    pub const ALL: [PowerupType; 14] = [
        PowerupType::HyperDash,
        PowerupType::BlinkStep,
        PowerupType::BounceBurst,
        PowerupType::WarpGate,
        PowerupType::IceMine,
        PowerupType::TagShield,
        PowerupType::PhaseCloak,
        PowerupType::ScoreSurge,
        PowerupType::LowGrav,
        PowerupType::SwapZap,
        PowerupType::TimeCrush,
        PowerupType::DecoyClone,
        PowerupType::RocketHop,
        PowerupType::EmpBurst,
    ];

    /// Cooldown armed on the user after activation (ms).
    pub const fn use_cooldown_ms(self) -> f64 {
        match self {
            PowerupType::HyperDash => 550.0,
            PowerupType::BlinkStep => 450.0,
            PowerupType::BounceBurst => 420.0,
            PowerupType::WarpGate => 900.0,
            PowerupType::IceMine => 700.0,
            PowerupType::TagShield => 500.0,
            PowerupType::PhaseCloak => 550.0,
            PowerupType::ScoreSurge => 500.0,
            PowerupType::LowGrav => 500.0,
            PowerupType::SwapZap => 850.0,
            PowerupType::TimeCrush => 700.0,
            PowerupType::DecoyClone => 650.0,
            PowerupType::RocketHop => 450.0,
            PowerupType::EmpBurst => 800.0,
        }
    }

    /// Relative weight when rolling a pickup type.
    pub const fn spawn_weight(self) -> f64 {
        match self {
            PowerupType::HyperDash => 2.2,
            PowerupType::BlinkStep => 2.6,
            PowerupType::BounceBurst => 3.2,
            PowerupType::WarpGate => 3.2,
            PowerupType::IceMine => 0.8,
            PowerupType::TagShield => 1.5,
            PowerupType::PhaseCloak => 1.0,
            PowerupType::ScoreSurge => 0.9,
            PowerupType::LowGrav => 2.1,
            PowerupType::SwapZap => 1.1,
            PowerupType::TimeCrush => 0.8,
            PowerupType::DecoyClone => 0.7,
            PowerupType::RocketHop => 2.4,
            PowerupType::EmpBurst => 0.7,
        }
    }

    /// Effect duration for timed types, None for instant types.
    pub const fn effect_duration_ms(self) -> Option<f64> {
        match self {
            PowerupType::HyperDash => Some(3000.0),
            PowerupType::TagShield => Some(2600.0),
            PowerupType::PhaseCloak => Some(2600.0),
            PowerupType::ScoreSurge => Some(3200.0),
            PowerupType::LowGrav => Some(3400.0),
            PowerupType::TimeCrush => Some(2800.0),
            PowerupType::BlinkStep
            | PowerupType::BounceBurst
            | PowerupType::WarpGate
            | PowerupType::IceMine
            | PowerupType::SwapZap
            | PowerupType::DecoyClone
            | PowerupType::RocketHop
            | PowerupType::EmpBurst => None,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            PowerupType::HyperDash => "Hyper Dash",
            PowerupType::BlinkStep => "Blink Step",
            PowerupType::BounceBurst => "Bounce Burst",
            PowerupType::WarpGate => "Warp Gate",
            PowerupType::IceMine => "Ice Mine",
            PowerupType::TagShield => "Tag Shield",
            PowerupType::PhaseCloak => "Phase Cloak",
            PowerupType::ScoreSurge => "Score Surge",
            PowerupType::LowGrav => "Low Grav",
            PowerupType::SwapZap => "Swap Zap",
            PowerupType::TimeCrush => "Time Crush",
            PowerupType::DecoyClone => "Decoy Clone",
            PowerupType::RocketHop => "Rocket Hop",
            PowerupType::EmpBurst => "EMP Burst",
        }
    }
}

// =============================================================================
// PLAYER ENTITY
// =============================================================================

/// Horizontal facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing -X
    Left,
    /// Facing +X
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for Left, +1.0 for Right.
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Per-step multipliers and flags rebuilt from live effects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerModifiers {
    /// Horizontal speed multiplier
    pub speed_multiplier: f64,
    /// Gravity multiplier
    pub gravity_multiplier: f64,
    /// Global slow (speed, gravity and fall cap)
    pub slow_multiplier: f64,
    /// Cannot be tagged
    pub shielded: bool,
    /// Cannot be tagged
    pub phased: bool,
    /// Passive score bonus
    pub score_surge: bool,
}

impl Default for PlayerModifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            gravity_multiplier: 1.0,
            slow_multiplier: 1.0,
            shielded: false,
            phased: false,
            score_surge: false,
        }
    }
}

impl PlayerModifiers {
    /// Back to neutral.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when contact tags should skip this player.
    #[inline]
    pub fn untaggable(&self) -> bool {
        self.shielded || self.phased
    }
}

/// State of a single player slot.
///
/// Position is the feet-center of the hitbox: the box spans
/// `[x - w/2, x + w/2] x [y - h, y]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntity {
    /// Slot id
    pub id: PlayerId,
    /// Controlled by a joined human
    pub is_human: bool,
    /// Feet-center position (pixels)
    pub position: Vec2,
    /// Velocity (pixels / second)
    pub velocity: Vec2,
    /// Hitbox width
    pub width: f64,
    /// Hitbox height
    pub height: f64,
    /// Standing on solid ground
    pub on_ground: bool,
    /// Horizontal facing
    pub facing: Facing,
    /// Held, not yet used power-up
    pub active_powerup: Option<PowerupType>,
    /// Time until another power-up may be used (ms)
    pub powerup_cooldown_ms: f64,
    /// Effect-derived modifiers
    pub modifiers: PlayerModifiers,
    /// Remaining coyote time (ms)
    pub coyote_time_ms: f64,
    /// Remaining jump buffer (ms)
    pub jump_buffer_ms: f64,
    /// Jump button was held last step
    pub jump_held: bool,
}

impl PlayerEntity {
    /// Create a player at the origin.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            is_human: true,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            on_ground: false,
            facing: Facing::Right,
            active_powerup: None,
            powerup_cooldown_ms: 0.0,
            modifiers: PlayerModifiers::default(),
            coyote_time_ms: 0.0,
            jump_buffer_ms: 0.0,
            jump_held: false,
        }
    }

    /// Reset transient state at a round start.
    ///
    /// Facing is intentionally carried over between rounds.
    pub fn reset_for_round(&mut self, spawn: Vec2, is_human: bool) {
        self.position = spawn;
        self.velocity = Vec2::ZERO;
        self.on_ground = false;
        self.active_powerup = None;
        self.powerup_cooldown_ms = 0.0;
        self.modifiers.reset();
        self.coyote_time_ms = 0.0;
        self.jump_buffer_ms = 0.0;
        self.jump_held = false;
        self.is_human = is_human;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_range() {
        assert!(PlayerId::new(0).is_some());
        assert!(PlayerId::new(3).is_some());
        assert!(PlayerId::new(4).is_none());
        assert_eq!(PlayerId::ALL.map(|id| id.get()), [0, 1, 2, 3]);
    }

    #[test]
    fn test_player_id_display_matches_index() {
        assert_eq!(PlayerId::ALL[0].to_string(), "P0");
        assert_eq!(PlayerId::ALL[2].to_string(), "P2");
        assert_eq!(format!("{}", PlayerId::ALL[3]), "P3");
    }

    #[test]
    fn test_player_id_serde() {
        let json = serde_json::to_string(&PlayerId::ALL[1]).unwrap();
        assert_eq!(json, "1");
        let back: PlayerId = serde_json::from_str("3").unwrap();
        assert_eq!(back, PlayerId::ALL[3]);
        assert!(serde_json::from_str::<PlayerId>("4").is_err());
    }

    #[test]
    fn test_slots_index_and_iter() {
        let mut slots = PlayerSlots::from_fn(|id| id.index() * 10);
        assert_eq!(slots[PlayerId::ALL[2]], 20);

        slots[PlayerId::ALL[1]] = 99;
        let collected: Vec<_> = slots.iter().map(|(id, v)| (id.get(), *v)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 99), (2, 20), (3, 30)]);
    }

    #[test]
    fn test_slots_pair_mut() {
        let mut slots = PlayerSlots([1, 2, 3, 4]);
        let (a, b) = slots.pair_mut(PlayerId::ALL[3], PlayerId::ALL[0]).unwrap();
        std::mem::swap(a, b);
        assert_eq!(slots.0, [4, 2, 3, 1]);
        assert!(slots.pair_mut(PlayerId::ALL[1], PlayerId::ALL[1]).is_none());
    }

    #[test]
    fn test_powerup_tables() {
        assert_eq!(PowerupType::ALL.len(), 14);
        let timed: Vec<_> = PowerupType::ALL
            .iter()
            .filter(|p| p.effect_duration_ms().is_some())
            .collect();
        assert_eq!(timed.len(), 6);

        for p in PowerupType::ALL {
            let cd = p.use_cooldown_ms();
            assert!((420.0..=900.0).contains(&cd), "{:?} cooldown {}", p, cd);
            assert!(p.spawn_weight() > 0.0);
        }
    }

    #[test]
    fn test_reset_for_round() {
        let mut p = PlayerEntity::new(PlayerId::ALL[0]);
        p.velocity = Vec2::new(5.0, 5.0);
        p.active_powerup = Some(PowerupType::SwapZap);
        p.modifiers.shielded = true;
        p.facing = Facing::Left;
        p.reset_for_round(Vec2::new(56.0, 256.0), false);

        assert_eq!(p.position, Vec2::new(56.0, 256.0));
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.active_powerup, None);
        assert_eq!(p.modifiers, PlayerModifiers::default());
        assert!(!p.is_human);
        assert_eq!(p.facing, Facing::Left);
    }
}
