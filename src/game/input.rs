//! Player Input
//!
//! One frame of button state per player slot. Buttons are packed into a
//! single flag byte, the same shape for humans and the ghost.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::state::{PlayerId, PlayerSlots};

/// Input for every slot, supplied once per update call.
pub type InputFrame = PlayerSlots<PlayerInput>;

/// Button state for a single player and frame.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Packed flags:
    /// - Bit 0: left held
    /// - Bit 1: right held
    /// - Bit 2: jump held
    /// - Bit 3: ability held
    /// - Bit 4: slot joined
    pub flags: u8,
}

impl PlayerInput {
    /// Left flag bit
    pub const FLAG_LEFT: u8 = 0x01;
    /// Right flag bit
    pub const FLAG_RIGHT: u8 = 0x02;
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x04;
    /// Ability flag bit
    pub const FLAG_ABILITY: u8 = 0x08;
    /// Joined flag bit
    pub const FLAG_JOINED: u8 = 0x10;

    /// No buttons, not joined.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// No buttons, joined.
    pub const fn joined() -> Self {
        Self { flags: Self::FLAG_JOINED }
    }

    /// Hold left.
    pub const fn with_left(self) -> Self {
        Self { flags: self.flags | Self::FLAG_LEFT }
    }

    /// Hold right.
    pub const fn with_right(self) -> Self {
        Self { flags: self.flags | Self::FLAG_RIGHT }
    }

    /// Hold jump.
    pub const fn with_jump(self) -> Self {
        Self { flags: self.flags | Self::FLAG_JUMP }
    }

    /// Hold ability.
    pub const fn with_ability(self) -> Self {
        Self { flags: self.flags | Self::FLAG_ABILITY }
    }

    /// Left held.
    #[inline]
    pub const fn left(&self) -> bool {
        self.flags & Self::FLAG_LEFT != 0
    }

    /// Right held.
    #[inline]
    pub const fn right(&self) -> bool {
        self.flags & Self::FLAG_RIGHT != 0
    }

    /// Jump held.
    #[inline]
    pub const fn jump(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Ability held.
    #[inline]
    pub const fn ability(&self) -> bool {
        self.flags & Self::FLAG_ABILITY != 0
    }

    /// Slot joined.
    #[inline]
    pub const fn is_joined(&self) -> bool {
        self.flags & Self::FLAG_JOINED != 0
    }

    /// Horizontal intent: -1, 0 or +1. Left and right cancel out.
    #[inline]
    pub fn horizontal(&self) -> i8 {
        (self.right() as i8) - (self.left() as i8)
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Set left flag.
    #[inline]
    pub fn set_left(&mut self, on: bool) {
        self.set(Self::FLAG_LEFT, on);
    }

    /// Set right flag.
    #[inline]
    pub fn set_right(&mut self, on: bool) {
        self.set(Self::FLAG_RIGHT, on);
    }

    /// Set jump flag.
    #[inline]
    pub fn set_jump(&mut self, on: bool) {
        self.set(Self::FLAG_JUMP, on);
    }

    /// Set ability flag.
    #[inline]
    pub fn set_ability(&mut self, on: bool) {
        self.set(Self::FLAG_ABILITY, on);
    }
}

impl fmt::Debug for PlayerInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerInput")
            .field("left", &self.left())
            .field("right", &self.right())
            .field("jump", &self.jump())
            .field("ability", &self.ability())
            .field("joined", &self.is_joined())
            .finish()
    }
}

/// Empty frame with the given players marked joined.
pub fn joined_frame(players: &[PlayerId]) -> InputFrame {
    let mut frame = InputFrame::default();
    for id in players {
        frame[*id] = PlayerInput::joined();
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_flags() {
        let mut input = PlayerInput::new();
        assert!(!input.left() && !input.right() && !input.jump() && !input.ability());
        assert!(!input.is_joined());

        input.set_jump(true);
        assert!(input.jump());
        assert!(!input.ability());

        input.set_ability(true);
        input.set_jump(false);
        assert!(!input.jump());
        assert!(input.ability());
    }

    #[test]
    fn test_horizontal_cancels() {
        assert_eq!(PlayerInput::joined().with_left().horizontal(), -1);
        assert_eq!(PlayerInput::joined().with_right().horizontal(), 1);
        assert_eq!(PlayerInput::joined().with_left().with_right().horizontal(), 0);
        assert_eq!(PlayerInput::joined().horizontal(), 0);
    }

    #[test]
    fn test_joined_frame() {
        let ids = [PlayerId::ALL[0], PlayerId::ALL[2]];
        let frame = joined_frame(&ids);
        assert!(frame[PlayerId::ALL[0]].is_joined());
        assert!(!frame[PlayerId::ALL[1]].is_joined());
        assert!(frame[PlayerId::ALL[2]].is_joined());
    }
}
