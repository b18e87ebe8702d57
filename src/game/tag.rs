//! Tag State Machine
//!
//! Tracks which player is "it", detects contact tags and accumulates
//! hold time for the fairness window and the whole round.

use serde::{Serialize, Deserialize};

use crate::game::collision::players_overlap;
use crate::game::state::{PlayerEntity, PlayerId, PlayerSlots};

/// Re-arm delay after a contact tag (ms).
pub const TAG_COOLDOWN_MS: f64 = 800.0;

/// A contact tag: "it" passed from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvent {
    /// Previous holder (the tagger)
    pub from: PlayerId,
    /// New holder
    pub to: PlayerId,
}

/// "It" holder, cooldown and hold-time accounting.
///
/// Exactly one player is "it" at all times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagSystem {
    it_player: PlayerId,
    cooldown_ms: f64,
    hold_window: PlayerSlots<f64>,
    hold_round: PlayerSlots<f64>,
}

impl TagSystem {
    /// Start with `initial_it` holding "it" and no cooldown.
    pub fn new(initial_it: PlayerId) -> Self {
        Self {
            it_player: initial_it,
            cooldown_ms: 0.0,
            hold_window: PlayerSlots::default(),
            hold_round: PlayerSlots::default(),
        }
    }

    /// Current "it" holder.
    pub fn it_player(&self) -> PlayerId {
        self.it_player
    }

    /// Remaining tag cooldown (ms).
    pub fn cooldown_ms(&self) -> f64 {
        self.cooldown_ms
    }

    /// Advance by `delta_ms` and test for a contact tag.
    ///
    /// Hold time is credited to the current holder first. If the cooldown
    /// was still running at the start of the call, no tag can register in
    /// this call even when `delta_ms` carries it past zero.
    ///
    /// Only `active` players are considered as targets; shielded or phased
    /// targets are skipped. The first overlapping target in ascending id
    /// order is tagged.
    pub fn update(
        &mut self,
        players: &PlayerSlots<PlayerEntity>,
        active: &[PlayerId],
        delta_ms: f64,
    ) -> Option<TagEvent> {
        self.hold_window[self.it_player] += delta_ms;
        self.hold_round[self.it_player] += delta_ms;

        let was_on_cooldown = self.cooldown_ms > 0.0;
        self.cooldown_ms = (self.cooldown_ms - delta_ms).max(0.0);
        if was_on_cooldown {
            return None;
        }

        let tagger = &players[self.it_player];
        let target = PlayerId::ALL.into_iter().find(|&id| {
            id != self.it_player
                && active.contains(&id)
                && !players[id].modifiers.untaggable()
                && players_overlap(tagger, &players[id])
        })?;

        let event = TagEvent { from: self.it_player, to: target };
        self.it_player = target;
        self.cooldown_ms = TAG_COOLDOWN_MS;
        Some(event)
    }

    /// Hand "it" to `player`, bypassing and clearing the cooldown.
    ///
    /// Returns false (and changes nothing) if `player` already holds "it".
    pub fn force_assign_it(&mut self, player: PlayerId) -> bool {
        if self.it_player == player {
            return false;
        }
        self.it_player = player;
        self.cooldown_ms = 0.0;
        true
    }

    /// Hold time for `player` in the current fairness window (ms).
    pub fn window_hold_time(&self, player: PlayerId) -> f64 {
        self.hold_window[player]
    }

    /// Sum of window hold times across `players`.
    pub fn window_total(&self, players: &[PlayerId]) -> f64 {
        players.iter().map(|&id| self.hold_window[id]).sum()
    }

    /// Zero the fairness window.
    pub fn reset_window_hold_times(&mut self) {
        self.hold_window = PlayerSlots::default();
    }

    /// Per-player hold time across the whole round (ms).
    pub fn round_hold_times(&self) -> &PlayerSlots<f64> {
        &self.hold_round
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;

    const P0: PlayerId = PlayerId::ALL[0];
    const P1: PlayerId = PlayerId::ALL[1];
    const P2: PlayerId = PlayerId::ALL[2];

    fn players_at(xs: [f64; 4]) -> PlayerSlots<PlayerEntity> {
        PlayerSlots::from_fn(|id| {
            let mut p = PlayerEntity::new(id);
            p.position = Vec2::new(xs[id.index()], 100.0);
            p
        })
    }

    fn all() -> Vec<PlayerId> {
        PlayerId::ALL.to_vec()
    }

    #[test]
    fn test_tag_scenario() {
        let players = players_at([100.0, 102.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);

        assert_eq!(tag.update(&players, &all(), 16.0), Some(TagEvent { from: P0, to: P1 }));
        assert_eq!(tag.it_player(), P1);
        assert_eq!(tag.cooldown_ms(), TAG_COOLDOWN_MS);

        // Still overlapping but blocked by cooldown
        assert_eq!(tag.update(&players, &all(), 200.0), None);
        assert_eq!(tag.cooldown_ms(), 600.0);
    }

    #[test]
    fn test_cooldown_boundary_does_not_double_tag() {
        let players = players_at([100.0, 102.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);
        assert!(tag.update(&players, &all(), 16.0).is_some());

        // One call spanning the whole cooldown
        assert_eq!(tag.update(&players, &all(), 1000.0), None);
        assert_eq!(tag.cooldown_ms(), 0.0);
        assert_eq!(tag.it_player(), P1);

        assert_eq!(tag.update(&players, &all(), 16.0), Some(TagEvent { from: P1, to: P0 }));
    }

    #[test]
    fn test_exact_cooldown_call_blocks() {
        let players = players_at([100.0, 102.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);
        assert!(tag.update(&players, &all(), 16.0).is_some());
        assert_eq!(tag.update(&players, &all(), 800.0), None);
        assert!(tag.update(&players, &all(), 1.0).is_some());
    }

    #[test]
    fn test_shielded_and_phased_skipped() {
        let mut players = players_at([100.0, 102.0, 104.0, 500.0]);
        players[P1].modifiers.shielded = true;
        let mut tag = TagSystem::new(P0);
        assert_eq!(tag.update(&players, &all(), 16.0), Some(TagEvent { from: P0, to: P2 }));

        let mut players = players_at([100.0, 102.0, 500.0, 600.0]);
        players[P1].modifiers.phased = true;
        let mut tag = TagSystem::new(P0);
        assert_eq!(tag.update(&players, &all(), 16.0), None);
    }

    #[test]
    fn test_inactive_players_ignored() {
        let players = players_at([100.0, 102.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);
        assert_eq!(tag.update(&players, &[P0, P2], 16.0), None);
        assert_eq!(tag.it_player(), P0);
    }

    #[test]
    fn test_force_assign() {
        let players = players_at([100.0, 102.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);
        assert!(tag.update(&players, &all(), 16.0).is_some());

        assert!(!tag.force_assign_it(P1));
        assert_eq!(tag.cooldown_ms(), TAG_COOLDOWN_MS);

        assert!(tag.force_assign_it(P2));
        assert_eq!(tag.it_player(), P2);
        assert_eq!(tag.cooldown_ms(), 0.0);
    }

    #[test]
    fn test_hold_time_accounting() {
        let players = players_at([100.0, 300.0, 400.0, 500.0]);
        let mut tag = TagSystem::new(P0);
        tag.update(&players, &all(), 100.0);
        tag.update(&players, &all(), 50.0);
        tag.force_assign_it(P1);
        tag.update(&players, &all(), 25.0);

        assert_eq!(tag.window_hold_time(P0), 150.0);
        assert_eq!(tag.window_hold_time(P1), 25.0);
        assert_eq!(tag.window_total(&[P0, P1]), 175.0);
        assert_eq!(tag.window_total(&[P1]), 25.0);

        tag.reset_window_hold_times();
        assert_eq!(tag.window_total(&all()), 0.0);
        assert_eq!(tag.round_hold_times()[P0], 150.0);
        assert_eq!(tag.round_hold_times()[P1], 25.0);
    }
}
