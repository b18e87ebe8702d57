//! Scoring
//!
//! Passive score for everyone who is not "it", a flat reward plus combo
//! bonus for tags, and the round-end winner / best-combo selection.

use serde::{Serialize, Deserialize};

use crate::game::state::{PlayerEntity, PlayerId, PlayerSlots};

/// Passive points per second for non-"it" players.
pub const PASSIVE_POINTS_PER_SEC: f64 = 4.0;
/// Extra passive points per second under Score Surge.
pub const SURGE_BONUS_PER_SEC: f64 = 4.0;
/// Flat reward for a tag.
pub const TAG_BASE_POINTS: f64 = 120.0;
/// Combo bonus per stacked tag.
pub const COMBO_STEP_POINTS: f64 = 20.0;
/// Combo bonus ceiling.
pub const COMBO_BONUS_CAP: f64 = 100.0;
/// Combo window opened by a tag (ms).
pub const COMBO_WINDOW_MS: f64 = 8000.0;

/// Per-player combo tracking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    /// Tags chained inside the open window
    pub stack: u32,
    /// Remaining window (ms)
    pub window_ms: f64,
    /// Highest stack reached
    pub best: u32,
}

/// Scores and combos for one round.
///
/// Only players joined at construction accrue points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSystem {
    scores: PlayerSlots<f64>,
    combos: PlayerSlots<ComboState>,
    joined: PlayerSlots<bool>,
}

impl ScoreSystem {
    /// Scores scoped to `joined` players.
    pub fn new(joined: &[PlayerId]) -> Self {
        Self {
            scores: PlayerSlots::default(),
            combos: PlayerSlots::default(),
            joined: PlayerSlots::from_fn(|id| joined.contains(&id)),
        }
    }

    /// Whether `player` accrues score this round.
    pub fn is_joined(&self, player: PlayerId) -> bool {
        self.joined[player]
    }

    /// Roll combo windows and passive score forward.
    pub fn tick(&mut self, delta_ms: f64, it_player: PlayerId, players: &PlayerSlots<PlayerEntity>) {
        let dt = delta_ms / 1000.0;

        for id in PlayerId::ALL {
            let combo = &mut self.combos[id];
            combo.window_ms = (combo.window_ms - delta_ms).max(0.0);
            if combo.window_ms <= 0.0 {
                combo.stack = 0;
            }

            if !self.joined[id] || id == it_player {
                continue;
            }

            let surge = if players[id].modifiers.score_surge { SURGE_BONUS_PER_SEC } else { 0.0 };
            self.scores[id] += (PASSIVE_POINTS_PER_SEC + surge) * dt;
        }
    }

    /// Credit a tag to `tagger`. Returns the points gained.
    ///
    /// The stack grows while the tagger's combo window is open and restarts
    /// at 1 otherwise.
    pub fn on_tag(&mut self, tagger: PlayerId) -> f64 {
        if !self.joined[tagger] {
            return 0.0;
        }

        let combo = &mut self.combos[tagger];
        combo.stack = if combo.window_ms > 0.0 { combo.stack + 1 } else { 1 };
        combo.window_ms = COMBO_WINDOW_MS;
        combo.best = combo.best.max(combo.stack);

        let bonus = (combo.stack as f64 * COMBO_STEP_POINTS).min(COMBO_BONUS_CAP);
        let gained = TAG_BASE_POINTS + bonus;
        self.scores[tagger] += gained;
        gained
    }

    /// Raw (unfloored) score.
    pub fn raw_score(&self, player: PlayerId) -> f64 {
        self.scores[player]
    }

    /// Display scores, floored.
    pub fn scores(&self) -> PlayerSlots<u32> {
        PlayerSlots::from_fn(|id| self.scores[id].floor() as u32)
    }

    /// Combo state for `player`.
    pub fn combo(&self, player: PlayerId) -> ComboState {
        self.combos[player]
    }

    /// Highest raw score among joined players; ties go to the lower id.
    pub fn round_winner(&self) -> PlayerId {
        let mut winner = PlayerId::ALL[0];
        let mut best = f64::NEG_INFINITY;
        for id in PlayerId::ALL {
            if self.joined[id] && self.scores[id] > best {
                best = self.scores[id];
                winner = id;
            }
        }
        winner
    }

    /// Highest combo watermark among joined players; ties go to the lower id.
    pub fn best_combo_player(&self) -> PlayerId {
        let mut winner = PlayerId::ALL[0];
        let mut best: i64 = -1;
        for id in PlayerId::ALL {
            let combo = self.combos[id].best as i64;
            if self.joined[id] && combo > best {
                best = combo;
                winner = id;
            }
        }
        winner
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const P0: PlayerId = PlayerId::ALL[0];
    const P1: PlayerId = PlayerId::ALL[1];
    const P2: PlayerId = PlayerId::ALL[2];
    const P3: PlayerId = PlayerId::ALL[3];

    fn players() -> PlayerSlots<PlayerEntity> {
        PlayerSlots::from_fn(PlayerEntity::new)
    }

    #[test]
    fn test_combo_bonuses() {
        let mut score = ScoreSystem::new(&[P0, P1]);
        let gains: Vec<f64> = (0..7).map(|_| score.on_tag(P0)).collect();
        assert_eq!(gains, vec![140.0, 160.0, 180.0, 200.0, 220.0, 220.0, 220.0]);
        assert_eq!(score.combo(P0).best, 7);
    }

    #[test]
    fn test_combo_window_expires() {
        let mut score = ScoreSystem::new(&[P0, P1]);
        let players = players();
        assert_eq!(score.on_tag(P0), 140.0);
        score.tick(7999.0, P1, &players);
        assert_eq!(score.on_tag(P0), 160.0);

        score.tick(8000.0, P1, &players);
        assert_eq!(score.combo(P0).stack, 0);
        assert_eq!(score.on_tag(P0), 140.0);
        assert_eq!(score.combo(P0).best, 2);
    }

    #[test]
    fn test_passive_rate() {
        let mut score = ScoreSystem::new(&[P0, P1, P2]);
        let mut players = players();
        players[P2].modifiers.score_surge = true;

        for _ in 0..120 {
            score.tick(1000.0 / 120.0, P0, &players);
        }

        let scores = score.scores();
        assert_eq!(scores[P0], 0);
        assert!((score.raw_score(P1) - 4.0).abs() < 1e-9);
        assert!((score.raw_score(P2) - 8.0).abs() < 1e-9);
        assert_eq!(scores[P3], 0);
    }

    #[test]
    fn test_unjoined_tagger_gains_nothing() {
        let mut score = ScoreSystem::new(&[P0]);
        assert_eq!(score.on_tag(P1), 0.0);
        assert_eq!(score.raw_score(P1), 0.0);
    }

    #[test]
    fn test_winner_ties_go_to_lowest_id() {
        let score = ScoreSystem::new(&[P1, P2]);
        assert_eq!(score.round_winner(), P1);
        assert_eq!(score.best_combo_player(), P1);

        let mut score = ScoreSystem::new(&[P1, P2, P3]);
        score.on_tag(P3);
        score.on_tag(P2);
        assert_eq!(score.round_winner(), P2);
        assert_eq!(score.best_combo_player(), P2);
    }

    #[test]
    fn test_unjoined_never_wins() {
        let mut score = ScoreSystem::new(&[P2]);
        score.scores[P0] = 1000.0;
        assert_eq!(score.round_winner(), P2);
    }
}
