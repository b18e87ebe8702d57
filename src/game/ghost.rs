//! Ghost Controller
//!
//! Scripted stand-in for an empty seat. Chases the top-scoring human by
//! extrapolating recent samples, wobbles sideways on a timer so it is not
//! a perfect tracker, takes jump links toward the target and rolls a
//! periodic intent to fire its held power-up.
//!
//! All randomness comes from the injected [`RandomSource`], so two ghosts
//! built from the same seed and fed the same calls act identically.

use serde::{Serialize, Deserialize};

use crate::core::rng::{Lcg, RandomSource};
use crate::core::vec2::Vec2;
use crate::game::input::PlayerInput;
use crate::game::map::{JumpLink, TILE_SIZE};
use crate::game::state::{PlayerEntity, PlayerSlots};

/// Interval between target samples (ms).
pub const SAMPLE_INTERVAL_MS: f64 = 125.0;
/// Samples kept per tracked player.
pub const HISTORY_LEN: usize = 24;
/// Extrapolation horizon (seconds).
pub const PREDICTION_HORIZON_S: f64 = 0.3;
/// Interval between jitter re-rolls (ms).
pub const JITTER_INTERVAL_MS: f64 = 2500.0;
/// Jitter offset (pixels).
pub const JITTER_PX: f64 = 12.0;
/// Horizontal offset ignored when steering (pixels).
pub const STEER_DEADBAND_PX: f64 = 7.0;
/// Jump when the target is this far above (pixels).
pub const JUMP_HEIGHT_TRIGGER_PX: f64 = 20.0;
/// Re-arm delay between jump-link triggers (ms).
pub const JUMP_LINK_COOLDOWN_MS: f64 = 350.0;
/// Jump-link destination must be this close to the target (pixels).
pub const JUMP_LINK_REACH_PX: f64 = 64.0;
/// A link is skipped if its destination is within this of the last one (pixels).
pub const JUMP_LINK_REPEAT_PX: f64 = 8.0;
/// Interval between ability intent re-rolls (ms).
pub const ABILITY_DECISION_MS: f64 = 420.0;
/// Probability the ability intent is set on a re-roll.
pub const ABILITY_INTENT_CHANCE: f64 = 0.6;

/// What the ghost may look at each step.
#[derive(Clone, Copy, Debug)]
pub struct GhostContext<'a> {
    /// Display scores; the highest-scoring human is chased
    pub human_scores: &'a PlayerSlots<u32>,
    /// Current map's jump hints
    pub jump_links: &'a [JumpLink],
    /// The ghost holds a usable power-up
    pub can_use_powerup: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Sample {
    position: Vec2,
    velocity: Vec2,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct SampleRing {
    data: [Sample; HISTORY_LEN],
    head: usize,
    count: usize,
}

impl SampleRing {
    fn push(&mut self, sample: Sample) {
        self.data[self.head] = sample;
        self.head = (self.head + 1) % HISTORY_LEN;
        self.count = (self.count + 1).min(HISTORY_LEN);
    }

    fn latest(&self) -> Option<Sample> {
        if self.count == 0 {
            return None;
        }
        Some(self.data[(self.head + HISTORY_LEN - 1) % HISTORY_LEN])
    }
}

/// Deterministic ghost controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GhostAI<R = Lcg> {
    rng: R,
    history: PlayerSlots<SampleRing>,
    sample_timer_ms: f64,
    jitter_timer_ms: f64,
    jitter_direction: f64,
    jump_link_cooldown_ms: f64,
    last_jump_link_target_x: Option<f64>,
    ability_timer_ms: f64,
    ability_intent: bool,
}

impl GhostAI<Lcg> {
    /// Ghost driven by an [`Lcg`] seeded with `seed`.
    pub fn new(seed: u32) -> Self {
        Self::with_rng(Lcg::new(seed))
    }
}

impl<R: RandomSource> GhostAI<R> {
    /// Ghost driven by any random source.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            history: PlayerSlots::default(),
            sample_timer_ms: 0.0,
            jitter_timer_ms: JITTER_INTERVAL_MS,
            jitter_direction: 0.0,
            jump_link_cooldown_ms: 0.0,
            last_jump_link_target_x: None,
            ability_timer_ms: 0.0,
            ability_intent: false,
        }
    }

    /// Compute this step's input for `ghost`.
    ///
    /// With no humans the ghost stands still (joined, no buttons).
    pub fn update(
        &mut self,
        delta_ms: f64,
        ghost: &PlayerEntity,
        humans: &[&PlayerEntity],
        context: GhostContext<'_>,
    ) -> PlayerInput {
        let mut output = PlayerInput::joined();
        let Some(target) = top_human(humans, context.human_scores) else {
            return output;
        };

        self.sample_timer_ms += delta_ms;
        self.jump_link_cooldown_ms = (self.jump_link_cooldown_ms - delta_ms).max(0.0);

        while self.sample_timer_ms >= SAMPLE_INTERVAL_MS {
            self.sample_timer_ms -= SAMPLE_INTERVAL_MS;
            self.history[target.id].push(Sample {
                position: target.position,
                velocity: target.velocity,
            });
        }

        self.jitter_timer_ms -= delta_ms;
        while self.jitter_timer_ms <= 0.0 {
            self.jitter_timer_ms += JITTER_INTERVAL_MS;
            self.jitter_direction = if self.rng.chance(0.5) { -1.0 } else { 1.0 };
        }

        let predicted = self.predict(target);
        let target_x = predicted.x + self.jitter_direction * JITTER_PX;
        let dx = target_x - ghost.position.x;
        if dx < -STEER_DEADBAND_PX {
            output.set_left(true);
        } else if dx > STEER_DEADBAND_PX {
            output.set_right(true);
        }

        let needs_height = predicted.y < ghost.position.y - JUMP_HEIGHT_TRIGGER_PX;
        let jump = ghost.on_ground
            && (needs_height || self.should_take_jump_link(ghost, target_x, context.jump_links));
        output.set_jump(jump);

        self.ability_timer_ms -= delta_ms;
        while self.ability_timer_ms <= 0.0 {
            self.ability_timer_ms += ABILITY_DECISION_MS;
            self.ability_intent = self.rng.chance(ABILITY_INTENT_CHANCE);
        }
        output.set_ability(context.can_use_powerup && self.ability_intent);

        output
    }

    fn predict(&self, target: &PlayerEntity) -> Vec2 {
        match self.history[target.id].latest() {
            Some(sample) => sample.position + sample.velocity * PREDICTION_HORIZON_S,
            None => target.position,
        }
    }

    /// Arms the cooldown and remembers the destination when a link fires.
    fn should_take_jump_link(&mut self, ghost: &PlayerEntity, target_x: f64, links: &[JumpLink]) -> bool {
        if self.jump_link_cooldown_ms > 0.0 {
            return false;
        }

        let tile = TILE_SIZE as f64;
        let ghost_tx = (ghost.position.x / tile).floor();
        let ghost_ty = (ghost.position.y / tile).floor();

        for link in links {
            let dest_x = link.to.x as f64 * tile;
            let near_source = (link.from.x as f64 - ghost_tx).abs() <= 1.0
                && (link.from.y as f64 - ghost_ty).abs() <= 1.0;
            let toward_target = (dest_x - target_x).abs() < JUMP_LINK_REACH_PX;
            let fresh = self
                .last_jump_link_target_x
                .map_or(true, |last| (last - dest_x).abs() > JUMP_LINK_REPEAT_PX);

            if near_source && toward_target && fresh {
                self.last_jump_link_target_x = Some(dest_x);
                self.jump_link_cooldown_ms = JUMP_LINK_COOLDOWN_MS;
                return true;
            }
        }
        false
    }
}

/// Highest display score wins; ties keep the earlier entry.
fn top_human<'a>(humans: &[&'a PlayerEntity], scores: &PlayerSlots<u32>) -> Option<&'a PlayerEntity> {
    let (first, rest) = humans.split_first()?;
    let mut best = *first;
    for &candidate in rest {
        if scores[candidate.id] > scores[best.id] {
            best = candidate;
        }
    }
    Some(best)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::TileCoord;
    use crate::game::state::PlayerId;

    fn player(id: usize, x: f64, y: f64) -> PlayerEntity {
        let mut p = PlayerEntity::new(PlayerId::ALL[id]);
        p.is_human = id != 3;
        p.position = Vec2::new(x, y);
        p.velocity = Vec2::new(80.0, 0.0);
        p.on_ground = true;
        p
    }

    fn scores(values: [u32; 4]) -> PlayerSlots<u32> {
        PlayerSlots(values)
    }

    fn ctx<'a>(scores: &'a PlayerSlots<u32>, links: &'a [JumpLink], can_use: bool) -> GhostContext<'a> {
        GhostContext {
            human_scores: scores,
            jump_links: links,
            can_use_powerup: can_use,
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let ghost = player(3, 100.0, 200.0);
        let h0 = player(0, 250.0, 180.0);
        let h1 = player(1, 180.0, 180.0);
        let scores = scores([30, 10, 0, 0]);

        let mut a = GhostAI::new(7);
        let mut b = GhostAI::new(7);
        for step in 0..2000 {
            let delta = if step % 3 == 0 { 125.0 } else { 1000.0 / 120.0 };
            let out_a = a.update(delta, &ghost, &[&h0, &h1], ctx(&scores, &[], true));
            let out_b = b.update(delta, &ghost, &[&h0, &h1], ctx(&scores, &[], true));
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn test_moves_toward_top_human() {
        let ghost = player(3, 100.0, 200.0);
        let human = player(0, 260.0, 180.0);
        let mut ai = GhostAI::new(11);
        let out = ai.update(125.0, &ghost, &[&human], ctx(&scores([50, 0, 0, 0]), &[], false));
        assert!(out.right());
        assert!(!out.left());
        assert!(!out.ability());

        // Higher score pulls the ghost left instead
        let left_human = player(1, 20.0, 200.0);
        let mut ai = GhostAI::new(11);
        let out = ai.update(125.0, &ghost, &[&human, &left_human], ctx(&scores([5, 50, 0, 0]), &[], false));
        assert!(out.left());
    }

    #[test]
    fn test_idle_without_humans() {
        let ghost = player(3, 100.0, 200.0);
        let mut ai = GhostAI::new(11);
        let out = ai.update(125.0, &ghost, &[], ctx(&scores([0; 4]), &[], true));
        assert_eq!(out, PlayerInput::joined());
    }

    #[test]
    fn test_deadband() {
        let ghost = player(3, 100.0, 200.0);
        let mut human = player(0, 105.0, 200.0);
        human.velocity = Vec2::ZERO;
        let mut ai = GhostAI::new(11);
        let out = ai.update(10.0, &ghost, &[&human], ctx(&scores([0; 4]), &[], false));
        assert_eq!(out.horizontal(), 0);
        assert!(!out.jump());
    }

    #[test]
    fn test_jumps_for_higher_target() {
        let mut ghost = player(3, 100.0, 200.0);
        let human = player(0, 100.0, 150.0);
        let mut ai = GhostAI::new(3);
        assert!(ai.update(10.0, &ghost, &[&human], ctx(&scores([0; 4]), &[], false)).jump());

        ghost.on_ground = false;
        assert!(!ai.update(10.0, &ghost, &[&human], ctx(&scores([0; 4]), &[], false)).jump());
    }

    #[test]
    fn test_jump_link_cooldown_and_repeat() {
        let ghost = player(3, 160.0, 160.0);
        let human = player(0, 192.0, 160.0);
        let links = [JumpLink {
            from: TileCoord::new(10, 10),
            to: TileCoord::new(12, 7),
        }];
        let scores = scores([20, 0, 0, 0]);
        let mut ai = GhostAI::new(17);

        assert!(ai.update(125.0, &ghost, &[&human], ctx(&scores, &links, false)).jump());
        assert!(!ai.update(100.0, &ghost, &[&human], ctx(&scores, &links, false)).jump());
        // Cooldown over, but the same destination is not taken twice in a row
        assert!(!ai.update(400.0, &ghost, &[&human], ctx(&scores, &links, false)).jump());
    }

    #[test]
    fn test_ability_intent_follows_rng() {
        let ghost = player(3, 100.0, 200.0);
        let human = player(0, 100.0, 200.0);
        let scores = scores([0; 4]);

        let mut ai = GhostAI::new(99);
        let mut reference = Lcg::new(99);
        let expected = reference.chance(ABILITY_INTENT_CHANCE);

        // Intent holds for the whole decision window
        for _ in 0..50 {
            let out = ai.update(1000.0 / 120.0, &ghost, &[&human], ctx(&scores, &[], true));
            assert_eq!(out.ability(), expected);
        }

        let out = ai.update(1000.0 / 120.0, &ghost, &[&human], ctx(&scores, &[], false));
        assert!(!out.ability());
    }
}
