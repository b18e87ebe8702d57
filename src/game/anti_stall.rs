//! Anti-Stall Watchdog
//!
//! Every 20 s of simulated time, checks whether one player has been "it"
//! for most of the window and hands "it" to whoever held it least.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::state::PlayerId;
use crate::game::tag::TagSystem;

/// Evaluation interval (ms).
pub const ANTI_STALL_INTERVAL_MS: f64 = 20_000.0;

/// Share of the window the holder may keep "it" before reassignment.
pub const ANTI_STALL_MAX_SHARE: f64 = 0.5;

/// Fairness watchdog state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AntiStall {
    elapsed_ms: f64,
}

impl AntiStall {
    /// Fresh watchdog with an empty interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time accumulated toward the next evaluation (ms).
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Advance and, once per interval, evaluate the fairness window.
    ///
    /// Returns the player "it" was forced onto, if any. The tag system's
    /// window accumulators are reset on every evaluation.
    pub fn update(&mut self, delta_ms: f64, active: &[PlayerId], tags: &mut TagSystem) -> Option<PlayerId> {
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms < ANTI_STALL_INTERVAL_MS || active.len() <= 1 {
            return None;
        }
        self.elapsed_ms = 0.0;

        let total = tags.window_total(active);
        if total <= 0.0 {
            tags.reset_window_hold_times();
            return None;
        }

        let it = tags.it_player();
        if tags.window_hold_time(it) / total <= ANTI_STALL_MAX_SHARE {
            tags.reset_window_hold_times();
            return None;
        }

        let mut sorted = active.to_vec();
        sorted.sort_unstable();

        let mut lowest: Option<(PlayerId, f64)> = None;
        for id in sorted.into_iter().filter(|&id| id != it) {
            let hold = tags.window_hold_time(id);
            if lowest.map_or(true, |(_, best)| hold < best) {
                lowest = Some((id, hold));
            }
        }

        tags.reset_window_hold_times();
        let (target, _) = lowest?;
        if tags.force_assign_it(target) {
            debug!(from = %it, to = %target, "anti-stall reassigned it");
            Some(target)
        } else {
            None
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
