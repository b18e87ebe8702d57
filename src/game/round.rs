//! Round Orchestration
//!
//! `RoundManager` owns every piece of mutable simulation state and drives
//! the session lifecycle:
//!
//! ```text
//! Idle ──init_session──► RoundActive ──clock expires──► Finalizing
//!                             ▲                              │
//!                             └──── next round (after ad) ◄──┤
//!                                                            ▼
//!                                                     SessionComplete
//! ```
//!
//! ## Fixed step (in order)
//!
//! 1. Merge human input with the ghost's
//! 2. Ability presses (press edge only; Swap Zap may move "it")
//! 3. Physics for every active player
//! 4. Power-ups
//! 5. Contact tags (scored only if no ability moved "it" this step)
//! 6. Passive score
//! 7. Anti-stall (only if "it" has not moved this step)
//! 8. Round clock and tag flash

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SessionOptions, SimulationConfig};
use crate::game::anti_stall::AntiStall;
use crate::game::events::{GameEvent, ReassignReason};
use crate::game::ghost::{GhostAI, GhostContext};
use crate::game::input::InputFrame;
use crate::game::map::{MapData, MapError, MapManager};
use crate::game::physics;
use crate::game::powerup::PowerupSystem;
use crate::game::score::ScoreSystem;
use crate::game::snapshot::RoundSnapshot;
use crate::game::state::{PlayerEntity, PlayerId, PlayerSlots, MAX_PLAYERS};
use crate::game::tag::TagSystem;
use crate::platform::{bounded, AdListener, KeyValueStore, PlatformHooks, ProfileError, SaveManager, SaveProfile};

// =============================================================================
// TYPES
// =============================================================================

/// Session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session started
    #[default]
    Idle,
    /// Simulation advancing
    RoundActive,
    /// Clock ran out; waiting for `finish_round`
    Finalizing,
    /// All rounds done (or finalization failed)
    SessionComplete,
}

/// Errors starting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No human joined
    #[error("a session needs at least one human")]
    NoHumans,

    /// More humans than seats
    #[error("{0} humans joined, at most 4 seats")]
    TooManyHumans(usize),

    /// Same seat listed twice
    #[error("player {0} joined twice")]
    DuplicatePlayer(PlayerId),

    /// Static map data is invalid
    #[error(transparent)]
    Map(#[from] MapError),

    /// Simulation config is out of range
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Outcome of one `update` call.
#[derive(Clone, Debug, Default)]
pub struct FrameResult {
    /// Fixed steps executed
    pub steps: u32,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    /// The round clock hit zero during this call
    pub round_expired: bool,
}

type MuteHandler = Box<dyn FnMut(bool) + Send>;

/// Routes ad pause/resume into the manager's mute state.
struct MuteListener<'a> {
    muted: &'a mut bool,
    handler: Option<&'a mut MuteHandler>,
}

impl MuteListener<'_> {
    fn set(&mut self, muted: bool) {
        *self.muted = muted;
        if let Some(handler) = self.handler.as_mut() {
            handler(muted);
        }
    }
}

impl AdListener for MuteListener<'_> {
    fn on_pause(&mut self) {
        self.set(true);
    }

    fn on_resume(&mut self) {
        self.set(false);
    }
}

// =============================================================================
// ROUND MANAGER
// =============================================================================

/// Session orchestrator.
pub struct RoundManager<S, P> {
    config: SimulationConfig,
    options: SessionOptions,
    maps: MapManager,
    saves: SaveManager<S>,
    platform: P,
    platform_ready: bool,
    mute_handler: Option<MuteHandler>,
    muted: bool,

    powerups: PowerupSystem,
    ghost_ai: GhostAI,
    players: PlayerSlots<PlayerEntity>,
    humans: Vec<PlayerId>,
    active: Vec<PlayerId>,
    ghost_player: Option<PlayerId>,
    map: Arc<MapData>,
    tags: TagSystem,
    score: ScoreSystem,
    anti_stall: AntiStall,
    ability_latch: PlayerSlots<bool>,

    profile: SaveProfile,
    phase: SessionPhase,
    round_index: u32,
    round_time_ms: f64,
    accumulator_ms: f64,
    round_step: u32,
    tag_flash_ms: f64,
    events: Vec<GameEvent>,
}

impl<S: KeyValueStore, P: PlatformHooks> RoundManager<S, P> {
    /// Validate the map catalog and seed every subsystem.
    pub fn new(config: SimulationConfig, store: S, platform: P) -> Result<Self, SessionError> {
        config.validate()?;
        let mut maps = MapManager::new(config.map_seed())?;
        let map = maps.next_map();
        let first = PlayerId::ALL[0];

        Ok(Self {
            options: SessionOptions::default(),
            saves: SaveManager::with_timeout(store, config.storage_timeout_ms),
            platform,
            platform_ready: false,
            mute_handler: None,
            muted: false,
            powerups: PowerupSystem::new(config.powerup_seed()),
            ghost_ai: GhostAI::new(config.ghost_seed()),
            players: PlayerSlots::from_fn(PlayerEntity::new),
            humans: Vec::new(),
            active: Vec::new(),
            ghost_player: None,
            map,
            tags: TagSystem::new(first),
            score: ScoreSystem::new(&[first]),
            anti_stall: AntiStall::new(),
            ability_latch: PlayerSlots::default(),
            profile: SaveProfile::default(),
            phase: SessionPhase::Idle,
            round_index: 0,
            round_time_ms: config.round_duration_ms,
            accumulator_ms: 0.0,
            round_step: 0,
            tag_flash_ms: 0.0,
            events: Vec::new(),
            maps,
            config,
        })
    }

    /// Install the audio mute collaborator.
    pub fn with_mute_handler(mut self, handler: impl FnMut(bool) + Send + 'static) -> Self {
        self.mute_handler = Some(Box::new(handler));
        self
    }

    /// Start a session for `humans` (seat order decides the first "it").
    ///
    /// Ignored while a round is being finalized.
    pub async fn init_session(&mut self, humans: &[PlayerId], options: SessionOptions) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Finalizing {
            debug!("init_session ignored during finalization");
            return Ok(());
        }

        if humans.is_empty() {
            return Err(SessionError::NoHumans);
        }
        if humans.len() > MAX_PLAYERS {
            return Err(SessionError::TooManyHumans(humans.len()));
        }
        for (i, id) in humans.iter().enumerate() {
            if humans[..i].contains(id) {
                return Err(SessionError::DuplicatePlayer(*id));
            }
        }

        if !self.platform_ready {
            if let Err(e) = bounded(self.config.platform_init_timeout_ms, self.platform.init()).await {
                warn!(error = %e, "platform init failed, continuing without it");
            }
            self.platform_ready = true;
        }

        self.humans = humans.to_vec();
        self.options = options;
        self.profile = self.saves.load_profile().await;
        self.round_index = 0;
        self.events.clear();
        self.map = self.maps.next_map();
        self.start_round();
        self.platform.gameplay_start();

        info!(
            humans = self.humans.len(),
            ghost = self.options.ghost_enabled,
            powerups = self.options.powerups_enabled,
            coins = self.profile.tag_coins,
            "session started"
        );
        Ok(())
    }

    /// Feed one variable-length frame.
    ///
    /// Runs whole fixed steps from the accumulated time, at most
    /// `max_steps_per_frame` of them. Outside an active round, or while
    /// muted by an ad, the frame is accepted and nothing advances.
    pub fn update(&mut self, delta_ms: f64, inputs: &InputFrame) -> FrameResult {
        if self.phase != SessionPhase::RoundActive || self.muted {
            return FrameResult::default();
        }

        let delta_ms = if delta_ms.is_finite() {
            delta_ms.clamp(0.0, self.config.max_frame_delta_ms)
        } else {
            0.0
        };
        self.accumulator_ms += delta_ms;

        let step_ms = self.config.fixed_step_ms;
        let mut steps = 0;
        while self.accumulator_ms >= step_ms
            && steps < self.config.max_steps_per_frame
            && self.phase == SessionPhase::RoundActive
        {
            self.accumulator_ms -= step_ms;
            self.step_simulation(step_ms, inputs);
            steps += 1;
        }

        FrameResult {
            steps,
            events: self.take_events(),
            round_expired: self.phase == SessionPhase::Finalizing,
        }
    }

    /// Grant rewards and move to the next round or complete the session.
    ///
    /// Only acts in `Finalizing`. Any failure completes the session rather
    /// than retrying, so rewards are never granted twice.
    pub async fn finish_round(&mut self) {
        if self.phase != SessionPhase::Finalizing {
            return;
        }

        if let Err(e) = self.finalize().await {
            warn!(error = %e, "round finalization failed, ending session");
            self.complete_session();
        }
    }

    /// `update`, then `finish_round` if the clock expired.
    pub async fn advance(&mut self, delta_ms: f64, inputs: &InputFrame) -> FrameResult {
        let mut result = self.update(delta_ms, inputs);
        if self.phase == SessionPhase::Finalizing {
            self.finish_round().await;
            result.events.append(&mut self.events);
        }
        result
    }

    /// Immutable view of the current state.
    pub fn snapshot(&self) -> RoundSnapshot {
        let pickups = if self.options.powerups_enabled {
            self.powerups.pickups().to_vec()
        } else {
            Vec::new()
        };

        RoundSnapshot {
            seed: self.config.seed,
            round_index: (self.round_index + 1).min(self.config.total_rounds),
            total_rounds: self.config.total_rounds,
            round_time_left_ms: self.round_time_ms,
            phase: self.phase,
            map: Arc::clone(&self.map),
            players: self.players.clone(),
            it_player: self.tags.it_player(),
            scores: self.score.scores(),
            pickups,
            mines: self.powerups.mines().to_vec(),
            decoys: self.powerups.decoys().to_vec(),
            joined_players: self.active.clone(),
            ghost_player: self.ghost_player,
            session_complete: self.phase == SessionPhase::SessionComplete,
            profile: self.profile.clone(),
            tag_flash_ms: self.tag_flash_ms,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Player progress as last loaded or saved.
    pub fn profile(&self) -> &SaveProfile {
        &self.profile
    }

    /// Players taking part in the current round.
    pub fn active_players(&self) -> &[PlayerId] {
        &self.active
    }

    /// Slot driven by the ghost, if any.
    pub fn ghost_player(&self) -> Option<PlayerId> {
        self.ghost_player
    }

    /// Profile persistence.
    pub fn save_manager(&self) -> &SaveManager<S> {
        &self.saves
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    fn start_round(&mut self) {
        self.round_time_ms = self.config.round_duration_ms;
        self.accumulator_ms = 0.0;
        self.round_step = 0;
        self.tag_flash_ms = 0.0;
        self.map = self.maps.next_map();
        self.ghost_player = self.select_ghost_player();

        self.active = self.humans.clone();
        self.active.extend(self.ghost_player);

        let spawns = self.maps.spawn_positions(&self.map);
        for (id, player) in self.players.iter_mut() {
            player.reset_for_round(spawns[id], self.humans.contains(&id));
        }

        self.tags = TagSystem::new(self.active[0]);
        self.score = ScoreSystem::new(&self.active);
        self.anti_stall = AntiStall::new();
        self.powerups.clear_round(&mut self.players);
        self.ability_latch = PlayerSlots::default();
        self.phase = SessionPhase::RoundActive;

        info!(
            round = self.round_index + 1,
            map = %self.map.id(),
            active = self.active.len(),
            ghost = ?self.ghost_player,
            "round started"
        );
    }

    fn select_ghost_player(&self) -> Option<PlayerId> {
        if !self.options.ghost_enabled || self.humans.len() >= MAX_PLAYERS {
            return None;
        }
        PlayerId::ALL.into_iter().find(|id| !self.humans.contains(id))
    }

    async fn finalize(&mut self) -> Result<(), ProfileError> {
        let winner = self.score.round_winner();
        let best_combo = self.score.best_combo_player();
        let human_won = self.humans.contains(&winner);
        let human_best_combo = self.humans.contains(&best_combo);

        self.events.push(GameEvent::round_ended(
            self.round_step,
            self.round_index + 1,
            winner,
            best_combo,
        ));
        info!(round = self.round_index + 1, winner = %winner, best_combo = %best_combo, "round ended");

        self.profile = self
            .saves
            .grant_round_rewards(&self.profile, human_won, human_best_combo)
            .await?;

        self.round_index += 1;
        self.powerups.clear_round(&mut self.players);

        if self.round_index >= self.config.total_rounds {
            self.complete_session();
            return Ok(());
        }

        self.show_midgame_ad().await;
        self.start_round();
        Ok(())
    }

    fn complete_session(&mut self) {
        self.phase = SessionPhase::SessionComplete;
        self.platform.gameplay_stop();
        self.events.push(GameEvent::session_completed(self.round_step, self.round_index));
        info!(rounds = self.round_index, coins = self.profile.tag_coins, "session complete");
    }

    async fn show_midgame_ad(&mut self) {
        let mut listener = MuteListener {
            muted: &mut self.muted,
            handler: self.mute_handler.as_mut(),
        };
        let shown = bounded(self.config.ad_timeout_ms, self.platform.show_midgame_ad(&mut listener)).await;
        if let Err(e) = shown {
            warn!(error = %e, "midgame ad skipped");
        }

        if *listener.muted {
            listener.set(false);
        }
    }

    // -------------------------------------------------------------------------
    // Fixed step
    // -------------------------------------------------------------------------

    fn step_simulation(&mut self, step_ms: f64, inputs: &InputFrame) {
        self.round_step += 1;
        let step = self.round_step;

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(step, it = %self.tags.it_player(), clock = self.round_time_ms, "fixed step");

        let merged = self.merge_inputs(inputs, step_ms);
        let mut reassigned = self.options.powerups_enabled && self.handle_abilities(&merged, step);

        for &id in &self.active {
            physics::step(&mut self.players[id], &merged[id], &self.map, step_ms);
        }

        if self.options.powerups_enabled {
            let events = self.powerups.update(step_ms, &mut self.players, &self.active, &self.map, step);
            self.events.extend(events);
        }

        // Contact bookkeeping always runs; it only scores if nothing else
        // moved "it" this step.
        let contact = self.tags.update(&self.players, &self.active, step_ms);
        if let Some(tag) = contact.filter(|_| !reassigned) {
            let points = self.score.on_tag(tag.from);
            self.tag_flash_ms = self.config.tag_flash_ms;
            reassigned = true;
            debug!(from = %tag.from, to = %tag.to, points, "tag");
            self.events.push(GameEvent::tagged(step, tag.from, tag.to, points));
        }

        self.score.tick(step_ms, self.tags.it_player(), &self.players);

        if !reassigned {
            let from = self.tags.it_player();
            if let Some(to) = self.anti_stall.update(step_ms, &self.active, &mut self.tags) {
                self.events.push(GameEvent::it_reassigned(step, from, to, ReassignReason::AntiStall));
            }
        }

        self.round_time_ms -= step_ms;
        self.tag_flash_ms = (self.tag_flash_ms - step_ms).max(0.0);
        if self.round_time_ms <= 0.0 {
            self.round_time_ms = 0.0;
            self.phase = SessionPhase::Finalizing;
            info!(round = self.round_index + 1, steps = step, "round clock expired");
        }
    }

    fn merge_inputs(&mut self, inputs: &InputFrame, step_ms: f64) -> InputFrame {
        let mut merged = *inputs;
        if let Some(ghost_id) = self.ghost_player {
            let humans: Vec<&PlayerEntity> = self.humans.iter().map(|&id| &self.players[id]).collect();
            let ghost = &self.players[ghost_id];
            let scores = self.score.scores();
            let context = GhostContext {
                human_scores: &scores,
                jump_links: self.map.jump_links(),
                can_use_powerup: ghost.active_powerup.is_some(),
            };
            merged[ghost_id] = self.ghost_ai.update(step_ms, ghost, &humans, context);
        }
        merged
    }

    /// Returns true if an activation moved "it".
    fn handle_abilities(&mut self, inputs: &InputFrame, step: u32) -> bool {
        let mut reassigned = false;
        for &id in &self.active {
            let pressed = inputs[id].ability();
            if pressed && !self.ability_latch[id] {
                let it = self.tags.it_player();
                let outcome = self.powerups.try_use(id, &mut self.players, it, Some(&*self.map));
                if let Some(powerup) = outcome.powerup() {
                    self.events.push(GameEvent::powerup_used(step, id, powerup));
                }

                let next = outcome.it_player(id, it);
                if next != it && self.tags.force_assign_it(next) {
                    reassigned = true;
                    debug!(from = %it, to = %next, "swap zap took it");
                    self.events.push(GameEvent::it_reassigned(step, it, next, ReassignReason::SwapZap));
                }
            }
            self.ability_latch[id] = pressed;
        }
        reassigned
    }
}

// =============================================================================
// TESTS
// =============================================================================
