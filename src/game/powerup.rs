//! Power-Up System
//!
//! Pickup spawning and claiming, timed effects, mines, decoys and the
//! activation behaviour of all 14 power-up types.
//!
//! ## Update order (per fixed step)
//!
//! 1. Age pickups
//! 2. Spawn on the 8 s timer (catch-up spawns for large deltas)
//! 3. Age timed effects
//! 4. Age and trigger mines
//! 5. Age decoys
//! 6. Tick use cooldowns
//! 7. Rebuild modifiers from live effects
//! 8. Resolve pickup claims

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::{DeterministicRng, RandomSource};
use crate::core::vec2::Vec2;
use crate::game::collision::{within_pickup_reach, within_radius};
use crate::game::events::GameEvent;
use crate::game::map::{MapData, TileCoord, WORLD_WIDTH};
use crate::game::state::{PlayerEntity, PlayerId, PlayerSlots, PowerupType};

/// Pickup lifetime (ms).
pub const PICKUP_TTL_MS: f64 = 30_000.0;
/// Interval between pickup spawns (ms).
pub const PICKUP_SPAWN_INTERVAL_MS: f64 = 8_000.0;
/// Concurrent pickup cap.
pub const MAX_PICKUPS: usize = 3;
/// Pickups float this far above their spawn tile's top edge (pixels).
pub const PICKUP_HOVER_PX: f64 = 8.0;

/// Mine trigger radius (pixels).
pub const MINE_RADIUS: f64 = 24.0;
/// Mine lifetime (ms).
pub const MINE_TTL_MS: f64 = 6_000.0;
/// Slow applied to a mine victim (ms).
pub const MINE_DEBUFF_MS: f64 = 1_000.0;
/// Decoy lifetime (ms).
pub const DECOY_TTL_MS: f64 = 5_000.0;
/// Decoy offset along facing (pixels).
pub const DECOY_OFFSET_PX: f64 = 20.0;

/// Blink Step distance (pixels).
pub const BLINK_DISTANCE_PX: f64 = 64.0;
/// Warp Gate hop distance without a map (pixels).
pub const WARP_FALLBACK_HOP_PX: f64 = 120.0;
/// Teleports keep this far from the world's side edges (pixels).
pub const EDGE_MARGIN_PX: f64 = 8.0;
/// Bounce Burst minimum upward speed.
pub const BOUNCE_LAUNCH_SPEED: f64 = 760.0;
/// Bounce Burst forward kick.
pub const BOUNCE_FORWARD_KICK: f64 = 85.0;
/// Rocket Hop upward speed.
pub const ROCKET_LAUNCH_SPEED: f64 = 700.0;

/// Hyper Dash speed multiplier.
pub const HYPER_DASH_SPEED: f64 = 1.8;
/// Low Grav gravity multiplier.
pub const LOW_GRAV_GRAVITY: f64 = 0.6;
/// Time Crush slow multiplier.
pub const TIME_CRUSH_SLOW: f64 = 0.75;

// =============================================================================
// ENTITIES
// =============================================================================

/// A power-up lying on the field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Unique within the session
    pub id: u32,
    /// Granted type
    pub powerup: PowerupType,
    /// Center position
    pub position: Vec2,
    /// Remaining lifetime (ms)
    pub ttl_ms: f64,
}

/// Kind of a timed effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Owner speed x1.8
    HyperDash,
    /// Owner untaggable
    TagShield,
    /// Owner untaggable
    PhaseCloak,
    /// Owner passive score bonus
    ScoreSurge,
    /// Owner gravity x0.6
    LowGrav,
    /// Every other player slowed x0.75
    TimeCrush,
    /// Owner slowed x0.75 (mine hit)
    TimeCrushDebuff,
}

/// A live timed effect. At most one per (owner, kind).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectState {
    /// Player the effect belongs to
    pub owner: PlayerId,
    /// What it does
    pub kind: EffectKind,
    /// Remaining duration (ms)
    pub remaining_ms: f64,
}

/// An armed ice mine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mine {
    /// Player who dropped it (immune)
    pub owner: PlayerId,
    /// Center position
    pub position: Vec2,
    /// Trigger radius
    pub radius: f64,
    /// Remaining lifetime (ms)
    pub ttl_ms: f64,
}

/// A cosmetic decoy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoy {
    /// Player who dropped it
    pub owner: PlayerId,
    /// Feet position
    pub position: Vec2,
    /// Remaining lifetime (ms)
    pub ttl_ms: f64,
}

// =============================================================================
// ACTIVATION
// =============================================================================

/// What a power-up does when used, one variant per behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Upsert a timed effect on the caster
    Timed(EffectKind),
    /// Teleport along facing
    Blink,
    /// Launch up and forward
    Bounce,
    /// Teleport to a spawn tile
    Warp,
    /// Drop a mine at the caster's feet
    DropMine,
    /// Trade places with "it" and take "it"
    Swap,
    /// Drop a decoy ahead of the caster
    Decoy,
    /// Vertical launch
    Rocket,
    /// Strip everyone else's effects
    Emp,
}

impl Activation {
    /// Behaviour of `powerup`.
    pub const fn of(powerup: PowerupType) -> Self {
        match powerup {
            PowerupType::HyperDash => Activation::Timed(EffectKind::HyperDash),
            PowerupType::TagShield => Activation::Timed(EffectKind::TagShield),
            PowerupType::PhaseCloak => Activation::Timed(EffectKind::PhaseCloak),
            PowerupType::ScoreSurge => Activation::Timed(EffectKind::ScoreSurge),
            PowerupType::LowGrav => Activation::Timed(EffectKind::LowGrav),
            PowerupType::TimeCrush => Activation::Timed(EffectKind::TimeCrush),
            PowerupType::BlinkStep => Activation::Blink,
            PowerupType::BounceBurst => Activation::Bounce,
            PowerupType::WarpGate => Activation::Warp,
            PowerupType::IceMine => Activation::DropMine,
            PowerupType::SwapZap => Activation::Swap,
            PowerupType::DecoyClone => Activation::Decoy,
            PowerupType::RocketHop => Activation::Rocket,
            PowerupType::EmpBurst => Activation::Emp,
        }
    }
}

/// Result of trying to use a held power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Nothing held, or still cooling down
    Unavailable,
    /// Consumed; "it" unchanged
    Used(PowerupType),
    /// Consumed and the caster now holds "it"
    TookIt(PowerupType),
}

impl ActivationOutcome {
    /// "It" after the activation, given the holder before it.
    pub fn it_player(self, caster: PlayerId, current_it: PlayerId) -> PlayerId {
        match self {
            ActivationOutcome::TookIt(_) => caster,
            ActivationOutcome::Used(_) | ActivationOutcome::Unavailable => current_it,
        }
    }

    /// Consumed power-up, if any.
    pub fn powerup(self) -> Option<PowerupType> {
        match self {
            ActivationOutcome::Used(p) | ActivationOutcome::TookIt(p) => Some(p),
            ActivationOutcome::Unavailable => None,
        }
    }
}

// =============================================================================
// SYSTEM
// =============================================================================

/// Owns every ephemeral power-up entity for the current round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerupSystem<R = DeterministicRng> {
    rng: R,
    spawn_timer_ms: f64,
    next_pickup_id: u32,
    pickups: Vec<Pickup>,
    effects: Vec<EffectState>,
    mines: Vec<Mine>,
    decoys: Vec<Decoy>,
}

impl PowerupSystem<DeterministicRng> {
    /// Seeded with the default generator.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(DeterministicRng::new(seed))
    }
}

impl<R: RandomSource> PowerupSystem<R> {
    /// Use a specific random source.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            spawn_timer_ms: 0.0,
            next_pickup_id: 1,
            pickups: Vec::new(),
            effects: Vec::new(),
            mines: Vec::new(),
            decoys: Vec::new(),
        }
    }

    /// Pickups currently on the field.
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Live timed effects.
    pub fn effects(&self) -> &[EffectState] {
        &self.effects
    }

    /// Armed mines.
    pub fn mines(&self) -> &[Mine] {
        &self.mines
    }

    /// Live decoys.
    pub fn decoys(&self) -> &[Decoy] {
        &self.decoys
    }

    /// Advance one slice. Returns spawn, claim and mine events.
    ///
    /// Only `active` players can claim pickups or trigger mines.
    pub fn update(
        &mut self,
        delta_ms: f64,
        players: &mut PlayerSlots<PlayerEntity>,
        active: &[PlayerId],
        map: &MapData,
        step: u32,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.pickups.retain_mut(|pickup| {
            pickup.ttl_ms -= delta_ms;
            pickup.ttl_ms > 0.0
        });

        self.spawn_timer_ms += delta_ms;
        while self.spawn_timer_ms >= PICKUP_SPAWN_INTERVAL_MS {
            self.spawn_timer_ms -= PICKUP_SPAWN_INTERVAL_MS;
            if let Some(pickup) = self.spawn_pickup(map) {
                events.push(GameEvent::pickup_spawned(step, pickup.id, pickup.powerup, pickup.position));
            }
        }

        self.effects.retain_mut(|effect| {
            effect.remaining_ms -= delta_ms;
            effect.remaining_ms > 0.0
        });

        self.update_mines(delta_ms, players, active, step, &mut events);

        self.decoys.retain_mut(|decoy| {
            decoy.ttl_ms -= delta_ms;
            decoy.ttl_ms > 0.0
        });

        for player in players.values_mut() {
            player.powerup_cooldown_ms = (player.powerup_cooldown_ms - delta_ms).max(0.0);
        }

        self.apply_effects(players);
        self.claim_pickups(players, active, step, &mut events);

        events
    }

    /// Use `caster`'s held power-up.
    ///
    /// `map` supplies Warp Gate destinations; without it Warp Gate hops
    /// forward instead. Only Swap Zap can move "it".
    pub fn try_use(
        &mut self,
        caster: PlayerId,
        players: &mut PlayerSlots<PlayerEntity>,
        current_it: PlayerId,
        map: Option<&MapData>,
    ) -> ActivationOutcome {
        let player = &mut players[caster];
        let powerup = match player.active_powerup {
            Some(p) if player.powerup_cooldown_ms <= 0.0 => p,
            _ => return ActivationOutcome::Unavailable,
        };

        player.active_powerup = None;
        player.powerup_cooldown_ms = powerup.use_cooldown_ms();
        debug!(player = %caster, powerup = powerup.name(), "power-up used");

        match Activation::of(powerup) {
            Activation::Timed(kind) => {
                let duration = powerup.effect_duration_ms().unwrap_or_default();
                self.upsert_effect(caster, kind, duration);
            }
            Activation::Blink => {
                let x = player.position.x + player.facing.sign() * BLINK_DISTANCE_PX;
                player.position.x = clamp_to_world(x);
            }
            Activation::Bounce => {
                player.velocity.y = player.velocity.y.min(-BOUNCE_LAUNCH_SPEED);
                player.velocity.x += player.facing.sign() * BOUNCE_FORWARD_KICK;
            }
            Activation::Warp => match map.filter(|m| !m.spawn_tiles().is_empty()) {
                Some(map) => {
                    let tile = map.spawn_tiles()[self.rng.next_index(map.spawn_tiles().len())];
                    player.position = pickup_position(map, tile);
                    player.velocity = Vec2::ZERO;
                }
                None => {
                    let x = player.position.x + player.facing.sign() * WARP_FALLBACK_HOP_PX;
                    player.position.x = clamp_to_world(x);
                }
            },
            Activation::DropMine => {
                self.mines.push(Mine {
                    owner: caster,
                    position: player.position,
                    radius: MINE_RADIUS,
                    ttl_ms: MINE_TTL_MS,
                });
            }
            Activation::Swap => {
                if let Some((me, it)) = players.pair_mut(caster, current_it) {
                    std::mem::swap(&mut me.position, &mut it.position);
                }
                return ActivationOutcome::TookIt(powerup);
            }
            Activation::Decoy => {
                self.decoys.push(Decoy {
                    owner: caster,
                    position: Vec2::new(
                        player.position.x + player.facing.sign() * DECOY_OFFSET_PX,
                        player.position.y,
                    ),
                    ttl_ms: DECOY_TTL_MS,
                });
            }
            Activation::Rocket => {
                player.velocity.y = -ROCKET_LAUNCH_SPEED;
            }
            Activation::Emp => {
                self.effects.retain(|effect| effect.owner == caster);
            }
        }

        ActivationOutcome::Used(powerup)
    }

    /// Drop every pickup, effect, mine and decoy and neutralize players.
    pub fn clear_round(&mut self, players: &mut PlayerSlots<PlayerEntity>) {
        self.spawn_timer_ms = 0.0;
        self.pickups.clear();
        self.effects.clear();
        self.mines.clear();
        self.decoys.clear();

        for player in players.values_mut() {
            player.active_powerup = None;
            player.powerup_cooldown_ms = 0.0;
            player.modifiers.reset();
        }
    }

    fn spawn_pickup(&mut self, map: &MapData) -> Option<Pickup> {
        if self.pickups.len() >= MAX_PICKUPS || map.spawn_tiles().is_empty() {
            return None;
        }

        let tile = map.spawn_tiles()[self.rng.next_index(map.spawn_tiles().len())];
        let pickup = Pickup {
            id: self.next_pickup_id,
            powerup: self.roll_spawn_type(),
            position: pickup_position(map, tile),
            ttl_ms: PICKUP_TTL_MS,
        };
        self.next_pickup_id += 1;
        debug!(id = pickup.id, powerup = pickup.powerup.name(), "pickup spawned");
        self.pickups.push(pickup.clone());
        Some(pickup)
    }

    /// Weighted roll over types not already on the field.
    fn roll_spawn_type(&mut self) -> PowerupType {
        let candidates: Vec<PowerupType> = PowerupType::ALL
            .into_iter()
            .filter(|p| !self.pickups.iter().any(|pickup| pickup.powerup == *p))
            .collect();

        if candidates.is_empty() {
            return PowerupType::ALL[self.rng.next_index(PowerupType::ALL.len())];
        }

        let total: f64 = candidates.iter().map(|p| p.spawn_weight()).sum();
        let mut roll = self.rng.next_f64() * total;
        for &candidate in &candidates {
            roll -= candidate.spawn_weight();
            if roll <= 0.0 {
                return candidate;
            }
        }
        candidates[candidates.len() - 1]
    }

    fn upsert_effect(&mut self, owner: PlayerId, kind: EffectKind, remaining_ms: f64) {
        match self.effects.iter_mut().find(|e| e.owner == owner && e.kind == kind) {
            Some(effect) => effect.remaining_ms = remaining_ms,
            None => self.effects.push(EffectState { owner, kind, remaining_ms }),
        }
    }

    fn update_mines(
        &mut self,
        delta_ms: f64,
        players: &PlayerSlots<PlayerEntity>,
        active: &[PlayerId],
        step: u32,
        events: &mut Vec<GameEvent>,
    ) {
        let mut hits = Vec::new();
        self.mines.retain_mut(|mine| {
            mine.ttl_ms -= delta_ms;
            if mine.ttl_ms <= 0.0 {
                return false;
            }

            let victim = PlayerId::ALL.into_iter().find(|&id| {
                id != mine.owner
                    && active.contains(&id)
                    && within_radius(players[id].position, mine.position, mine.radius)
            });
            match victim {
                Some(victim) => {
                    hits.push((mine.owner, victim));
                    false
                }
                None => true,
            }
        });

        for (owner, victim) in hits {
            debug!(owner = %owner, victim = %victim, "mine triggered");
            self.upsert_effect(victim, EffectKind::TimeCrushDebuff, MINE_DEBUFF_MS);
            events.push(GameEvent::mine_triggered(step, owner, victim));
        }
    }

    fn apply_effects(&self, players: &mut PlayerSlots<PlayerEntity>) {
        for player in players.values_mut() {
            player.modifiers.reset();
        }

        for effect in &self.effects {
            let owner = &mut players[effect.owner].modifiers;
            match effect.kind {
                EffectKind::HyperDash => owner.speed_multiplier *= HYPER_DASH_SPEED,
                EffectKind::TagShield => owner.shielded = true,
                EffectKind::PhaseCloak => owner.phased = true,
                EffectKind::ScoreSurge => owner.score_surge = true,
                EffectKind::LowGrav => owner.gravity_multiplier *= LOW_GRAV_GRAVITY,
                EffectKind::TimeCrushDebuff => owner.slow_multiplier *= TIME_CRUSH_SLOW,
                EffectKind::TimeCrush => {
                    for (id, player) in players.iter_mut() {
                        if id != effect.owner {
                            player.modifiers.slow_multiplier *= TIME_CRUSH_SLOW;
                        }
                    }
                }
            }
        }
    }

    /// Newest pickups are resolved first; each goes to the first eligible
    /// player in id order.
    fn claim_pickups(
        &mut self,
        players: &mut PlayerSlots<PlayerEntity>,
        active: &[PlayerId],
        step: u32,
        events: &mut Vec<GameEvent>,
    ) {
        let mut index = self.pickups.len();
        while index > 0 {
            index -= 1;
            let pickup = &self.pickups[index];
            let claimant = PlayerId::ALL.into_iter().find(|&id| {
                active.contains(&id)
                    && players[id].active_powerup.is_none()
                    && within_pickup_reach(players[id].position, pickup.position)
            });

            if let Some(id) = claimant {
                let pickup = self.pickups.remove(index);
                players[id].active_powerup = Some(pickup.powerup);
                debug!(player = %id, powerup = pickup.powerup.name(), "pickup claimed");
                events.push(GameEvent::pickup_claimed(step, id, pickup.id, pickup.powerup));
            }
        }
    }
}

/// Pickup (and Warp Gate) anchor above a spawn tile.
fn pickup_position(map: &MapData, tile: TileCoord) -> Vec2 {
    let ts = map.tile_size();
    Vec2::new(tile.x as f64 * ts + ts / 2.0, tile.y as f64 * ts - PICKUP_HOVER_PX)
}

fn clamp_to_world(x: f64) -> f64 {
    x.clamp(EDGE_MARGIN_PX, WORLD_WIDTH as f64 - EDGE_MARGIN_PX)
}

// =============================================================================
// TESTS
// =============================================================================
