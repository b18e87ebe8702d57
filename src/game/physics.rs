//! Platformer Physics
//!
//! Fixed-step kinematic integration for one player against the tile grid.
//! Horizontal speed eases toward the input target, gravity is shaped for a
//! short-hop/long-hop jump, and movement is swept in small per-axis
//! sub-steps so nothing tunnels through a 16px tile.

use crate::game::input::PlayerInput;
use crate::game::map::MapData;
use crate::game::state::{Facing, PlayerEntity};

/// Gravity (px/s^2)
pub const GRAVITY: f64 = 1800.0;
/// Top horizontal speed (px/s)
pub const MOVE_SPEED: f64 = 172.0;
/// Jump launch speed (px/s)
pub const JUMP_SPEED: f64 = 520.0;
/// Horizontal acceleration on ground (px/s^2)
pub const GROUND_ACCELERATION: f64 = 1900.0;
/// Horizontal acceleration in air (px/s^2)
pub const AIR_ACCELERATION: f64 = 1060.0;
/// Horizontal deceleration on ground (px/s^2)
pub const GROUND_DECELERATION: f64 = 2300.0;
/// Horizontal deceleration in air (px/s^2)
pub const AIR_DECELERATION: f64 = 760.0;
/// Grace period after leaving ground (ms)
pub const COYOTE_TIME_MS: f64 = 110.0;
/// Early jump press memory (ms)
pub const JUMP_BUFFER_MS: f64 = 110.0;
/// Terminal fall speed (px/s)
pub const MAX_FALL_SPEED: f64 = 980.0;
/// Gravity scale while falling
pub const FALL_GRAVITY_MULTIPLIER: f64 = 1.15;
/// Gravity scale after jump release
pub const JUMP_CUT_GRAVITY_MULTIPLIER: f64 = 1.55;
/// Velocity damp after early jump release
pub const JUMP_RELEASE_DAMP: f64 = 0.9;
/// Largest per-axis sub-step (px)
pub const MAX_MOVE_STEP_PX: f64 = 2.0;

/// Advance one player by one fixed slice.
///
/// Order: horizontal easing and facing, jump timers, jump, gravity,
/// horizontal sweep, vertical sweep, ground probe.
pub fn step(entity: &mut PlayerEntity, input: &PlayerInput, map: &MapData, delta_ms: f64) {
    let dt = delta_ms / 1000.0;
    let horizontal = input.horizontal() as f64;

    // 1. Horizontal easing
    let speed_scale = entity.modifiers.speed_multiplier * entity.modifiers.slow_multiplier;
    let target_speed = horizontal * MOVE_SPEED * speed_scale;
    let (acceleration, deceleration) = if entity.on_ground {
        (GROUND_ACCELERATION, GROUND_DECELERATION)
    } else {
        (AIR_ACCELERATION, AIR_DECELERATION)
    };

    if horizontal != 0.0 {
        let accel_step = acceleration * dt;
        let speed_delta = target_speed - entity.velocity.x;
        if speed_delta.abs() <= accel_step {
            entity.velocity.x = target_speed;
        } else {
            entity.velocity.x += speed_delta.signum() * accel_step;
        }
        entity.facing = if horizontal < 0.0 { Facing::Left } else { Facing::Right };
    } else {
        let decel_step = deceleration * dt;
        if entity.velocity.x.abs() <= decel_step {
            entity.velocity.x = 0.0;
        } else {
            entity.velocity.x -= entity.velocity.x.signum() * decel_step;
        }
    }

    // 2. Coyote time and jump buffer
    entity.coyote_time_ms = (entity.coyote_time_ms - delta_ms).max(0.0);
    entity.jump_buffer_ms = (entity.jump_buffer_ms - delta_ms).max(0.0);
    if input.jump() && !entity.jump_held {
        entity.jump_buffer_ms = JUMP_BUFFER_MS;
    }
    entity.jump_held = input.jump();

    // 3. Jump
    let can_jump = entity.on_ground || entity.coyote_time_ms > 0.0;
    if entity.jump_buffer_ms > 0.0 && can_jump {
        entity.velocity.y = -JUMP_SPEED;
        entity.on_ground = false;
        entity.coyote_time_ms = 0.0;
        entity.jump_buffer_ms = 0.0;
    }

    // 4. Gravity
    let mut gravity_scale = entity.modifiers.gravity_multiplier * entity.modifiers.slow_multiplier;
    if entity.velocity.y > 0.0 {
        gravity_scale *= FALL_GRAVITY_MULTIPLIER;
    } else if !input.jump() {
        gravity_scale *= JUMP_CUT_GRAVITY_MULTIPLIER;
        if entity.velocity.y < -JUMP_SPEED * 0.35 {
            entity.velocity.y *= JUMP_RELEASE_DAMP;
        }
    }
    entity.velocity.y += GRAVITY * gravity_scale * dt;
    entity.velocity.y = entity.velocity.y.min(MAX_FALL_SPEED * entity.modifiers.slow_multiplier);

    // 5-6. Sweep each axis, horizontal first
    resolve_horizontal(entity, map, dt);
    resolve_vertical(entity, map, dt);

    // 7. Ground probe one pixel below the feet
    let grounded = entity.on_ground
        || collides(map, entity.position.x, entity.position.y + 1.0, entity.width, entity.height);
    entity.on_ground = grounded;
    if grounded {
        entity.coyote_time_ms = COYOTE_TIME_MS;
    }
}

/// Check a feet-anchored box against solid tiles.
///
/// The box covers pixels `[x - w/2, x + w/2 - 1] x [y - h, y - 1]`.
pub fn collides(map: &MapData, x: f64, y: f64, width: f64, height: f64) -> bool {
    let ts = map.tile_size();
    let half_width = width * 0.5;
    let left = ((x - half_width) / ts).floor() as i64;
    let right = ((x + half_width - 1.0) / ts).floor() as i64;
    let top = ((y - height) / ts).floor() as i64;
    let bottom = ((y - 1.0) / ts).floor() as i64;

    (top..=bottom).any(|ty| (left..=right).any(|tx| map.is_solid_tile(tx, ty)))
}

fn sub_steps(delta: f64) -> usize {
    ((delta.abs() / MAX_MOVE_STEP_PX).ceil() as usize).max(1)
}

fn resolve_horizontal(entity: &mut PlayerEntity, map: &MapData, dt: f64) {
    let delta_x = entity.velocity.x * dt;
    if delta_x != 0.0 {
        let steps = sub_steps(delta_x);
        let step = delta_x / steps as f64;
        for _ in 0..steps {
            let candidate = entity.position.x + step;
            if collides(map, candidate, entity.position.y, entity.width, entity.height) {
                entity.velocity.x = 0.0;
                break;
            }
            entity.position.x = candidate;
        }
    }

    let half_width = entity.width / 2.0;
    entity.position.x = entity.position.x.clamp(half_width, map.world_width() - half_width);
}

fn resolve_vertical(entity: &mut PlayerEntity, map: &MapData, dt: f64) {
    let delta_y = entity.velocity.y * dt;
    if delta_y != 0.0 {
        entity.on_ground = false;
        let steps = sub_steps(delta_y);
        let step = delta_y / steps as f64;
        for _ in 0..steps {
            let candidate = entity.position.y + step;
            if collides(map, entity.position.x, candidate, entity.width, entity.height) {
                if delta_y > 0.0 {
                    entity.on_ground = true;
                }
                entity.velocity.y = 0.0;
                break;
            }
            entity.position.y = candidate;
        }
    }

    entity.position.y = entity.position.y.clamp(entity.height, map.world_height() + entity.height);
}

// =============================================================================
// TESTS
// =============================================================================
