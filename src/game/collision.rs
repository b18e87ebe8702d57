//! Collision Detection
//!
//! Axis-aligned overlap tests between player hitboxes, pickups and mines.

use crate::core::vec2::Vec2;
use crate::game::state::PlayerEntity;

/// Half-extent of the pickup claim box on X (pixels).
pub const PICKUP_REACH_X: f64 = 14.0;

/// Half-extent of the pickup claim box on Y (pixels).
pub const PICKUP_REACH_Y: f64 = 20.0;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Left edge
    pub left: f64,
    /// Right edge
    pub right: f64,
    /// Top edge
    pub top: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl Aabb {
    /// Box of a feet-center anchored entity.
    #[inline]
    pub fn from_feet(position: Vec2, width: f64, height: f64) -> Self {
        Self {
            left: position.x - width / 2.0,
            right: position.x + width / 2.0,
            top: position.y - height,
            bottom: position.y,
        }
    }

    /// Strict overlap: touching edges do not count.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

/// Player hitbox.
#[inline]
pub fn hitbox(player: &PlayerEntity) -> Aabb {
    Aabb::from_feet(player.position, player.width, player.height)
}

/// Check if two players' hitboxes overlap.
#[inline]
pub fn players_overlap(a: &PlayerEntity, b: &PlayerEntity) -> bool {
    hitbox(a).overlaps(&hitbox(b))
}

/// Check if a player is close enough to claim a pickup.
#[inline]
pub fn within_pickup_reach(player: Vec2, pickup: Vec2) -> bool {
    (player.x - pickup.x).abs() <= PICKUP_REACH_X && (player.y - pickup.y).abs() <= PICKUP_REACH_Y
}

/// Check if a point lies within `radius` of `center` (inclusive).
#[inline]
pub fn within_radius(point: Vec2, center: Vec2, radius: f64) -> bool {
    point.distance_squared(center) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerId;

    fn player_at(x: f64, y: f64) -> PlayerEntity {
        let mut p = PlayerEntity::new(PlayerId::ALL[0]);
        p.position = Vec2::new(x, y);
        p
    }

    #[test]
    fn test_players_overlap() {
        assert!(players_overlap(&player_at(100.0, 100.0), &player_at(102.0, 100.0)));
        assert!(players_overlap(&player_at(100.0, 100.0), &player_at(111.9, 119.9)));
        assert!(!players_overlap(&player_at(100.0, 100.0), &player_at(140.0, 100.0)));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        // Width 12: right edge of a at 106, left edge of b at 106
        assert!(!players_overlap(&player_at(100.0, 100.0), &player_at(112.0, 100.0)));
        // Height 20: feet of a at 100, head of b at 100
        assert!(!players_overlap(&player_at(100.0, 100.0), &player_at(100.0, 120.0)));
    }

    #[test]
    fn test_pickup_reach() {
        let pickup = Vec2::new(56.0, 248.0);
        assert!(within_pickup_reach(Vec2::new(56.0, 256.0), pickup));
        assert!(within_pickup_reach(Vec2::new(70.0, 268.0), pickup));
        assert!(!within_pickup_reach(Vec2::new(70.1, 256.0), pickup));
        assert!(!within_pickup_reach(Vec2::new(56.0, 268.1), pickup));
    }

    #[test]
    fn test_within_radius() {
        let center = Vec2::new(0.0, 0.0);
        assert!(within_radius(Vec2::new(24.0, 0.0), center, 24.0));
        assert!(!within_radius(Vec2::new(17.0, 17.0), center, 24.0));
    }
}
