//! Player cell.

use super::body::Body;
use super::color::Color;
use super::player::PlayerId;
use crate::config::PhysicsConfig;
use glam::Vec2;
use std::time::Duration;

/// A mass-bearing cell controlled by a player.
#[derive(Debug, Clone)]
pub struct PlayerCell {
    pub owner: PlayerId,
    pub position: Vec2,
    radius: f32,
    pub velocity: Vec2,
    pub color: Color,
    /// Earliest clock time at which this cell may merge with a sibling.
    pub merge_at: Duration,
    /// Steering for the current tick, length at most 1.
    pub intent: Vec2,
    /// Marked during collision resolution, filtered out in cleanup.
    pub is_removed: bool,
}

impl PlayerCell {
    pub fn new(owner: PlayerId, position: Vec2, radius: f32, color: Color, merge_at: Duration) -> Self {
        Self {
            owner,
            position,
            radius,
            velocity: Vec2::ZERO,
            color,
            merge_at,
            intent: Vec2::ZERO,
            is_removed: false,
        }
    }

    /// Set the radius; mass follows from it.
    #[inline]
    pub fn set_radius(&mut self, radius: f32) {
        debug_assert!(radius.is_finite() && radius >= 0.0);
        self.radius = radius;
    }

    /// Whether the merge cooldown of this cell has expired at `now`.
    #[inline]
    pub fn can_merge(&self, now: Duration) -> bool {
        now >= self.merge_at
    }

    /// Speed cap, `clamp(K / sqrt(r), min, max)`. Larger cells are slower.
    #[inline]
    pub fn max_speed(&self, physics: &PhysicsConfig) -> f32 {
        (physics.speed_constant / self.radius.sqrt()).clamp(physics.speed_min, physics.speed_max)
    }

    /// Per-tick velocity retention. Larger cells lose momentum faster.
    #[inline]
    pub fn drag(&self, physics: &PhysicsConfig) -> f32 {
        (physics.base_drag - (self.radius / physics.drag_scale) * physics.drag_factor)
            .clamp(physics.drag_min, physics.drag_max)
    }
}

impl Body for PlayerCell {
    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    fn radius(&self) -> f32 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(radius: f32) -> PlayerCell {
        PlayerCell::new(PlayerId(1), Vec2::ZERO, radius, Color::default(), Duration::ZERO)
    }

    #[test]
    fn test_speed_decreases_with_radius() {
        let physics = PhysicsConfig::default();
        let small = cell(10.0).max_speed(&physics);
        let medium = cell(35.0).max_speed(&physics);
        let large = cell(400.0).max_speed(&physics);

        assert!(small >= medium);
        assert!(medium > large);
        assert!((small - 140.0 / 10.0_f32.sqrt()).abs() < 1e-3);
        assert_eq!(large, physics.speed_min);
    }

    #[test]
    fn test_drag_clamped() {
        let physics = PhysicsConfig::default();
        assert!((cell(30.0).drag(&physics) - 0.845).abs() < 1e-4);
        assert_eq!(cell(5000.0).drag(&physics), physics.drag_min);
    }

    #[test]
    fn test_merge_cooldown_inclusive() {
        let mut c = cell(20.0);
        c.merge_at = Duration::from_millis(6000);
        assert!(!c.can_merge(Duration::from_millis(5999)));
        assert!(c.can_merge(Duration::from_millis(6000)));
    }
}
