//! Food pellet.

use super::body::{Body, clamp_to_world};
use super::color::Color;
use glam::Vec2;

/// Pellets slower than this stop drifting.
const REST_SPEED: f32 = 0.01;

/// A food pellet. Ejected pellets carry a decaying velocity.
#[derive(Debug, Clone)]
pub struct Food {
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
    pub velocity: Option<Vec2>,
}

impl Food {
    pub fn new(position: Vec2, radius: f32, color: Color) -> Self {
        Self {
            position,
            radius,
            color,
            velocity: None,
        }
    }

    /// A pellet launched with `velocity`.
    pub fn ejected(position: Vec2, radius: f32, color: Color, velocity: Vec2) -> Self {
        Self {
            velocity: Some(velocity),
            ..Self::new(position, radius, color)
        }
    }

    #[inline]
    pub fn is_drifting(&self) -> bool {
        self.velocity.is_some()
    }

    /// Move along the current velocity, then decay it.
    pub fn drift(&mut self, dt: f32, decay: f32, world_size: f32) {
        let Some(velocity) = self.velocity else {
            return;
        };
        self.position = clamp_to_world(self.position + velocity * dt, world_size);
        let next = velocity * decay;
        self.velocity = (next.length_squared() >= REST_SPEED * REST_SPEED).then_some(next);
    }
}

impl Body for Food {
    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    fn radius(&self) -> f32 {
        self.radius
    }
}
