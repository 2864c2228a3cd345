//! Virus.

use super::body::Body;
use super::color::Color;
use glam::Vec2;

/// Default virus color (green).
pub const VIRUS_COLOR: Color = Color::new(43, 223, 127);

/// A stationary virus that bursts cells sufficiently larger than itself.
#[derive(Debug, Clone)]
pub struct Virus {
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
}

impl Virus {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            radius,
            color: VIRUS_COLOR,
        }
    }

    /// Whether a cell of `cell_radius` is large enough to burst on this virus.
    #[inline]
    pub fn bursts(&self, cell_radius: f32, ratio: f32) -> bool {
        cell_radius > self.radius * ratio
    }
}

impl Body for Virus {
    #[inline]
    fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    fn radius(&self) -> f32 {
        self.radius
    }
}
