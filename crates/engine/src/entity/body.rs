//! Shared capability of every circular entity.

use glam::Vec2;
use std::f32::consts::PI;

/// A circle in world space. Radius is the canonical size; mass is derived.
pub trait Body {
    fn position(&self) -> Vec2;

    fn radius(&self) -> f32;

    /// Derived mass, `π·r²`.
    #[inline]
    fn mass(&self) -> f32 {
        mass_of(self.radius())
    }

    /// Squared distance between the two centers.
    #[inline]
    fn distance_squared(&self, other: &impl Body) -> f32 {
        self.position().distance_squared(other.position())
    }

    /// Whether the two circles touch or overlap.
    #[inline]
    fn overlaps(&self, other: &impl Body) -> bool {
        let reach = self.radius() + other.radius();
        self.distance_squared(other) <= reach * reach
    }
}

/// Mass of a circle of radius `r`.
#[inline]
pub fn mass_of(radius: f32) -> f32 {
    PI * radius * radius
}

/// Radius after a body of radius `eater` absorbs one of radius `eaten`,
/// keeping `factor` of the eaten body's squared radius.
///
/// `factor` must be at most 1, so `result² <= eater² + eaten²`.
#[inline]
pub fn absorbed_radius(eater: f32, eaten: f32, factor: f32) -> f32 {
    (eater * eater + eaten * eaten * factor).sqrt()
}

/// Clamp a point into the square `[0, size]²`.
#[inline]
pub fn clamp_to_world(position: Vec2, size: f32) -> Vec2 {
    position.clamp(Vec2::ZERO, Vec2::splat(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Disc(Vec2, f32);

    impl Body for Disc {
        fn position(&self) -> Vec2 {
            self.0
        }
        fn radius(&self) -> f32 {
            self.1
        }
    }

    #[test]
    fn test_mass_is_derived_from_radius() {
        let disc = Disc(Vec2::ZERO, 10.0);
        assert!((disc.mass() - 100.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_absorb_food_scenario() {
        let r = absorbed_radius(20.0, 5.0, 0.8);
        assert!((r - 420.0_f32.sqrt()).abs() < 1e-4);
        assert!((r - 20.49).abs() < 0.01);
    }

    #[test]
    fn test_absorb_never_inflates() {
        for &(a, b, f) in &[(20.0, 5.0, 0.8), (50.0, 44.0, 0.92), (30.0, 30.0, 1.0)] {
            let c = absorbed_radius(a, b, f);
            assert!(c * c <= a * a + b * b + 1e-3);
        }
    }

    #[test]
    fn test_overlap_touching_counts() {
        let a = Disc(Vec2::new(0.0, 0.0), 10.0);
        let b = Disc(Vec2::new(15.0, 0.0), 5.0);
        let c = Disc(Vec2::new(16.0, 0.0), 5.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_clamp_to_world() {
        let p = clamp_to_world(Vec2::new(-4.0, 9000.0), 8000.0);
        assert_eq!(p, Vec2::new(0.0, 8000.0));
    }
}
