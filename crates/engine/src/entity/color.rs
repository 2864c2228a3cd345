//! Entity colors.

use rand::Rng;

/// RGB color used for cells, food and viruses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from hue (degrees), saturation and lightness (percent).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }

    /// A random hue at the given saturation and lightness.
    pub fn random_hue(rng: &mut impl Rng, saturation: f32, lightness: f32) -> Self {
        Self::from_hsl(rng.random_range(0.0..360.0), saturation, lightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(Color::from_hsl(0.0, 100.0, 50.0), Color::new(255, 0, 0));
        assert_eq!(Color::from_hsl(120.0, 100.0, 50.0), Color::new(0, 255, 0));
        assert_eq!(Color::from_hsl(240.0, 100.0, 50.0), Color::new(0, 0, 255));
    }

    #[test]
    fn test_grey() {
        let grey = Color::from_hsl(200.0, 0.0, 50.0);
        assert_eq!(grey.r, grey.g);
        assert_eq!(grey.g, grey.b);
    }
}
