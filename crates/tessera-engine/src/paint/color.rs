/// Straight-alpha 8-bit RGBA color.
///
/// This is the form every color takes when it enters the renderer. The
/// premultiply-and-pack step happens exactly once, when geometry is appended
/// to a batch (see [`PackedColor`](super::PackedColor)).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parses `0xRRGGBBAA`.
    #[inline]
    pub const fn from_hex(rgba: u32) -> Self {
        let [r, g, b, a] = rgba.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Same color with alpha replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Returns `[r·a, g·a, b·a, a]`, each channel rounded to the nearest byte.
    #[inline]
    pub const fn premultiplied(self) -> [u8; 4] {
        [
            mul_div_255(self.r, self.a),
            mul_div_255(self.g, self.a),
            mul_div_255(self.b, self.a),
            self.a,
        ]
    }

    /// Converts to the `[0, 1]` float form wgpu uses for clear colors.
    #[inline]
    pub fn to_wgpu_premul(self) -> wgpu::Color {
        let [r, g, b, a] = self.premultiplied();
        wgpu::Color {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }
}

/// `round(c * a / 255)` in integer arithmetic.
#[inline]
const fn mul_div_255(c: u8, a: u8) -> u8 {
    ((c as u16 * a as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_is_unchanged() {
        assert_eq!(Color::rgb(12, 200, 255).premultiplied(), [12, 200, 255, 255]);
    }

    #[test]
    fn transparent_zeroes_rgb() {
        assert_eq!(Color::rgba(255, 128, 7, 0).premultiplied(), [0, 0, 0, 0]);
    }

    #[test]
    fn half_alpha_rounds_to_nearest() {
        // 255 * 128 / 255 = 128, 100 * 128 / 255 = 50.19.., 3 * 128 / 255 = 1.50..
        assert_eq!(Color::rgba(255, 100, 3, 128).premultiplied(), [128, 50, 2, 128]);
    }

    #[test]
    fn premultiply_matches_float_rounding_everywhere() {
        for a in 0..=255u8 {
            for c in (0..=255u8).step_by(5) {
                let got = Color::rgba(c, c, c, a).premultiplied()[0];
                let want = (c as f32 * a as f32 / 255.0).round() as i32;
                assert!((got as i32 - want).abs() <= 1, "c={c} a={a} got={got} want={want}");
            }
        }
    }

    #[test]
    fn from_hex_reads_rgba_order() {
        assert_eq!(Color::from_hex(0x11223344), Color::rgba(0x11, 0x22, 0x33, 0x44));
    }
}
