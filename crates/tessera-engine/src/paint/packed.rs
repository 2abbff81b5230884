use super::Color;

/// Layout of the packed vertex color word, most significant byte first.
///
/// R sits in the least significant byte and A in the most significant byte.
/// Vertex buffers store the word little-endian, so the bytes in memory are
/// R, G, B, A and a normalized `unorm8x4` attribute reads `vec4(r, g, b, a)`.
pub const PACKED_COLOR_ORDER: &str = "0xAABBGGRR";

/// Premultiplied RGBA packed into one 32-bit word (see [`PACKED_COLOR_ORDER`]).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct PackedColor(pub u32);

impl PackedColor {
    /// Premultiplies a straight-alpha color and packs it.
    #[inline]
    pub const fn pack(color: Color) -> Self {
        let [r, g, b, a] = color.premultiplied();
        Self::from_premul_bytes([r, g, b, a])
    }

    /// Packs already-premultiplied `[r, g, b, a]` bytes.
    #[inline]
    pub const fn from_premul_bytes(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba;
        Self((a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32)
    }

    /// Splits the word back into premultiplied `[r, g, b, a]`.
    #[inline]
    pub const fn unpack(self) -> [u8; 4] {
        let v = self.0;
        [v as u8, (v >> 8) as u8, (v >> 16) as u8, (v >> 24) as u8]
    }

    /// The value to store in a vertex field so the in-memory bytes are
    /// R, G, B, A on every host.
    #[inline]
    pub const fn to_vertex_word(self) -> u32 {
        self.0.to_le()
    }
}

impl From<Color> for PackedColor {
    #[inline]
    fn from(color: Color) -> Self {
        Self::pack(color)
    }
}
