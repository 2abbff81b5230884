use crate::coords::Vec2;
use crate::shader::UniformValue;

/// Screen-to-clip-space mapping shared by every program.
///
/// Vertex shaders compute `clip = position / uProjection + vec2(-1.0, 1.0)`
/// with `uProjection = (half_width, -half_height)`, so pixel `(0, 0)` maps to
/// `(-1, 1)` and `(width, height)` to `(1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    half_width: f32,
    half_height: f32,
}

impl Projection {
    pub fn new(width: f32, height: f32) -> Self {
        let mut p = Self { half_width: 0.5, half_height: 0.5 };
        p.update(width, height);
        p
    }

    /// Recomputes the half extents. Sizes below 1 are clamped to 1.
    ///
    /// Returns `true` if the projection changed.
    pub fn update(&mut self, width: f32, height: f32) -> bool {
        let clamp = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
        let next = Self {
            half_width: clamp(width) / 2.0,
            half_height: clamp(height) / 2.0,
        };
        let changed = next != *self;
        *self = next;
        changed
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Target size in logical pixels.
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.half_width * 2.0, self.half_height * 2.0)
    }

    /// Value of the `uProjection` uniform.
    #[inline]
    pub fn uniform(&self) -> UniformValue {
        UniformValue::Vec2([self.half_width, -self.half_height])
    }

    /// CPU version of the vertex shader mapping.
    #[inline]
    pub fn to_clip(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x / self.half_width - 1.0,
            position.y / -self.half_height + 1.0,
        )
    }
}
