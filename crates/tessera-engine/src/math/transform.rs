use core::ops::Mul;

use crate::coords::Vec2;

/// 2D affine transform in logical pixels.
///
/// Maps `p` to `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    #[inline]
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 }
    }

    #[inline]
    pub const fn translation(x: f32, y: f32) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: x, ty: y }
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self { a: sx, b: 0.0, c: 0.0, d: sy, tx: 0.0, ty: 0.0 }
    }

    /// Rotation by `radians`. Positive angles turn clockwise on screen (+Y down).
    #[inline]
    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self { a: c, b: s, c: -s, d: c, tx: 0.0, ty: 0.0 }
    }

    /// Returns `self` followed by `next`.
    #[inline]
    pub fn then(self, next: Transform2D) -> Self {
        next * self
    }

    #[inline]
    pub fn then_translate(self, x: f32, y: f32) -> Self {
        self.then(Self::translation(x, y))
    }

    #[inline]
    pub fn then_scale(self, sx: f32, sy: f32) -> Self {
        self.then(Self::scaling(sx, sy))
    }

    #[inline]
    pub fn then_rotate(self, radians: f32) -> Self {
        self.then(Self::rotation(radians))
    }

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }
}

impl Mul for Transform2D {
    type Output = Transform2D;

    /// `lhs * rhs` applies `rhs` first.
    #[inline]
    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }
}
