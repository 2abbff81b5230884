//! Small math helpers shared by the renderer and texture loaders.
//!
//! Angles are in radians unless a name says otherwise.

mod transform;

pub use transform::Transform2D;

pub const PI: f32 = core::f32::consts::PI;
/// Full turn (2π).
pub const PI_2: f32 = core::f32::consts::TAU;
pub const PI_HALF: f32 = core::f32::consts::FRAC_PI_2;

/// Multiply degrees by this to get radians.
pub const DEG_TO_RAD: f32 = PI / 180.0;
/// Multiply radians by this to get degrees.
pub const RAD_TO_DEG: f32 = 180.0 / PI;

/// Returns `true` if `x` has at most one bit set (`x & (x - 1) == 0`).
///
/// Used to check texture dimensions for hardware portability.
///
/// Boundary case: `is_power_of_two(0)` is `true`, because zero has no bits
/// set. Zero is not a meaningful texture dimension; callers must reject it
/// separately.
#[inline]
pub const fn is_power_of_two(x: u32) -> bool {
    x & x.wrapping_sub(1) == 0
}
