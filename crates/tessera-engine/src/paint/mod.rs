//! Color model shared between callers and the renderer.
//!
//! Scope:
//! - straight-alpha 8-bit input colors
//! - premultiply-and-pack into the 32-bit vertex color word
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod packed;

pub use color::Color;
pub use packed::{PackedColor, PACKED_COLOR_ORDER};
