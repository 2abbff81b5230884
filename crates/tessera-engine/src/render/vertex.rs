use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::PackedColor;

/// Vertex record of the `primitive` program: position + packed color (12 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PrimitiveVertex {
    pub position: [f32; 2],
    /// Premultiplied color in vertex byte order, see [`PackedColor::to_vertex_word`].
    pub color: u32,
}

impl PrimitiveVertex {
    #[inline]
    pub fn new(position: Vec2, color: PackedColor) -> Self {
        Self {
            position: [position.x, position.y],
            color: color.to_vertex_word(),
        }
    }
}

/// Vertex record of the `sprite` and `sprites` programs:
/// position + texture coordinate + packed color (20 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: u32,
}

impl SpriteVertex {
    #[inline]
    pub fn new(position: Vec2, uv: Vec2, color: PackedColor) -> Self {
        Self {
            position: [position.x, position.y],
            uv: [uv.x, uv.y],
            color: color.to_vertex_word(),
        }
    }
}
