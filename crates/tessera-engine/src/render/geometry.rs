//! CPU tessellation into the vertex records of the shader family.
//!
//! All coordinates are logical pixels. Colors arrive already packed so every
//! vertex of a command carries the same premultiplied word.

use crate::coords::{Rect, Vec2};
use crate::error::RenderError;
use crate::gpu::Texture;
use crate::math::{Transform2D, PI_2};
use crate::paint::PackedColor;

use super::batch::MAX_INDEXABLE_VERTICES;
use super::vertex::{PrimitiveVertex, SpriteVertex};

/// Indexed triangle list for one draw command.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u16>,
}

impl<V> Mesh<V> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl<V> Default for Mesh<V> {
    fn default() -> Self {
        Self { vertices: Vec::new(), indices: Vec::new() }
    }
}

/// Index pattern of one quad whose corners are listed clockwise from top-left.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Fills a convex outline with a triangle fan around the first point.
///
/// Fewer than three points produce an empty mesh. More points than one draw
/// can index fail with [`RenderError::GeometryTooLarge`].
pub fn fill_polygon(points: &[Vec2], color: PackedColor) -> Result<Mesh<PrimitiveVertex>, RenderError> {
    if points.len() < 3 {
        return Ok(Mesh::default());
    }
    check_indexable(points.len())?;

    let vertices = points.iter().map(|&p| PrimitiveVertex::new(p, color)).collect();
    // i + 1 < points.len() <= 65536, so both fit in u16.
    let indices = (1..points.len() - 1)
        .flat_map(|i| [0, i as u16, (i + 1) as u16])
        .collect();

    Ok(Mesh { vertices, indices })
}

/// Strokes an outline with one quad per edge, extruded `thickness / 2` to
/// each side of the edge.
///
/// Zero-length edges are skipped. Joints are not mitred. An outline with
/// more edges than one draw can index fails with
/// [`RenderError::GeometryTooLarge`].
pub fn stroke_polygon(
    points: &[Vec2],
    thickness: f32,
    closed: bool,
    color: PackedColor,
) -> Result<Mesh<PrimitiveVertex>, RenderError> {
    let mut mesh = Mesh::default();
    if points.len() < 2 || thickness <= 0.0 {
        return Ok(mesh);
    }

    let half = thickness * 0.5;
    let edge_count = if closed && points.len() > 2 { points.len() } else { points.len() - 1 };
    check_indexable(edge_count * 4)?;

    for i in 0..edge_count {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let Some(dir) = (b - a).normalized() else { continue };
        let n = dir.perp() * half;

        let base = mesh.vertices.len() as u16;
        mesh.vertices.extend([
            PrimitiveVertex::new(a + n, color),
            PrimitiveVertex::new(b + n, color),
            PrimitiveVertex::new(b - n, color),
            PrimitiveVertex::new(a - n, color),
        ]);
        mesh.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    Ok(mesh)
}

fn check_indexable(vertices: usize) -> Result<(), RenderError> {
    if vertices > MAX_INDEXABLE_VERTICES {
        return Err(RenderError::GeometryTooLarge { vertices, max: MAX_INDEXABLE_VERTICES });
    }
    Ok(())
}

/// Corner points of `rect`, clockwise from top-left.
pub fn rect_outline(rect: Rect) -> [Vec2; 4] {
    let min = rect.min();
    let max = rect.max();
    [
        min,
        Vec2::new(max.x, min.y),
        max,
        Vec2::new(min.x, max.y),
    ]
}

/// Points on a circle, clockwise on screen starting at angle zero.
///
/// `segments` is clamped to at least 3.
pub fn circle_outline(center: Vec2, radius: f32, segments: u32) -> Vec<Vec2> {
    let segments = segments.max(3);
    let step = PI_2 / segments as f32;
    (0..segments)
        .map(|i| {
            let (sin, cos) = (i as f32 * step).sin_cos();
            Vec2::new(center.x + cos * radius, center.y + sin * radius)
        })
        .collect()
}

/// Texture coordinates of a texel-space `source` rect.
#[inline]
pub fn texel_to_uv(texture: &Texture, source: Rect) -> Rect {
    let w = texture.width.max(1) as f32;
    let h = texture.height.max(1) as f32;
    Rect::new(source.origin.x / w, source.origin.y / h, source.size.x / w, source.size.y / h)
}

/// One textured quad: `source` (texels) of the texture drawn with size
/// `source.size` placed by `transform`.
pub fn sprite_quad(
    texture: &Texture,
    source: Rect,
    transform: &Transform2D,
    color: PackedColor,
) -> Mesh<SpriteVertex> {
    let local = Rect::new(0.0, 0.0, source.size.x, source.size.y);
    let corners = rect_outline(local).map(|p| transform.apply(p));
    let uvs = rect_outline(texel_to_uv(texture, source));

    Mesh {
        vertices: corners
            .iter()
            .zip(uvs.iter())
            .map(|(&p, &uv)| SpriteVertex::new(p, uv, color))
            .collect(),
        indices: QUAD_INDICES.to_vec(),
    }
}

/// Axis-aligned textured quad from a texel rect to a destination rect.
pub fn mapped_quad(
    texture: &Texture,
    source: Rect,
    dest: Rect,
    color: PackedColor,
    out: &mut Mesh<SpriteVertex>,
) {
    let base = out.vertices.len() as u16;
    let corners = rect_outline(dest);
    let uvs = rect_outline(texel_to_uv(texture, source));
    out.vertices
        .extend(corners.iter().zip(uvs.iter()).map(|(&p, &uv)| SpriteVertex::new(p, uv, color)));
    out.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::TextureId;
    use crate::math::PI_HALF;

    const RED: PackedColor = PackedColor::from_premul_bytes([255, 0, 0, 255]);

    fn square() -> Vec<Vec2> {
        rect_outline(Rect::new(0.0, 0.0, 10.0, 10.0)).to_vec()
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    // ── fill ──────────────────────────────────────────────────────────────

    #[test]
    fn fill_is_a_fan() {
        let mesh = fill_polygon(&square(), RED).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.vertices.iter().all(|v| v.color == RED.to_vertex_word()));
    }

    #[test]
    fn fill_needs_three_points() {
        let pts = [Vec2::zero(), Vec2::new(1.0, 1.0)];
        assert!(fill_polygon(&pts, RED).unwrap().is_empty());
    }

    #[test]
    fn fill_indexes_up_to_the_u16_limit() {
        let pts = vec![Vec2::new(1.0, 2.0); MAX_INDEXABLE_VERTICES];
        let mesh = fill_polygon(&pts, RED).unwrap();
        assert_eq!(mesh.vertices.len(), MAX_INDEXABLE_VERTICES);
        assert_eq!(mesh.indices.len(), (MAX_INDEXABLE_VERTICES - 2) * 3);
        assert_eq!(&mesh.indices[mesh.indices.len() - 3..], &[0, u16::MAX - 1, u16::MAX]);
    }

    #[test]
    fn fill_past_the_u16_limit_is_rejected() {
        let pts = vec![Vec2::zero(); MAX_INDEXABLE_VERTICES + 1];
        assert_eq!(
            fill_polygon(&pts, RED).unwrap_err(),
            RenderError::GeometryTooLarge { vertices: MAX_INDEXABLE_VERTICES + 1, max: MAX_INDEXABLE_VERTICES }
        );
    }

    // ── stroke ────────────────────────────────────────────────────────────

    #[test]
    fn closed_stroke_has_a_quad_per_edge() {
        let mesh = stroke_polygon(&square(), 2.0, true, RED).unwrap();
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.indices.len(), 24);
        assert_eq!(&mesh.indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn open_stroke_skips_the_closing_edge() {
        let mesh = stroke_polygon(&square(), 2.0, false, RED).unwrap();
        assert_eq!(mesh.vertices.len(), 12);
    }

    #[test]
    fn stroke_extrudes_half_thickness() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let mesh = stroke_polygon(&pts, 4.0, false, RED).unwrap();
        let ys: Vec<f32> = mesh.vertices.iter().map(|v| v.position[1]).collect();
        assert_eq!(ys, vec![-2.0, -2.0, 2.0, 2.0]);
    }

    #[test]
    fn zero_length_edges_are_skipped() {
        let pts = [Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0)];
        let mesh = stroke_polygon(&pts, 1.0, false, RED).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn stroke_edges_are_bounded_by_the_u16_limit() {
        let edges = MAX_INDEXABLE_VERTICES / 4;
        let pts = circle_outline(Vec2::zero(), 4000.0, edges as u32);
        let mesh = stroke_polygon(&pts, 1.0, true, RED).unwrap();
        assert_eq!(mesh.vertices.len(), MAX_INDEXABLE_VERTICES);
        assert_eq!(mesh.indices.iter().copied().max(), Some(u16::MAX));

        let pts = circle_outline(Vec2::zero(), 4000.0, edges as u32 + 1);
        assert!(matches!(
            stroke_polygon(&pts, 1.0, true, RED),
            Err(RenderError::GeometryTooLarge { vertices, .. }) if vertices == MAX_INDEXABLE_VERTICES + 4
        ));
    }

    // ── outlines ──────────────────────────────────────────────────────────

    #[test]
    fn circle_outline_clamps_segments() {
        let pts = circle_outline(Vec2::new(5.0, 5.0), 2.0, 1);
        assert_eq!(pts.len(), 3);
        assert!(approx(pts[0], Vec2::new(7.0, 5.0)));
    }

    #[test]
    fn circle_outline_goes_down_first() {
        let pts = circle_outline(Vec2::zero(), 1.0, 4);
        assert!(approx(pts[1], Vec2::new(0.0, 1.0)));
    }

    // ── sprites ───────────────────────────────────────────────────────────

    #[test]
    fn sprite_quad_uvs_follow_the_source_rect() {
        let tex = Texture { id: TextureId(0), width: 64, height: 32 };
        let mesh = sprite_quad(&tex, Rect::new(16.0, 8.0, 32.0, 16.0), &Transform2D::translation(100.0, 50.0), RED);

        assert_eq!(mesh.indices, QUAD_INDICES.to_vec());
        assert_eq!(mesh.vertices[0].position, [100.0, 50.0]);
        assert_eq!(mesh.vertices[2].position, [132.0, 66.0]);
        assert_eq!(mesh.vertices[0].uv, [0.25, 0.25]);
        assert_eq!(mesh.vertices[2].uv, [0.75, 0.75]);
    }

    #[test]
    fn sprite_quad_applies_rotation() {
        let tex = Texture { id: TextureId(0), width: 8, height: 8 };
        let mesh = sprite_quad(&tex, Rect::new(0.0, 0.0, 8.0, 8.0), &Transform2D::rotation(PI_HALF), RED);
        let p1 = Vec2::new(mesh.vertices[1].position[0], mesh.vertices[1].position[1]);
        assert!(approx(p1, Vec2::new(0.0, 8.0)));
    }

    #[test]
    fn mapped_quads_rebase_indices() {
        let tex = Texture { id: TextureId(0), width: 16, height: 16 };
        let mut mesh = Mesh::default();
        mapped_quad(&tex, Rect::new(0.0, 0.0, 8.0, 8.0), Rect::new(0.0, 0.0, 8.0, 8.0), RED, &mut mesh);
        mapped_quad(&tex, Rect::new(8.0, 0.0, 8.0, 8.0), Rect::new(8.0, 0.0, 8.0, 8.0), RED, &mut mesh);
        assert_eq!(mesh.indices[6..], [4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.vertices[4].uv, [0.5, 0.0]);
    }
}
