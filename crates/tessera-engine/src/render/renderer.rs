use crate::coords::{Rect, Vec2};
use crate::error::RenderError;
use crate::gpu::{GraphicsDevice, Texture, TextureId, WgpuDevice};
use crate::math::Transform2D;
use crate::paint::{Color, PackedColor};
use crate::shader::{ProgramRuntime, ShaderId};

use super::batch::{Batch, BatchKey, BatchLimits, BatchSink, Batcher, FlushReason, FrameStats};
use super::clip::ClipStack;
use super::ctx::{RenderCtx, RenderTarget};
use super::geometry::{self, Mesh};
use super::projection::Projection;

/// Renderer tuning.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Vertices per batch before a capacity flush. Clamped to 65 536.
    pub max_batch_vertices: usize,
    /// Indices per batch before a capacity flush.
    pub max_batch_indices: usize,
    /// Segments used by [`Renderer::draw_circle`].
    pub circle_segments: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_batch_vertices: 16_384,
            max_batch_indices: 24_576,
            circle_segments: 32,
        }
    }
}

/// One quad of a [`Canvas::draw_sprites`] call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteQuad {
    /// Texel rect in the atlas.
    pub source: Rect,
    /// Destination rect in logical pixels.
    pub dest: Rect,
    pub color: Color,
}

/// Drawing interface consumed by scene code.
///
/// Colors are straight alpha; they are premultiplied and packed once per call.
pub trait Canvas {
    /// Fills the convex outline `points` when `thickness <= 0`, otherwise
    /// strokes its closed outline with `thickness` logical pixels.
    fn draw_filled_shape(&mut self, points: &[Vec2], color: Color, thickness: f32) -> Result<(), RenderError>;

    /// Draws the `source` texel rect of `texture` placed by `transform`,
    /// modulated by `color`.
    fn draw_sprite(
        &mut self,
        texture: &Texture,
        source: Rect,
        transform: &Transform2D,
        color: Color,
    ) -> Result<(), RenderError>;

    /// Draws coverage-mask quads (glyph and mask atlases) tinted per quad.
    fn draw_sprites(&mut self, texture: &Texture, quads: &[SpriteQuad]) -> Result<(), RenderError>;

    /// Narrows the clip region to its intersection with the given rect.
    fn push_clip(&mut self, x: f32, y: f32, w: f32, h: f32) -> Result<(), RenderError>;

    /// Restores the clip region active before the matching push.
    fn pop_clip(&mut self) -> Result<(), RenderError>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        self.draw_filled_shape(&geometry::rect_outline(rect), color, 0.0)
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, thickness: f32) -> Result<(), RenderError> {
        self.draw_filled_shape(&geometry::rect_outline(rect), color, thickness.max(f32::MIN_POSITIVE))
    }
}

/// Submits batches through the device: bind program, bind texture, set the
/// projection, configure attributes, draw.
struct Submitter<'a, D: GraphicsDevice> {
    device: &'a mut D,
    programs: &'a mut ProgramRuntime,
    projection: Projection,
    bound_texture: &'a mut Option<TextureId>,
}

impl<D: GraphicsDevice> BatchSink for Submitter<'_, D> {
    fn submit(&mut self, batch: &Batch) -> Result<(), RenderError> {
        let program = self.programs.use_program(self.device, batch.key.shader)?;
        if program.stride() != batch.stride {
            return Err(RenderError::StrideMismatch {
                program: program.name(),
                batch: batch.stride,
                program_stride: program.stride(),
            });
        }

        if *self.bound_texture != batch.key.texture {
            self.device.bind_texture(batch.key.texture)?;
            *self.bound_texture = batch.key.texture;
        }

        program.set_uniform(self.device, "uProjection", self.projection.uniform())?;
        program.bind_attributes(self.device);
        self.device.draw_indexed(&batch.vertices, &batch.indices);
        Ok(())
    }
}

/// The render context: owns the device, program cache, batcher, clip stack
/// and projection for one render target.
///
/// Draw calls only reach the device when a batch is flushed; call
/// [`end_frame`](Self::end_frame) once per frame.
pub struct Renderer<D: GraphicsDevice> {
    device: D,
    programs: ProgramRuntime,
    batcher: Batcher,
    clips: ClipStack,
    projection: Projection,
    bound_texture: Option<TextureId>,
    config: RendererConfig,
}

impl<D: GraphicsDevice> Renderer<D> {
    /// Creates a renderer for a `width` x `height` target (logical pixels).
    ///
    /// Programs are compiled lazily, on their first flush.
    pub fn new(device: D, config: RendererConfig, width: f32, height: f32) -> Self {
        let limits = BatchLimits::new(config.max_batch_vertices, config.max_batch_indices);
        if limits.max_vertices != config.max_batch_vertices {
            log::warn!(
                "max_batch_vertices {} clamped to {}",
                config.max_batch_vertices,
                limits.max_vertices
            );
        }

        Self {
            device,
            programs: ProgramRuntime::new(),
            batcher: Batcher::new(limits),
            clips: ClipStack::new(),
            projection: Projection::new(width, height),
            bound_texture: None,
            config,
        }
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Effective clip, or `None` when unclipped.
    #[inline]
    pub fn clip(&self) -> Option<Rect> {
        self.clips.current()
    }

    /// Counters accumulated since the last [`end_frame`](Self::end_frame).
    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.batcher.stats()
    }

    fn split(&mut self) -> (&mut Batcher, Submitter<'_, D>) {
        (
            &mut self.batcher,
            Submitter {
                device: &mut self.device,
                programs: &mut self.programs,
                projection: self.projection,
                bound_texture: &mut self.bound_texture,
            },
        )
    }

    fn flush_with(&mut self, reason: FlushReason) -> Result<(), RenderError> {
        let (batcher, mut sink) = self.split();
        batcher.flush(reason, &mut sink)
    }

    fn append<V: bytemuck::Pod>(&mut self, shader: ShaderId, texture: Option<TextureId>, mesh: &Mesh<V>) -> Result<(), RenderError> {
        let clip = self.clips.current();
        // Nothing inside an empty clip is visible.
        if mesh.is_empty() || clip.is_some_and(Rect::is_empty) {
            return Ok(());
        }
        let key = BatchKey::new(shader, texture, clip);
        let (batcher, mut sink) = self.split();
        batcher.append(key, &mesh.vertices, &mesh.indices, &mut sink)
    }

    /// Submits the open batch now.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        self.flush_with(FlushReason::Explicit)
    }

    /// Updates the projection for a new target size, flushing geometry
    /// recorded under the old one first.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), RenderError> {
        let mut next = self.projection;
        if !next.update(width, height) {
            return Ok(());
        }
        let flushed = self.flush_with(FlushReason::Projection);
        self.projection = next;
        log::debug!("projection resized to {}x{}", width, height);
        flushed
    }

    /// Draws a circle (filled when `thickness <= 0`).
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color, thickness: f32) -> Result<(), RenderError> {
        let points = geometry::circle_outline(center, radius, self.config.circle_segments);
        self.draw_filled_shape(&points, color, thickness)
    }

    /// Flushes everything and returns the frame's counters.
    ///
    /// A clip stack left unbalanced is cleared so the next frame starts unclipped.
    pub fn end_frame(&mut self) -> Result<FrameStats, RenderError> {
        let flushed = self.flush_with(FlushReason::EndOfFrame);

        if !self.clips.is_empty() {
            log::warn!("{} clip region(s) still pushed at end of frame", self.clips.depth());
            self.clips.clear();
            self.device.set_scissor(None);
        }

        let stats = self.batcher.take_stats();
        log::trace!(
            "frame: {} draw calls, {} vertices, {} indices",
            stats.draw_calls,
            stats.vertices,
            stats.indices
        );
        flushed.map(|_| stats)
    }

    /// Forgets every device object after the context was lost. Programs are
    /// recompiled on their next use; pending geometry is dropped.
    pub fn context_lost(&mut self) {
        log::warn!("graphics context lost; dropping cached programs");
        self.batcher.discard();
        self.programs.invalidate();
        self.bound_texture = None;
    }

    /// Swaps in a fresh device (after context loss) and returns the old one.
    ///
    /// The current clip is re-applied to the new device.
    pub fn replace_device(&mut self, device: D) -> D {
        self.context_lost();
        let old = std::mem::replace(&mut self.device, device);
        if let Some(clip) = self.clips.current() {
            self.device.set_scissor(Some(clip));
        }
        old
    }
}

impl<D: GraphicsDevice> Canvas for Renderer<D> {
    fn draw_filled_shape(&mut self, points: &[Vec2], color: Color, thickness: f32) -> Result<(), RenderError> {
        let color = PackedColor::pack(color);
        let mesh = if thickness <= 0.0 {
            geometry::fill_polygon(points, color)?
        } else {
            geometry::stroke_polygon(points, thickness, true, color)?
        };
        self.append(ShaderId::Primitive, None, &mesh)
    }

    fn draw_sprite(
        &mut self,
        texture: &Texture,
        source: Rect,
        transform: &Transform2D,
        color: Color,
    ) -> Result<(), RenderError> {
        let mesh = geometry::sprite_quad(texture, source, transform, PackedColor::pack(color));
        self.append(ShaderId::Sprite, Some(texture.id), &mesh)
    }

    fn draw_sprites(&mut self, texture: &Texture, quads: &[SpriteQuad]) -> Result<(), RenderError> {
        // Chunks of whole quads that each fit one batch.
        let per_chunk = (self.batcher.limits().max_vertices / 4)
            .min(self.batcher.limits().max_indices / 6)
            .max(1);

        let mut mesh = Mesh::default();
        for chunk in quads.chunks(per_chunk) {
            mesh.vertices.clear();
            mesh.indices.clear();
            for q in chunk {
                geometry::mapped_quad(texture, q.source, q.dest, PackedColor::pack(q.color), &mut mesh);
            }
            self.append(ShaderId::Sprites, Some(texture.id), &mesh)?;
        }
        Ok(())
    }

    fn push_clip(&mut self, x: f32, y: f32, w: f32, h: f32) -> Result<(), RenderError> {
        let flushed = self.flush_with(FlushReason::ClipChange);
        let effective = self.clips.push(Rect::new(x, y, w, h));
        self.device.set_scissor(Some(effective));
        flushed
    }

    fn pop_clip(&mut self) -> Result<(), RenderError> {
        if self.clips.is_empty() {
            log::warn!("pop_clip called with no clip region pushed; ignored");
            return Ok(());
        }
        let flushed = self.flush_with(FlushReason::ClipChange);
        self.clips.pop();
        self.device.set_scissor(self.clips.current());
        flushed
    }
}

impl Renderer<WgpuDevice> {
    /// Ends the frame and encodes every recorded draw into `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<FrameStats, RenderError> {
        self.resize(ctx.viewport.width, ctx.viewport.height)?;
        let stats = self.end_frame();
        self.device.encode(target, ctx.viewport, ctx.scale_factor);
        stats
    }
}

impl<D: GraphicsDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        self.programs.release(&mut self.device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DeviceCall, RecordingDevice};
    use crate::render::MAX_INDEXABLE_VERTICES;
    use crate::shader::UniformValue;

    fn renderer() -> Renderer<RecordingDevice> {
        Renderer::new(RecordingDevice::new(), RendererConfig::default(), 800.0, 600.0)
    }

    fn triangle() -> [Vec2; 3] {
        [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)]
    }

    fn count(r: &Renderer<RecordingDevice>, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        r.device().calls().iter().filter(|c| pred(c)).count()
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn nothing_reaches_the_device_before_a_flush() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        assert!(r.device().calls().is_empty());
    }

    #[test]
    fn shapes_then_sprite_make_two_draws_in_order() {
        let mut r = renderer();
        let tex = r.device_mut().create_texture(64, 64).unwrap();

        r.draw_filled_shape(&triangle(), Color::rgb(255, 0, 0), 0.0).unwrap();
        r.draw_filled_shape(&triangle(), Color::rgb(0, 255, 0), 2.0).unwrap();
        r.draw_sprite(&tex, Rect::new(0.0, 0.0, 32.0, 32.0), &Transform2D::identity(), Color::WHITE)
            .unwrap();
        let stats = r.end_frame().unwrap();

        let draws: Vec<_> = r.device().draws().cloned().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program_name, Some("primitive"));
        assert_eq!(draws[0].texture, None);
        assert_eq!(draws[0].stride, 12);
        assert_eq!(draws[1].program_name, Some("sprite"));
        assert_eq!(draws[1].texture, Some(tex.id));
        assert_eq!(draws[1].vertex_count(), 4);

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.flushes(FlushReason::ShaderChange), 1);
        assert_eq!(stats.flushes(FlushReason::EndOfFrame), 1);
    }

    #[test]
    fn colors_are_premultiplied_in_the_vertex_stream() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::rgba(255, 128, 0, 128), 0.0).unwrap();
        r.end_frame().unwrap();

        let draw = r.device().draws().next().cloned().unwrap();
        assert_eq!(&draw.vertices[8..12], &[128, 64, 0, 128]);
    }

    #[test]
    fn projection_uniform_is_set_on_every_flush() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.flush().unwrap();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.end_frame().unwrap();

        let values: Vec<_> = r
            .device()
            .calls()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetUniform { name: "uProjection", value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![UniformValue::Vec2([400.0, -300.0]); 2]);
    }

    #[test]
    fn texture_binds_are_not_repeated() {
        let mut r = renderer();
        let tex = r.device_mut().create_texture(16, 16).unwrap();
        let src = Rect::new(0.0, 0.0, 16.0, 16.0);

        r.draw_sprite(&tex, src, &Transform2D::identity(), Color::WHITE).unwrap();
        r.flush().unwrap();
        r.draw_sprite(&tex, src, &Transform2D::identity(), Color::WHITE).unwrap();
        r.end_frame().unwrap();

        assert_eq!(count(&r, |c| matches!(c, DeviceCall::BindTexture(_))), 1);
        assert_eq!(r.device().draws().count(), 2);
    }

    #[test]
    fn sprites_batch_per_texture() {
        let mut r = renderer();
        let atlas = r.device_mut().create_texture(128, 128).unwrap();
        let quad = SpriteQuad {
            source: Rect::new(0.0, 0.0, 8.0, 8.0),
            dest: Rect::new(10.0, 10.0, 8.0, 8.0),
            color: Color::BLACK,
        };
        r.draw_sprites(&atlas, &[quad; 5]).unwrap();
        r.draw_sprites(&atlas, &[quad; 3]).unwrap();
        r.end_frame().unwrap();

        let draws: Vec<_> = r.device().draws().cloned().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program_name, Some("sprites"));
        assert_eq!(draws[0].vertex_count(), 32);
        assert_eq!(draws[0].indices.len(), 48);
    }

    #[test]
    fn large_sprite_runs_are_chunked() {
        let config = RendererConfig { max_batch_vertices: 8, ..RendererConfig::default() };
        let mut r = Renderer::new(RecordingDevice::new(), config, 100.0, 100.0);
        let atlas = r.device_mut().create_texture(16, 16).unwrap();
        let quad = SpriteQuad {
            source: Rect::new(0.0, 0.0, 1.0, 1.0),
            dest: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
        };
        r.draw_sprites(&atlas, &[quad; 5]).unwrap();
        let stats = r.end_frame().unwrap();

        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.flushes(FlushReason::Capacity), 2);
    }

    #[test]
    fn unknown_texture_fails_the_flush() {
        let mut r = renderer();
        let ghost = Texture { id: TextureId(42), width: 4, height: 4 };
        r.draw_sprite(&ghost, Rect::new(0.0, 0.0, 4.0, 4.0), &Transform2D::identity(), Color::WHITE)
            .unwrap();
        assert_eq!(r.end_frame().unwrap_err(), RenderError::UnknownTexture(42));
    }

    // ── index limit ───────────────────────────────────────────────────────

    fn ring(points: usize) -> Vec<Vec2> {
        geometry::circle_outline(Vec2::new(400.0, 300.0), 4000.0, points as u32)
    }

    #[test]
    fn largest_indexable_fill_is_one_draw() {
        let mut r = renderer();
        r.draw_filled_shape(&ring(MAX_INDEXABLE_VERTICES), Color::WHITE, 0.0).unwrap();
        let stats = r.end_frame().unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.vertices as usize, MAX_INDEXABLE_VERTICES);
        assert_eq!(stats.indices as usize, (MAX_INDEXABLE_VERTICES - 2) * 3);
    }

    #[test]
    fn fill_past_the_index_limit_is_an_error() {
        let mut r = renderer();
        let err = r.draw_filled_shape(&ring(MAX_INDEXABLE_VERTICES + 1), Color::WHITE, 0.0).unwrap_err();
        assert_eq!(
            err,
            RenderError::GeometryTooLarge { vertices: MAX_INDEXABLE_VERTICES + 1, max: MAX_INDEXABLE_VERTICES }
        );
        assert_eq!(r.end_frame().unwrap().draw_calls, 0);
    }

    #[test]
    fn stroke_at_and_past_the_index_limit() {
        let edges = MAX_INDEXABLE_VERTICES / 4;
        let mut r = renderer();
        r.draw_filled_shape(&ring(edges), Color::WHITE, 1.0).unwrap();
        assert_eq!(r.end_frame().unwrap().vertices as usize, MAX_INDEXABLE_VERTICES);

        let err = r.draw_filled_shape(&ring(edges + 1), Color::WHITE, 1.0).unwrap_err();
        assert!(matches!(err, RenderError::GeometryTooLarge { .. }));
    }

    #[test]
    fn sprite_runs_past_the_index_limit_are_split_not_rejected() {
        let mut r = renderer();
        let atlas = r.device_mut().create_texture(16, 16).unwrap();
        let quad = SpriteQuad {
            source: Rect::new(0.0, 0.0, 1.0, 1.0),
            dest: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
        };
        let quads = vec![quad; MAX_INDEXABLE_VERTICES / 4 + 1];
        r.draw_sprites(&atlas, &quads).unwrap();
        let stats = r.end_frame().unwrap();

        let per_batch = RendererConfig::default().max_batch_vertices;
        assert_eq!(stats.vertices as usize, MAX_INDEXABLE_VERTICES + 4);
        assert_eq!(stats.draw_calls as usize, MAX_INDEXABLE_VERTICES / per_batch + 1);
        assert!(r.device().draws().all(|d| d.indices.iter().all(|&i| (i as usize) < per_batch)));
    }

    // ── clipping ──────────────────────────────────────────────────────────

    #[test]
    fn clip_push_and_pop_flush_and_program_scissor() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.push_clip(0.0, 0.0, 100.0, 100.0).unwrap();
        r.push_clip(50.0, 50.0, 100.0, 100.0).unwrap();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.pop_clip().unwrap();
        r.pop_clip().unwrap();
        r.end_frame().unwrap();

        let scissors: Vec<_> = r
            .device()
            .calls()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetScissor(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            scissors,
            vec![
                Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
                Some(Rect::new(50.0, 50.0, 50.0, 50.0)),
                Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
                None,
            ]
        );

        let draws: Vec<_> = r.device().draws().cloned().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].scissor, None);
        assert_eq!(draws[1].scissor, Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
    }

    #[test]
    fn empty_clip_draws_nothing() {
        let mut r = renderer();
        r.push_clip(0.0, 0.0, 10.0, 10.0).unwrap();
        r.push_clip(20.0, 20.0, 10.0, 10.0).unwrap();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.pop_clip().unwrap();
        r.pop_clip().unwrap();
        r.end_frame().unwrap();
        assert_eq!(r.device().draws().count(), 0);
    }

    #[test]
    fn pop_on_empty_stack_is_ignored() {
        let mut r = renderer();
        r.pop_clip().unwrap();
        assert!(r.device().calls().is_empty());
        assert_eq!(r.clip(), None);
    }

    #[test]
    fn unbalanced_clips_are_reset_at_end_of_frame() {
        let mut r = renderer();
        r.push_clip(0.0, 0.0, 10.0, 10.0).unwrap();
        r.end_frame().unwrap();
        assert_eq!(r.clip(), None);
        assert!(matches!(r.device().calls().last(), Some(DeviceCall::SetScissor(None))));
    }

    // ── projection / context ──────────────────────────────────────────────

    #[test]
    fn resize_flushes_under_the_old_projection() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.resize(1024.0, 768.0).unwrap();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        let stats = r.end_frame().unwrap();

        assert_eq!(stats.flushes(FlushReason::Projection), 1);
        let values: Vec<_> = r
            .device()
            .calls()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetUniform { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            vec![UniformValue::Vec2([400.0, -300.0]), UniformValue::Vec2([512.0, -384.0])]
        );
    }

    #[test]
    fn resize_to_same_size_does_not_flush() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.resize(800.0, 600.0).unwrap();
        assert_eq!(r.stats().draw_calls, 0);
    }

    #[test]
    fn compile_failure_surfaces_on_flush() {
        let mut device = RecordingDevice::new();
        device.fail_compile("primitive", "error: expected `;`");
        let mut r = Renderer::new(device, RendererConfig::default(), 100.0, 100.0);
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();

        let err = r.end_frame().unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { name: "primitive", .. }));

        // The failure is not sticky; the next frame compiles again.
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        assert_eq!(r.end_frame().unwrap().draw_calls, 1);
    }

    #[test]
    fn context_loss_recompiles_on_a_new_device() {
        let mut r = renderer();
        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.end_frame().unwrap();

        r.push_clip(0.0, 0.0, 5.0, 5.0).unwrap();
        let old = r.replace_device(RecordingDevice::new());
        assert_eq!(old.draws().count(), 1);
        assert_eq!(r.device().calls(), &[DeviceCall::SetScissor(Some(Rect::new(0.0, 0.0, 5.0, 5.0)))]);

        r.draw_filled_shape(&triangle(), Color::WHITE, 0.0).unwrap();
        r.pop_clip().unwrap();
        r.end_frame().unwrap();
        assert_eq!(count(&r, |c| matches!(c, DeviceCall::CreateProgram { .. })), 1);
    }

    #[test]
    fn stride_mismatch_is_rejected() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramRuntime::new();
        let mut bound = None;
        let mut sink = Submitter {
            device: &mut device,
            programs: &mut programs,
            projection: Projection::new(10.0, 10.0),
            bound_texture: &mut bound,
        };
        let batch = Batch {
            key: BatchKey::new(ShaderId::Primitive, None, None),
            stride: 20,
            vertices: vec![0; 60],
            vertex_count: 3,
            indices: vec![0, 1, 2],
        };
        assert!(matches!(
            sink.submit(&batch),
            Err(RenderError::StrideMismatch { batch: 20, program_stride: 12, .. })
        ));
    }
}
