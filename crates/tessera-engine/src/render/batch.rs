use bytemuck::Pod;

use crate::coords::Rect;
use crate::error::RenderError;
use crate::gpu::TextureId;
use crate::shader::ShaderId;

/// Largest vertex count addressable by `u16` indices.
pub const MAX_INDEXABLE_VERTICES: usize = u16::MAX as usize + 1;

/// State every command in one batch shares.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BatchKey {
    pub shader: ShaderId,
    pub texture: Option<TextureId>,
    pub clip: Option<Rect>,
}

impl BatchKey {
    #[inline]
    pub fn new(shader: ShaderId, texture: Option<TextureId>, clip: Option<Rect>) -> Self {
        Self { shader, texture, clip }
    }
}

/// Why a batch was submitted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FlushReason {
    ShaderChange,
    TextureChange,
    ClipChange,
    Capacity,
    Projection,
    EndOfFrame,
    Explicit,
}

impl FlushReason {
    pub const ALL: [FlushReason; 7] = [
        FlushReason::ShaderChange,
        FlushReason::TextureChange,
        FlushReason::ClipChange,
        FlushReason::Capacity,
        FlushReason::Projection,
        FlushReason::EndOfFrame,
        FlushReason::Explicit,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Per-frame submission counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertices: u32,
    pub indices: u32,
    flushes: [u32; FlushReason::ALL.len()],
}

impl FrameStats {
    #[inline]
    pub fn flushes(&self, reason: FlushReason) -> u32 {
        self.flushes[reason.index()]
    }

    pub fn total_flushes(&self) -> u32 {
        self.flushes.iter().sum()
    }
}

/// Limits a batch must stay within.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BatchLimits {
    pub max_vertices: usize,
    pub max_indices: usize,
}

impl BatchLimits {
    /// Clamps `max_vertices` to what `u16` indices can address.
    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        Self {
            max_vertices: max_vertices.clamp(1, MAX_INDEXABLE_VERTICES),
            max_indices: max_indices.max(1),
        }
    }
}

/// Interleaved vertex bytes and indices for one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub key: BatchKey,
    pub stride: u32,
    pub vertices: Vec<u8>,
    pub vertex_count: usize,
    pub indices: Vec<u16>,
}

impl Batch {
    fn fits(&self, vertices: usize, indices: usize, limits: BatchLimits) -> bool {
        self.vertex_count + vertices <= limits.max_vertices
            && self.indices.len() + indices <= limits.max_indices
    }

    fn push(&mut self, vertices: &[u8], vertex_count: usize, indices: &[u16]) {
        // Fits in u16: vertex_count never exceeds MAX_INDEXABLE_VERTICES.
        let base = self.vertex_count as u16;
        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|&i| base.wrapping_add(i)));
        self.vertex_count += vertex_count;
    }
}

/// Receives completed batches.
pub trait BatchSink {
    fn submit(&mut self, batch: &Batch) -> Result<(), RenderError>;
}

/// Accumulates draw commands into the fewest batches.
///
/// Idle until the first append; Open while a batch is being filled. An append
/// with a different key, or one that would overflow the limits, flushes the
/// open batch first. Geometry is never split or truncated.
#[derive(Debug)]
pub struct Batcher {
    limits: BatchLimits,
    open: Option<Batch>,
    // Buffers of the last flushed batch, reused for the next one.
    spare: (Vec<u8>, Vec<u16>),
    stats: FrameStats,
}

impl Batcher {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            open: None,
            spare: (Vec::new(), Vec::new()),
            stats: FrameStats::default(),
        }
    }

    #[inline]
    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    #[inline]
    pub fn open_key(&self) -> Option<BatchKey> {
        self.open.as_ref().map(|b| b.key)
    }

    /// Appends one command's vertices and indices (relative to its own first vertex).
    pub fn append<V: Pod, S: BatchSink + ?Sized>(
        &mut self,
        key: BatchKey,
        vertices: &[V],
        indices: &[u16],
        sink: &mut S,
    ) -> Result<(), RenderError> {
        if vertices.is_empty() || indices.is_empty() {
            return Ok(());
        }
        if vertices.len() > MAX_INDEXABLE_VERTICES {
            return Err(RenderError::GeometryTooLarge {
                vertices: vertices.len(),
                max: MAX_INDEXABLE_VERTICES,
            });
        }

        let stride = size_of::<V>() as u32;
        let reason = match &self.open {
            None => None,
            Some(open) if open.key.shader != key.shader || open.stride != stride => {
                Some(FlushReason::ShaderChange)
            }
            Some(open) if open.key.texture != key.texture => Some(FlushReason::TextureChange),
            Some(open) if open.key.clip != key.clip => Some(FlushReason::ClipChange),
            Some(open) if !open.fits(vertices.len(), indices.len(), self.limits) => {
                Some(FlushReason::Capacity)
            }
            Some(_) => None,
        };
        if let Some(reason) = reason {
            self.flush(reason, sink)?;
        }

        if self.open.is_none() {
            if vertices.len() > self.limits.max_vertices || indices.len() > self.limits.max_indices {
                log::debug!(
                    "command with {} vertices / {} indices exceeds batch limits; drawn alone",
                    vertices.len(),
                    indices.len()
                );
            }
            let (mut v, mut i) = std::mem::take(&mut self.spare);
            v.clear();
            i.clear();
            self.open = Some(Batch { key, stride, vertices: v, vertex_count: 0, indices: i });
        }

        if let Some(batch) = self.open.as_mut() {
            batch.push(bytemuck::cast_slice(vertices), vertices.len(), indices);
        }
        Ok(())
    }

    /// Submits the open batch, if any, and returns to Idle.
    ///
    /// The batch is consumed even when the sink fails.
    pub fn flush<S: BatchSink + ?Sized>(
        &mut self,
        reason: FlushReason,
        sink: &mut S,
    ) -> Result<(), RenderError> {
        let Some(batch) = self.open.take() else {
            return Ok(());
        };

        let result = sink.submit(&batch);
        if result.is_ok() {
            self.stats.draw_calls += 1;
            self.stats.vertices += batch.vertex_count as u32;
            self.stats.indices += batch.indices.len() as u32;
            self.stats.flushes[reason.index()] += 1;
        }

        self.spare = (batch.vertices, batch.indices);
        result
    }

    /// Drops the open batch without submitting it.
    pub fn discard(&mut self) {
        if let Some(batch) = self.open.take() {
            self.spare = (batch.vertices, batch.indices);
        }
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Returns the counters accumulated so far and resets them.
    pub fn take_stats(&mut self) -> FrameStats {
        std::mem::take(&mut self.stats)
    }
}
