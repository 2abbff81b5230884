//! Batched 2D rendering.
//!
//! Draw commands go through [`Canvas`] on a [`Renderer`], are tessellated on
//! the CPU ([`geometry`]), and accumulate in a [`Batcher`] until the shader,
//! texture or clip changes. Each flush becomes one indexed draw on the
//! [`GraphicsDevice`](crate::gpu::GraphicsDevice).
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to clip space with the `uProjection` uniform.

mod batch;
mod clip;
mod ctx;
pub mod geometry;
mod projection;
mod renderer;
mod vertex;

pub use batch::{
    Batch, BatchKey, BatchLimits, BatchSink, Batcher, FlushReason, FrameStats, MAX_INDEXABLE_VERTICES,
};
pub use clip::ClipStack;
pub use ctx::{RenderCtx, RenderTarget};
pub use projection::Projection;
pub use renderer::{Canvas, Renderer, RendererConfig, SpriteQuad};
pub use vertex::{PrimitiveVertex, SpriteVertex};
