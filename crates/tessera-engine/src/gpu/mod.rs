//! Graphics device seam.
//!
//! The renderer talks to the GPU only through [`GraphicsDevice`]: compile a
//! program, bind it, configure attributes, write uniforms, bind a texture,
//! program the scissor test, draw indexed triangles.
//!
//! Implementations:
//! - [`RecordingDevice`]: keeps every call in memory (headless rendering, tests)
//! - [`WgpuDevice`]: compiles WGSL programs to wgpu pipelines and replays draws
//!   into a render pass

mod recording;
mod wgpu_device;

pub use recording::{DeviceCall, DrawRecord, RecordingDevice};
pub use wgpu_device::WgpuDevice;

use crate::coords::Rect;
use crate::error::RenderError;
use crate::shader::{ProgramLayout, UniformBinding, UniformValue};

/// Device-side program handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Device-side texture handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A texture known to a device, with its size in texels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Low-level graphics operations used by the renderer.
///
/// Calls happen on one thread within one frame. State set by one call
/// (bound program, bound texture, scissor) stays in effect for later draws.
pub trait GraphicsDevice {
    /// Compiles and links the program described by `layout`.
    ///
    /// Fails with [`RenderError::ShaderCompile`] carrying the compiler log.
    fn create_program(&mut self, layout: &ProgramLayout) -> Result<ProgramHandle, RenderError>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Makes `program` the active program for subsequent draws.
    fn use_program(&mut self, program: ProgramHandle);

    /// Configures attribute pointers (location, size, normalize, stride,
    /// offset) for the next draw.
    fn bind_attributes(&mut self, program: ProgramHandle, layout: &ProgramLayout);

    fn set_uniform(&mut self, program: ProgramHandle, binding: &UniformBinding, value: UniformValue);

    /// Binds `texture` to the sampler slot, or unbinds with `None`.
    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), RenderError>;

    /// Enables the scissor test with `clip` (logical pixels), or disables it
    /// with `None`.
    fn set_scissor(&mut self, clip: Option<Rect>);

    /// Uploads interleaved vertex bytes and `u16` indices and draws them as a
    /// triangle list with the current state.
    fn draw_indexed(&mut self, vertices: &[u8], indices: &[u16]);
}
