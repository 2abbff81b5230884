use std::collections::{HashMap, HashSet};

use crate::coords::Rect;
use crate::error::RenderError;
use crate::math::is_power_of_two;
use crate::shader::{ProgramLayout, UniformBinding, UniformValue};

use super::{GraphicsDevice, ProgramHandle, Texture, TextureId};

/// One call received by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateProgram { program: ProgramHandle, name: &'static str },
    DeleteProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    BindAttributes { program: ProgramHandle, stride: u32, offsets: Vec<(&'static str, u32)> },
    SetUniform { program: ProgramHandle, name: &'static str, value: UniformValue },
    BindTexture(Option<TextureId>),
    SetScissor(Option<Rect>),
    Draw(DrawRecord),
}

/// A draw call together with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: Option<ProgramHandle>,
    pub program_name: Option<&'static str>,
    pub texture: Option<TextureId>,
    pub scissor: Option<Rect>,
    pub stride: u32,
    pub vertices: Vec<u8>,
    pub indices: Vec<u16>,
}

impl DrawRecord {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        if self.stride == 0 { 0 } else { self.vertices.len() / self.stride as usize }
    }
}

/// In-memory device that records every call.
///
/// Programs always compile unless a failure was registered with
/// [`fail_compile`](Self::fail_compile). Useful for headless runs, tests, and
/// inspecting the exact call stream a frame produces.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,

    next_program: u32,
    programs: HashMap<ProgramHandle, &'static str>,
    failing: HashMap<&'static str, String>,

    next_texture: u32,
    textures: HashSet<TextureId>,

    current_program: Option<ProgramHandle>,
    current_stride: u32,
    current_texture: Option<TextureId>,
    current_scissor: Option<Rect>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next compile of shader `name` fail with `log`.
    pub fn fail_compile(&mut self, name: &'static str, log: impl Into<String>) {
        self.failing.insert(name, log.into());
    }

    /// Registers a texture of the given size.
    pub fn create_texture(&mut self, width: u32, height: u32) -> Result<Texture, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTextureSize { width, height });
        }
        if !is_power_of_two(width) || !is_power_of_two(height) {
            log::warn!("texture {width}x{height} is not a power of two; mipmaps and wrapping may be unavailable");
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id);
        Ok(Texture { id, width, height })
    }

    #[inline]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Only the draw calls, in issue order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.calls.iter().filter_map(|c| match c {
            DeviceCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Forgets recorded calls; device state is kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_program(&mut self, layout: &ProgramLayout) -> Result<ProgramHandle, RenderError> {
        let name = layout.name();
        if let Some(log) = self.failing.remove(name) {
            return Err(RenderError::ShaderCompile { name, log });
        }

        let program = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.programs.insert(program, name);
        self.calls.push(DeviceCall::CreateProgram { program, name });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(DeviceCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn bind_attributes(&mut self, program: ProgramHandle, layout: &ProgramLayout) {
        self.current_stride = layout.stride;
        self.calls.push(DeviceCall::BindAttributes {
            program,
            stride: layout.stride,
            offsets: layout.attributes.iter().map(|a| (a.name, a.offset)).collect(),
        });
    }

    fn set_uniform(&mut self, program: ProgramHandle, binding: &UniformBinding, value: UniformValue) {
        self.calls.push(DeviceCall::SetUniform { program, name: binding.name, value });
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), RenderError> {
        match texture {
            Some(id) if !self.textures.contains(&id) => {
                return Err(RenderError::UnknownTexture(id.0));
            }
            _ => {}
        }
        self.current_texture = texture;
        self.calls.push(DeviceCall::BindTexture(texture));
        Ok(())
    }

    fn set_scissor(&mut self, clip: Option<Rect>) {
        self.current_scissor = clip;
        self.calls.push(DeviceCall::SetScissor(clip));
    }

    fn draw_indexed(&mut self, vertices: &[u8], indices: &[u16]) {
        let program_name = self.current_program.and_then(|p| self.programs.get(&p).copied());
        self.calls.push(DeviceCall::Draw(DrawRecord {
            program: self.current_program,
            program_name,
            texture: self.current_texture,
            scissor: self.current_scissor,
            stride: self.current_stride,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        }));
    }
}
