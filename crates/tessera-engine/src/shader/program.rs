use std::collections::HashMap;

use crate::error::RenderError;
use crate::gpu::{GraphicsDevice, ProgramHandle};

use super::descriptor::{ComponentType, ShaderDescriptor};
use super::library::ShaderId;

/// Resolved placement of one attribute inside the interleaved vertex record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeBinding {
    pub name: &'static str,
    /// Binding location; equals the attribute's index in the descriptor.
    pub location: u32,
    /// Byte offset from the start of the vertex record.
    pub offset: u32,
    pub component_type: ComponentType,
    /// Component count passed to the device (4 for normalized byte groups).
    pub size: u8,
    pub normalized: bool,
}

/// Resolved placement of one uniform inside the program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformBinding {
    pub name: &'static str,
    /// Byte offset inside the uniform block.
    pub location: u32,
    pub component_count: u8,
}

/// Value written to a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    #[inline]
    pub fn component_count(&self) -> u8 {
        match self {
            UniformValue::Float(_) => 1,
            UniformValue::Vec2(_) => 2,
            UniformValue::Vec3(_) => 3,
            UniformValue::Vec4(_) => 4,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => core::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec3(v) => v,
            UniformValue::Vec4(v) => v,
        }
    }
}

/// Interleaved vertex layout and uniform block layout derived from a descriptor.
///
/// This is the contract between the batch layer (which writes vertex bytes)
/// and the device (which configures attribute pointers).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLayout {
    pub descriptor: &'static ShaderDescriptor,
    pub attributes: Vec<AttributeBinding>,
    pub stride: u32,
    pub uniforms: Vec<UniformBinding>,
    /// Uniform block size in bytes, padded to 16.
    pub uniform_block_size: u32,
}

impl ProgramLayout {
    /// Computes offsets for every attribute (in descriptor order) and uniform.
    ///
    /// Uniforms follow WGSL uniform-buffer alignment: scalars align to 4,
    /// `vec2` to 8, `vec3`/`vec4` to 16.
    pub fn from_descriptor(descriptor: &'static ShaderDescriptor) -> Result<Self, RenderError> {
        let mut attributes = Vec::with_capacity(descriptor.attributes.len());
        let mut offset = 0u32;

        for (i, attr) in descriptor.attributes.iter().enumerate() {
            let supported = match attr.component_type {
                ComponentType::Float => !attr.normalized && (1..=4).contains(&attr.component_count),
                ComponentType::UnsignedByte => attr.normalized || attr.component_count == 4,
            };
            if !supported {
                return Err(RenderError::UnsupportedAttribute {
                    program: descriptor.name,
                    name: attr.name,
                });
            }

            attributes.push(AttributeBinding {
                name: attr.name,
                location: i as u32,
                offset,
                component_type: attr.component_type,
                size: attr.pointer_size(),
                normalized: attr.normalized,
            });
            offset += attr.byte_size();
        }

        let mut uniforms = Vec::with_capacity(descriptor.uniforms.len());
        let mut cursor = 0u32;

        for u in descriptor.uniforms {
            if u.component_type != ComponentType::Float || !(1..=4).contains(&u.component_count) {
                return Err(RenderError::UnsupportedUniform { program: descriptor.name, name: u.name });
            }
            let align = match u.component_count {
                1 => 4,
                2 => 8,
                _ => 16,
            };
            cursor = cursor.next_multiple_of(align);
            uniforms.push(UniformBinding {
                name: u.name,
                location: cursor,
                component_count: u.component_count,
            });
            cursor += u.component_count as u32 * 4;
        }

        Ok(Self {
            descriptor,
            attributes,
            stride: offset,
            uniforms,
            uniform_block_size: cursor.next_multiple_of(16).max(16),
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn attribute(&self, name: &str) -> Result<&AttributeBinding, RenderError> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| RenderError::UnknownAttribute {
                program: self.name(),
                name: name.to_string(),
            })
    }

    pub fn uniform(&self, name: &str) -> Result<&UniformBinding, RenderError> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.name(),
                name: name.to_string(),
            })
    }
}

/// A program compiled on a device, with its resolved layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub handle: ProgramHandle,
    pub layout: ProgramLayout,
}

impl CompiledProgram {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.layout.name()
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.layout.stride
    }

    /// Configures every attribute pointer for the vertex data about to be drawn.
    #[inline]
    pub fn bind_attributes<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_attributes(self.handle, &self.layout);
    }

    /// Writes `value` to the uniform called `name`.
    pub fn set_uniform<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        name: &str,
        value: UniformValue,
    ) -> Result<(), RenderError> {
        let binding = self.layout.uniform(name)?;
        if binding.component_count != value.component_count() {
            return Err(RenderError::UniformTypeMismatch {
                program: self.name(),
                name: binding.name,
                expected: binding.component_count,
                actual: value.component_count(),
            });
        }
        device.set_uniform(self.handle, binding, value);
        Ok(())
    }
}

/// Compiles `descriptor` on `device`.
///
/// Errors from the device (compile or link) are returned unchanged and logged.
pub fn compile<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    descriptor: &'static ShaderDescriptor,
) -> Result<CompiledProgram, RenderError> {
    let layout = ProgramLayout::from_descriptor(descriptor)?;

    match device.create_program(&layout) {
        Ok(handle) => {
            log::debug!(
                "compiled shader `{}` as {:?} (stride {} bytes, {} attributes)",
                descriptor.name,
                handle,
                layout.stride,
                layout.attributes.len()
            );
            Ok(CompiledProgram { handle, layout })
        }
        Err(e) => {
            log::error!("{e}");
            Err(e)
        }
    }
}

/// Program cache plus the currently bound program.
///
/// Programs are compiled the first time they are needed and live until the
/// context is destroyed ([`release`](Self::release)) or lost
/// ([`invalidate`](Self::invalidate)).
#[derive(Debug, Default)]
pub struct ProgramRuntime {
    programs: HashMap<ShaderId, CompiledProgram>,
    bound: Option<ProgramHandle>,
}

impl ProgramRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_compiled<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: ShaderId,
    ) -> Result<(), RenderError> {
        if !self.programs.contains_key(&id) {
            let program = compile(device, id.descriptor())?;
            self.programs.insert(id, program);
        }
        Ok(())
    }

    /// Returns the compiled program for `id`, compiling on first use.
    pub fn program<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: ShaderId,
    ) -> Result<&CompiledProgram, RenderError> {
        self.ensure_compiled(device, id)?;
        Ok(&self.programs[&id])
    }

    /// Makes `id` the active program, compiling it if needed.
    ///
    /// The device is only told to switch when the program differs from the
    /// one already bound.
    pub fn use_program<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        id: ShaderId,
    ) -> Result<&CompiledProgram, RenderError> {
        self.ensure_compiled(device, id)?;
        let program = &self.programs[&id];

        if self.bound != Some(program.handle) {
            device.use_program(program.handle);
            self.bound = Some(program.handle);
        }
        Ok(program)
    }

    #[inline]
    pub fn bound(&self) -> Option<ProgramHandle> {
        self.bound
    }

    #[inline]
    pub fn is_compiled(&self, id: ShaderId) -> bool {
        self.programs.contains_key(&id)
    }

    /// Forgets every program without touching the device. Used after context
    /// loss, when the old handles are already invalid.
    pub fn invalidate(&mut self) {
        if !self.programs.is_empty() {
            log::debug!("dropping {} cached programs", self.programs.len());
        }
        self.programs.clear();
        self.bound = None;
    }

    /// Deletes every program on the device.
    pub fn release<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        for (_, program) in self.programs.drain() {
            device.delete_program(program.handle);
        }
        self.bound = None;
    }
}
