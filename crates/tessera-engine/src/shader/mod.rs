//! Shader descriptors and the program runtime that compiles and binds them.

mod descriptor;
mod library;
mod program;

pub use descriptor::{Attribute, ComponentType, ShaderDescriptor, Uniform};
pub use library::{ShaderId, PRIMITIVE, SPRITE, SPRITES};
pub use program::{
    compile, AttributeBinding, CompiledProgram, ProgramLayout, ProgramRuntime, UniformBinding,
    UniformValue,
};
