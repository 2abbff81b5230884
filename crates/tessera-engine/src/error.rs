use thiserror::Error;

/// Errors surfaced by the rendering core.
///
/// Batch capacity overflow and degenerate clip rects are not errors; they are
/// handled by flushing and by drawing nothing, respectively.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The device rejected a program's vertex or fragment source. The program
    /// stays unusable until the renderer is given a working descriptor.
    #[error("shader `{name}` failed to compile:\n{log}")]
    ShaderCompile { name: &'static str, log: String },

    #[error("shader `{program}` has no uniform named `{name}`")]
    UnknownUniform { program: &'static str, name: String },

    #[error("shader `{program}` has no attribute named `{name}`")]
    UnknownAttribute { program: &'static str, name: String },

    #[error(
        "uniform `{name}` of shader `{program}` expects {expected} components, got {actual}"
    )]
    UniformTypeMismatch {
        program: &'static str,
        name: &'static str,
        expected: u8,
        actual: u8,
    },

    #[error("attribute `{name}` of shader `{program}` uses an unsupported encoding")]
    UnsupportedAttribute { program: &'static str, name: &'static str },

    #[error("uniform `{name}` of shader `{program}` uses an unsupported type")]
    UnsupportedUniform { program: &'static str, name: &'static str },

    #[error("batch vertex stride {batch} does not match shader `{program}` stride {program_stride}")]
    StrideMismatch {
        program: &'static str,
        batch: u32,
        program_stride: u32,
    },

    #[error("draw command has {vertices} vertices; at most {max} can be indexed")]
    GeometryTooLarge { vertices: usize, max: usize },

    #[error("invalid texture size {width}x{height}")]
    InvalidTextureSize { width: u32, height: u32 },

    #[error("unknown texture id {0}")]
    UnknownTexture(u32),
}
