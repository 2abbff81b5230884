/// Scalar type of one attribute or uniform component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ComponentType {
    Float,
    UnsignedByte,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            ComponentType::Float => 4,
            ComponentType::UnsignedByte => 1,
        }
    }
}

/// One per-vertex input of a shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub component_type: ComponentType,
    pub component_count: u8,
    /// Integer data is mapped to `[0, 1]` when read by the shader.
    pub normalized: bool,
}

impl Attribute {
    #[inline]
    pub const fn float(name: &'static str, component_count: u8) -> Self {
        Self { name, component_type: ComponentType::Float, component_count, normalized: false }
    }

    /// A packed RGBA color word read as a normalized `vec4`.
    #[inline]
    pub const fn packed_color(name: &'static str) -> Self {
        Self {
            name,
            component_type: ComponentType::UnsignedByte,
            component_count: 4,
            normalized: true,
        }
    }

    /// Whether this attribute is a group of normalized bytes. Such a group
    /// always occupies one 4-byte word.
    #[inline]
    pub const fn is_normalized_bytes(&self) -> bool {
        self.normalized && matches!(self.component_type, ComponentType::UnsignedByte)
    }

    /// Bytes occupied inside one interleaved vertex record.
    #[inline]
    pub const fn byte_size(&self) -> u32 {
        if self.is_normalized_bytes() {
            4
        } else {
            self.component_count as u32 * self.component_type.size()
        }
    }

    /// Component count handed to the device when configuring the pointer.
    #[inline]
    pub const fn pointer_size(&self) -> u8 {
        if self.is_normalized_bytes() { 4 } else { self.component_count }
    }
}

/// One named uniform of a shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Uniform {
    pub name: &'static str,
    pub component_type: ComponentType,
    pub component_count: u8,
}

impl Uniform {
    #[inline]
    pub const fn float(name: &'static str, component_count: u8) -> Self {
        Self { name, component_type: ComponentType::Float, component_count }
    }
}

/// Declarative description of one shader program.
///
/// Descriptors are immutable static data; a single generic runtime compiles
/// and binds all of them (see [`ProgramRuntime`](super::ProgramRuntime)).
///
/// The attribute order fixes each attribute's byte offset inside the
/// interleaved vertex record, and its binding location.
#[derive(Debug, PartialEq)]
pub struct ShaderDescriptor {
    /// Unique key.
    pub name: &'static str,
    pub vertex_source: &'static [&'static str],
    pub fragment_source: &'static [&'static str],
    pub attributes: &'static [Attribute],
    pub uniforms: &'static [Uniform],
    /// The fragment stage samples one bound texture.
    pub textured: bool,
}

impl ShaderDescriptor {
    /// Vertex source lines joined with `\n`.
    pub fn vertex_source(&self) -> String {
        self.vertex_source.join("\n")
    }

    /// Fragment source lines joined with `\n`.
    pub fn fragment_source(&self) -> String {
        self.fragment_source.join("\n")
    }

    /// Sum of attribute byte sizes.
    pub fn vertex_stride(&self) -> u32 {
        self.attributes.iter().map(Attribute::byte_size).sum()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_bytes_take_one_word_regardless_of_channel_count() {
        let one = Attribute {
            name: "aColor",
            component_type: ComponentType::UnsignedByte,
            component_count: 1,
            normalized: true,
        };
        assert_eq!(one.byte_size(), 4);
        assert_eq!(one.pointer_size(), 4);
        assert_eq!(Attribute::packed_color("aColor").byte_size(), 4);
    }

    #[test]
    fn float_attributes_scale_with_count() {
        assert_eq!(Attribute::float("aPosition", 2).byte_size(), 8);
        assert_eq!(Attribute::float("aPosition", 3).byte_size(), 12);
    }

    #[test]
    fn stride_is_sum_of_sizes() {
        static ATTRS: [Attribute; 3] = [
            Attribute::float("aPosition", 2),
            Attribute::float("aTexCoord", 2),
            Attribute::packed_color("aColor"),
        ];
        let d = ShaderDescriptor {
            name: "t",
            vertex_source: &["a", "b"],
            fragment_source: &["c"],
            attributes: &ATTRS,
            uniforms: &[],
            textured: false,
        };
        assert_eq!(d.vertex_stride(), 20);
        assert_eq!(d.vertex_source(), "a\nb");
    }
}
