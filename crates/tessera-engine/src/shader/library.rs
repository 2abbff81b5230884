//! The fixed shader family: `primitive`, `sprite` and `sprites`.
//!
//! Sources are WGSL. The vertex part declares the uniform block
//! (group 0, binding 0) and the shared `VsOut` struct; the fragment part
//! declares the texture (group 1) when the program is textured. Every vertex
//! stage maps logical pixels to clip space with
//! `position / uProjection + vec2(-1.0, 1.0)`.

use super::descriptor::{Attribute, ShaderDescriptor, Uniform};

const PROJECTION: Uniform = Uniform::float("uProjection", 2);

/// Untextured triangles with a per-vertex packed color.
pub static PRIMITIVE: ShaderDescriptor = ShaderDescriptor {
    name: "primitive",
    vertex_source: &[
        "struct Uniforms {",
        "    uProjection: vec2<f32>,",
        "};",
        "@group(0) @binding(0) var<uniform> u: Uniforms;",
        "",
        "struct VsIn {",
        "    @location(0) aPosition: vec2<f32>,",
        "    @location(1) aColor: vec4<f32>,",
        "};",
        "",
        "struct VsOut {",
        "    @builtin(position) position: vec4<f32>,",
        "    @location(0) vColor: vec4<f32>,",
        "};",
        "",
        "@vertex",
        "fn vs_main(input: VsIn) -> VsOut {",
        "    var out: VsOut;",
        "    out.position = vec4<f32>(input.aPosition / u.uProjection + vec2<f32>(-1.0, 1.0), 0.0, 1.0);",
        "    out.vColor = input.aColor;",
        "    return out;",
        "}",
    ],
    fragment_source: &[
        "@fragment",
        "fn fs_main(input: VsOut) -> @location(0) vec4<f32> {",
        "    return input.vColor;",
        "}",
    ],
    attributes: &[Attribute::float("aPosition", 2), Attribute::packed_color("aColor")],
    uniforms: &[PROJECTION],
    textured: false,
};

const TEXTURED_VERTEX: &[&str] = &[
    "struct Uniforms {",
    "    uProjection: vec2<f32>,",
    "};",
    "@group(0) @binding(0) var<uniform> u: Uniforms;",
    "",
    "struct VsIn {",
    "    @location(0) aPosition: vec2<f32>,",
    "    @location(1) aTexCoord: vec2<f32>,",
    "    @location(2) aColor: vec4<f32>,",
    "};",
    "",
    "struct VsOut {",
    "    @builtin(position) position: vec4<f32>,",
    "    @location(0) vTexCoord: vec2<f32>,",
    "    @location(1) vColor: vec4<f32>,",
    "};",
    "",
    "@vertex",
    "fn vs_main(input: VsIn) -> VsOut {",
    "    var out: VsOut;",
    "    out.position = vec4<f32>(input.aPosition / u.uProjection + vec2<f32>(-1.0, 1.0), 0.0, 1.0);",
    "    out.vTexCoord = input.aTexCoord;",
    "    out.vColor = input.aColor;",
    "    return out;",
    "}",
];

const TEXTURED_ATTRIBUTES: &[Attribute] = &[
    Attribute::float("aPosition", 2),
    Attribute::float("aTexCoord", 2),
    Attribute::packed_color("aColor"),
];

/// Textured quads tinted by a per-vertex packed color.
///
/// Texels are straight alpha and premultiplied in the fragment stage.
pub static SPRITE: ShaderDescriptor = ShaderDescriptor {
    name: "sprite",
    vertex_source: TEXTURED_VERTEX,
    fragment_source: &[
        "@group(1) @binding(0) var uSampler: texture_2d<f32>;",
        "@group(1) @binding(1) var uSamplerState: sampler;",
        "",
        "@fragment",
        "fn fs_main(input: VsOut) -> @location(0) vec4<f32> {",
        "    let texel = textureSample(uSampler, uSamplerState, input.vTexCoord);",
        "    return vec4<f32>(texel.rgb * texel.a, texel.a) * input.vColor;",
        "}",
    ],
    attributes: TEXTURED_ATTRIBUTES,
    uniforms: &[PROJECTION],
    textured: true,
};

/// Bulk quads from a coverage atlas (glyphs, masks).
///
/// Only the texel alpha is read; it scales the vertex color.
pub static SPRITES: ShaderDescriptor = ShaderDescriptor {
    name: "sprites",
    vertex_source: TEXTURED_VERTEX,
    fragment_source: &[
        "@group(1) @binding(0) var uSampler: texture_2d<f32>;",
        "@group(1) @binding(1) var uSamplerState: sampler;",
        "",
        "@fragment",
        "fn fs_main(input: VsOut) -> @location(0) vec4<f32> {",
        "    let coverage = textureSample(uSampler, uSamplerState, input.vTexCoord).a;",
        "    return input.vColor * coverage;",
        "}",
    ],
    attributes: TEXTURED_ATTRIBUTES,
    uniforms: &[PROJECTION],
    textured: true,
};

/// Identifies one program of the fixed family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ShaderId {
    Primitive,
    Sprite,
    Sprites,
}

impl ShaderId {
    pub const ALL: [ShaderId; 3] = [ShaderId::Primitive, ShaderId::Sprite, ShaderId::Sprites];

    #[inline]
    pub fn descriptor(self) -> &'static ShaderDescriptor {
        match self {
            ShaderId::Primitive => &PRIMITIVE,
            ShaderId::Sprite => &SPRITE,
            ShaderId::Sprites => &SPRITES,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = ShaderId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ShaderId::ALL.len());
    }

    #[test]
    fn strides_match_vertex_structs() {
        assert_eq!(PRIMITIVE.vertex_stride(), 12);
        assert_eq!(SPRITE.vertex_stride(), 20);
        assert_eq!(SPRITES.vertex_stride(), 20);
    }

    #[test]
    fn every_vertex_stage_applies_the_projection() {
        for id in ShaderId::ALL {
            let src = id.descriptor().vertex_source();
            assert!(
                src.contains("/ u.uProjection + vec2<f32>(-1.0, 1.0)"),
                "{} does not project",
                id.name()
            );
        }
    }

    #[test]
    fn attributes_appear_in_vertex_source_at_their_location() {
        for id in ShaderId::ALL {
            let d = id.descriptor();
            let src = d.vertex_source();
            for (i, attr) in d.attributes.iter().enumerate() {
                let decl = format!("@location({i}) {}:", attr.name);
                assert!(src.contains(&decl), "{}: missing `{decl}`", d.name);
            }
        }
    }

    #[test]
    fn textured_programs_declare_a_sampler() {
        for id in ShaderId::ALL {
            let d = id.descriptor();
            assert_eq!(d.textured, d.fragment_source().contains("texture_2d"), "{}", d.name);
        }
    }
}
