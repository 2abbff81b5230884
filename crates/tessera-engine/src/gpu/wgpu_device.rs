use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use crate::coords::{Rect, Viewport};
use crate::error::RenderError;
use crate::math::is_power_of_two;
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::{AttributeBinding, ComponentType, ProgramLayout, UniformBinding, UniformValue};

use super::{GraphicsDevice, ProgramHandle, Texture, TextureId};

// ── blend ─────────────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a logical-pixel clip rect to physical scissor rect arguments for wgpu.
///
/// Returns `None` if the clip rect is zero-area (the draw is skipped).
/// Returns `Some((x, y, w, h))` in physical pixels, clamped to the viewport.
///
/// `clip = None` means "no scissor" → returns the full viewport rect.
fn logical_clip_to_scissor(
    clip: Option<Rect>,
    viewport: Viewport,
    scale: f32,
) -> Option<(u32, u32, u32, u32)> {
    let phys_vw = (viewport.width * scale).max(1.0) as u32;
    let phys_vh = (viewport.height * scale).max(1.0) as u32;

    let (x, y, w, h) = match clip {
        None => (0, 0, phys_vw, phys_vh),
        Some(r) => {
            let x  = ((r.origin.x * scale).max(0.0) as u32).min(phys_vw);
            let y  = ((r.origin.y * scale).max(0.0) as u32).min(phys_vh);
            let x2 = (((r.origin.x + r.size.x) * scale).max(0.0) as u32).min(phys_vw);
            let y2 = (((r.origin.y + r.size.y) * scale).max(0.0) as u32).min(phys_vh);
            (x, y, x2.saturating_sub(x), y2.saturating_sub(y))
        }
    };

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}

fn vertex_format(attr: &AttributeBinding) -> Option<wgpu::VertexFormat> {
    match (attr.component_type, attr.size, attr.normalized) {
        (ComponentType::Float, 1, false) => Some(wgpu::VertexFormat::Float32),
        (ComponentType::Float, 2, false) => Some(wgpu::VertexFormat::Float32x2),
        (ComponentType::Float, 3, false) => Some(wgpu::VertexFormat::Float32x3),
        (ComponentType::Float, 4, false) => Some(wgpu::VertexFormat::Float32x4),
        (ComponentType::UnsignedByte, 4, true) => Some(wgpu::VertexFormat::Unorm8x4),
        (ComponentType::UnsignedByte, 4, false) => Some(wgpu::VertexFormat::Uint8x4),
        _ => None,
    }
}

// ── resources ─────────────────────────────────────────────────────────────

struct GpuProgram {
    name: &'static str,
    pipeline: wgpu::RenderPipeline,
    textured: bool,

    /// CPU copy of the uniform block; snapshotted into the frame uniform
    /// buffer at every draw.
    uniform_block: Vec<u8>,

    /// Binds the frame uniform buffer with a dynamic offset.
    bind_group: Option<wgpu::BindGroup>,
    bind_group_generation: u64,
}

struct GpuTexture {
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// One recorded draw, replayed in `encode`.
struct DrawOp {
    program: ProgramHandle,
    texture: Option<TextureId>,
    scissor: Option<Rect>,
    vertex_bytes: Range<u64>,
    indices: Range<u32>,
    uniform_offset: u32,
}

/// Growable GPU buffer (power-of-two capacity, like the shape renderers' instance buffers).
struct FrameBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl FrameBuffer {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self { label, usage, buffer: None, capacity: 0 }
    }

    /// Returns `true` if the buffer was (re)allocated.
    fn ensure_capacity(&mut self, device: &wgpu::Device, required: u64) -> bool {
        if required <= self.capacity && self.buffer.is_some() {
            return false;
        }
        let new_cap = required.next_power_of_two().max(4096);
        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: new_cap,
            usage: self.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = new_cap;
        true
    }
}

// ── device ────────────────────────────────────────────────────────────────

/// [`GraphicsDevice`] backed by wgpu.
///
/// Programs become render pipelines (premultiplied alpha blending, triangle
/// lists). Draw calls are recorded with a snapshot of the state they were
/// issued under and replayed into a single render pass by
/// [`encode`](Self::encode), after all vertex, index and uniform data for the
/// frame has been uploaded in one write per buffer.
///
/// Bind group layout shared by every program:
/// - group 0, binding 0: uniform block (dynamic offset)
/// - group 1, binding 0/1: texture + sampler (textured programs only)
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    uniform_bgl: wgpu::BindGroupLayout,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_alignment: u64,

    programs: HashMap<ProgramHandle, GpuProgram>,
    next_program: u32,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u32,

    current_program: Option<ProgramHandle>,
    current_texture: Option<TextureId>,
    current_scissor: Option<Rect>,

    ops: Vec<DrawOp>,
    vertex_data: Vec<u8>,
    index_data: Vec<u16>,
    uniform_data: Vec<u8>,

    vertex_buffer: FrameBuffer,
    index_buffer: FrameBuffer,
    uniform_buffer: FrameBuffer,
    uniform_generation: u64,

    warned_untextured: bool,
}

impl WgpuDevice {
    pub fn new(ctx: &RenderCtx<'_>) -> Self {
        let device = ctx.device.clone();

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment.max(16) as u64;

        Self {
            device,
            queue: ctx.queue.clone(),
            surface_format: ctx.surface_format,
            uniform_bgl,
            texture_bgl,
            sampler,
            uniform_alignment,
            programs: HashMap::new(),
            next_program: 0,
            textures: HashMap::new(),
            next_texture: 0,
            current_program: None,
            current_texture: None,
            current_scissor: None,
            ops: Vec::new(),
            vertex_data: Vec::new(),
            index_data: Vec::new(),
            uniform_data: Vec::new(),
            vertex_buffer: FrameBuffer::new("tessera vertex buffer", wgpu::BufferUsages::VERTEX),
            index_buffer: FrameBuffer::new("tessera index buffer", wgpu::BufferUsages::INDEX),
            uniform_buffer: FrameBuffer::new("tessera uniform buffer", wgpu::BufferUsages::UNIFORM),
            uniform_generation: 0,
            warned_untextured: false,
        }
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Uploads straight-alpha RGBA8 pixels as a sampled texture.
    ///
    /// Non-power-of-two sizes are accepted (no mipmaps are generated) but
    /// logged, since some targets restrict them.
    pub fn create_texture(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<Texture, RenderError> {
        if width == 0 || height == 0 || rgba.len() != width as usize * height as usize * 4 {
            return Err(RenderError::InvalidTextureSize { width, height });
        }
        if !is_power_of_two(width) || !is_power_of_two(height) {
            log::warn!("texture {width}x{height} is not a power of two; mipmaps and wrapping may be unavailable");
        }

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera texture bind group"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, GpuTexture { _texture: texture, bind_group, width, height });

        log::debug!("created texture {id:?} ({width}x{height})");
        Ok(Texture { id, width, height })
    }

    pub fn texture(&self, id: TextureId) -> Option<Texture> {
        self.textures.get(&id).map(|t| Texture { id, width: t.width, height: t.height })
    }

    pub fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        if self.current_texture == Some(id) {
            self.current_texture = None;
        }
    }

    /// Number of draws recorded since the last [`encode`](Self::encode).
    #[inline]
    pub fn pending_draws(&self) -> usize {
        self.ops.len()
    }

    /// Uploads the frame's vertex/index/uniform data and replays every
    /// recorded draw into one render pass on `target`.
    ///
    /// The pass loads existing contents; clearing is the frame driver's job.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>, viewport: Viewport, scale_factor: f32) {
        if self.ops.is_empty() {
            return;
        }

        // wgpu copies must be 4-byte multiples.
        if self.index_data.len() % 2 == 1 {
            self.index_data.push(0);
        }

        self.vertex_buffer.ensure_capacity(&self.device, self.vertex_data.len() as u64);
        self.index_buffer
            .ensure_capacity(&self.device, (self.index_data.len() * 2) as u64);
        if self.uniform_buffer.ensure_capacity(&self.device, self.uniform_data.len() as u64) {
            self.uniform_generation += 1;
        }

        // Mutating work (uploads, bind group rebuilds) before immutable borrows.
        if let Some(vb) = self.vertex_buffer.buffer.as_ref() {
            self.queue.write_buffer(vb, 0, &self.vertex_data);
        }
        if let Some(ib) = self.index_buffer.buffer.as_ref() {
            self.queue.write_buffer(ib, 0, bytemuck::cast_slice(&self.index_data));
        }
        if let Some(ub) = self.uniform_buffer.buffer.as_ref() {
            self.queue.write_buffer(ub, 0, &self.uniform_data);
        }
        self.ensure_uniform_bind_groups();

        let Some(vertex_buffer) = self.vertex_buffer.buffer.as_ref() else { return };
        let Some(index_buffer) = self.index_buffer.buffer.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessera batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        let mut active_pipeline: Option<ProgramHandle> = None;
        for op in &self.ops {
            let Some(program) = self.programs.get(&op.program) else { continue };
            let Some(uniforms) = program.bind_group.as_ref() else { continue };

            let Some((sx, sy, sw, sh)) =
                logical_clip_to_scissor(op.scissor, viewport, scale_factor)
            else {
                continue;
            };

            if active_pipeline != Some(op.program) {
                rpass.set_pipeline(&program.pipeline);
                active_pipeline = Some(op.program);
            }
            rpass.set_bind_group(0, uniforms, &[op.uniform_offset]);
            if program.textured {
                let Some(texture) = op.texture.and_then(|id| self.textures.get(&id)) else {
                    continue;
                };
                rpass.set_bind_group(1, &texture.bind_group, &[]);
            }

            rpass.set_scissor_rect(sx, sy, sw, sh);
            rpass.set_vertex_buffer(0, vertex_buffer.slice(op.vertex_bytes.clone()));
            rpass.draw_indexed(op.indices.clone(), 0, 0..1);
        }
        drop(rpass);

        log::trace!("encoded {} draws", self.ops.len());
        self.discard_frame();
    }

    /// Drops recorded draws and staged data without drawing.
    pub fn discard_frame(&mut self) {
        self.ops.clear();
        self.vertex_data.clear();
        self.index_data.clear();
        self.uniform_data.clear();
    }

    fn ensure_uniform_bind_groups(&mut self) {
        let Some(buffer) = self.uniform_buffer.buffer.as_ref() else { return };

        for program in self.programs.values_mut() {
            if program.bind_group.is_some() && program.bind_group_generation == self.uniform_generation {
                continue;
            }
            program.bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera uniforms bind group"),
                layout: &self.uniform_bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(program.uniform_block.len() as u64),
                    }),
                }],
            }));
            program.bind_group_generation = self.uniform_generation;
        }
    }

    fn build_pipeline(&self, layout: &ProgramLayout, module: &wgpu::ShaderModule) -> Option<wgpu::RenderPipeline> {
        let mut attributes = Vec::with_capacity(layout.attributes.len());
        for attr in &layout.attributes {
            attributes.push(wgpu::VertexAttribute {
                format: vertex_format(attr)?,
                offset: attr.offset as u64,
                shader_location: attr.location,
            });
        }

        let label = layout.name();
        let mut bind_group_layouts = vec![&self.uniform_bgl];
        if layout.descriptor.textured {
            bind_group_layouts.push(&self.texture_bgl);
        }

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        Some(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_program(&mut self, layout: &ProgramLayout) -> Result<ProgramHandle, RenderError> {
        let name = layout.name();
        let source = format!(
            "{}\n{}",
            layout.descriptor.vertex_source(),
            layout.descriptor.fragment_source()
        );

        // Capture validation errors instead of hitting the uncaptured-error handler.
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = self.build_pipeline(layout, &module);

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(RenderError::ShaderCompile { name, log: err.to_string() });
        }
        let Some(pipeline) = pipeline else {
            return Err(RenderError::ShaderCompile {
                name,
                log: "vertex layout has no wgpu vertex format".to_string(),
            });
        };

        let handle = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.programs.insert(
            handle,
            GpuProgram {
                name,
                pipeline,
                textured: layout.descriptor.textured,
                uniform_block: vec![0; layout.uniform_block_size as usize],
                bind_group: None,
                bind_group_generation: 0,
            },
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(p) = self.programs.remove(&program) {
            log::debug!("deleted program `{}`", p.name);
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
    }

    fn bind_attributes(&mut self, _program: ProgramHandle, _layout: &ProgramLayout) {
        // Vertex attributes are baked into the pipeline's vertex buffer layout.
    }

    fn set_uniform(&mut self, program: ProgramHandle, binding: &UniformBinding, value: UniformValue) {
        let Some(p) = self.programs.get_mut(&program) else { return };
        let bytes: &[u8] = bytemuck::cast_slice(value.as_slice());
        let start = binding.location as usize;
        if let Some(dst) = p.uniform_block.get_mut(start..start + bytes.len()) {
            dst.copy_from_slice(bytes);
        }
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), RenderError> {
        match texture {
            Some(id) if !self.textures.contains_key(&id) => Err(RenderError::UnknownTexture(id.0)),
            _ => {
                self.current_texture = texture;
                Ok(())
            }
        }
    }

    fn set_scissor(&mut self, clip: Option<Rect>) {
        self.current_scissor = clip;
    }

    fn draw_indexed(&mut self, vertices: &[u8], indices: &[u16]) {
        let Some(program) = self.current_program else { return };
        let Some(p) = self.programs.get(&program) else { return };
        if vertices.is_empty() || indices.is_empty() {
            return;
        }
        if p.textured && self.current_texture.is_none() {
            if !self.warned_untextured {
                log::warn!("program `{}` drawn without a bound texture; draw skipped", p.name);
                self.warned_untextured = true;
            }
            return;
        }

        let vertex_start = self.vertex_data.len() as u64;
        self.vertex_data.extend_from_slice(vertices);

        let first_index = self.index_data.len() as u32;
        self.index_data.extend_from_slice(indices);

        let uniform_offset = (self.uniform_data.len() as u64).next_multiple_of(self.uniform_alignment);
        self.uniform_data.resize(uniform_offset as usize, 0);
        self.uniform_data.extend_from_slice(&p.uniform_block);

        self.ops.push(DrawOp {
            program,
            texture: self.current_texture,
            scissor: self.current_scissor,
            vertex_bytes: vertex_start..self.vertex_data.len() as u64,
            indices: first_index..first_index + indices.len() as u32,
            uniform_offset: uniform_offset as u32,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scissor_none_covers_viewport() {
        let s = logical_clip_to_scissor(None, Viewport::new(100.0, 50.0), 2.0);
        assert_eq!(s, Some((0, 0, 200, 100)));
    }

    #[test]
    fn scissor_is_clamped_and_scaled() {
        let clip = Rect::new(-10.0, 10.0, 60.0, 100.0);
        let s = logical_clip_to_scissor(Some(clip), Viewport::new(100.0, 50.0), 1.0);
        assert_eq!(s, Some((0, 10, 50, 40)));
    }

    #[test]
    fn zero_area_scissor_skips() {
        let clip = Rect::new(10.0, 10.0, 0.0, 5.0);
        assert_eq!(logical_clip_to_scissor(Some(clip), Viewport::new(100.0, 50.0), 1.0), None);
    }

    #[test]
    fn vertex_formats_for_the_shader_family() {
        for id in crate::shader::ShaderId::ALL {
            let layout = ProgramLayout::from_descriptor(id.descriptor()).unwrap();
            for attr in &layout.attributes {
                assert!(vertex_format(attr).is_some(), "{}: {}", layout.name(), attr.name);
            }
        }
    }

    // ── device (skipped when no adapter is available) ─────────────────────

    static BROKEN: crate::shader::ShaderDescriptor = crate::shader::ShaderDescriptor {
        name: "broken",
        vertex_source: &[
            "@vertex",
            "fn vs_main(@location(0) aPosition: vec2<f32>) -> @builtin(position) vec4<f32> {",
            "    return vec4<f32>(aPosition, undefined_depth, 1.0);",
            "}",
        ],
        fragment_source: &[
            "@fragment",
            "fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        ],
        attributes: &[crate::shader::Attribute::float("aPosition", 2)],
        uniforms: &[],
        textured: false,
    };

    fn headless() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).ok()?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
    }

    fn with_device(test: impl FnOnce(&mut WgpuDevice)) {
        let Some((device, queue)) = headless() else {
            eprintln!("no GPU adapter; skipping");
            return;
        };
        let ctx = RenderCtx::new(
            &device,
            &queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            Viewport::new(64.0, 64.0),
            1.0,
        );
        test(&mut WgpuDevice::new(&ctx));
    }

    #[test]
    fn invalid_wgsl_becomes_a_compile_error() {
        with_device(|dev| {
            let layout = ProgramLayout::from_descriptor(&BROKEN).unwrap();
            match dev.create_program(&layout) {
                Err(RenderError::ShaderCompile { name, log }) => {
                    assert_eq!(name, "broken");
                    assert!(!log.is_empty());
                }
                other => panic!("expected a compile error, got {other:?}"),
            }

            // The scope is closed: a valid program still compiles afterwards.
            let layout = ProgramLayout::from_descriptor(crate::shader::ShaderId::Primitive.descriptor()).unwrap();
            assert!(dev.create_program(&layout).is_ok());
        });
    }

    #[test]
    fn textures_are_tracked_until_destroyed() {
        with_device(|dev| {
            let tex = dev.create_texture(&[255; 4 * 4 * 4], 4, 4).unwrap();
            assert_eq!(dev.texture(tex.id), Some(tex));
            assert_eq!(dev.pending_draws(), 0);

            dev.destroy_texture(tex.id);
            assert_eq!(dev.texture(tex.id), None);
            assert_eq!(
                dev.create_texture(&[0; 3], 1, 1).unwrap_err(),
                RenderError::InvalidTextureSize { width: 1, height: 1 }
            );
        });
    }
}
