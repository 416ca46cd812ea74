use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};

use crate::coords::ScissorRect;
use crate::render::{RenderCtx, RenderTarget};

use super::{
    BatchVertex, DrawMode, ImmediateBatch, PixelFormat, Rasterizer, TextureError, TextureId,
    TextureRegistry,
};

/// Configuration for [`ImmediateRenderer`].
#[derive(Debug, Clone)]
pub struct ImmediateConfig {
    /// Filter used when sampling every texture.
    pub filter: wgpu::FilterMode,

    /// Vertices reserved up front in the CPU batch and the GPU vertex buffer.
    pub initial_vertex_capacity: usize,
}

impl Default for ImmediateConfig {
    fn default() -> Self {
        Self {
            filter: wgpu::FilterMode::Linear,
            initial_vertex_capacity: 4096,
        }
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct Pipelines {
    format: wgpu::TextureFormat,
    cull_none: wgpu::RenderPipeline,
    cull_back: wgpu::RenderPipeline,
}

/// wgpu implementation of [`Rasterizer`].
///
/// Calls made during the frame only touch the CPU batch and the texture
/// registry. [`render`](Self::render) uploads queued textures, encodes every
/// recorded draw call into one pass over the target, then clears the batch.
pub struct ImmediateRenderer {
    config: ImmediateConfig,
    batch: ImmediateBatch,
    registry: TextureRegistry,

    // pipeline state (layouts are device-bound, pipelines format-bound)
    frame_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    pipelines: Option<Pipelines>,

    // bindings
    frame_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,
    sampler: Option<wgpu::Sampler>,
    white: Option<GpuTexture>,
    textures: HashMap<TextureId, GpuTexture>,

    // geometry
    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,

    warned_missing: HashSet<TextureId>,
}

impl Default for ImmediateRenderer {
    fn default() -> Self {
        Self::new(ImmediateConfig::default())
    }
}

impl ImmediateRenderer {
    pub fn new(config: ImmediateConfig) -> Self {
        Self {
            batch: ImmediateBatch::with_capacity(config.initial_vertex_capacity),
            registry: TextureRegistry::default(),
            config,
            frame_bgl: None,
            texture_bgl: None,
            pipelines: None,
            frame_ubo: None,
            frame_bind_group: None,
            sampler: None,
            white: None,
            textures: HashMap::new(),
            vbo: None,
            vbo_capacity: 0,
            warned_missing: HashSet::new(),
        }
    }

    /// Geometry recorded since the last [`render`](Self::render).
    #[inline]
    pub fn batch(&self) -> &ImmediateBatch {
        &self.batch
    }

    #[inline]
    pub fn textures(&self) -> &TextureRegistry {
        &self.registry
    }

    /// Drops the geometry recorded this frame without drawing it.
    ///
    /// Call when a frame is skipped (minimized window, lost surface) so the next
    /// frame starts from an empty batch. Queued texture uploads and releases stay
    /// pending until the next [`render`](Self::render).
    pub fn discard_frame(&mut self) {
        if !self.batch.is_empty() {
            log::trace!(
                "discarding {} undrawn immediate vertices",
                self.batch.vertices().len()
            );
        }
        self.batch.clear();
    }

    /// Encodes the recorded geometry into `target` and resets the batch.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.ensure_layouts(ctx);
        self.ensure_pipelines(ctx);
        self.ensure_bindings(ctx);
        self.upload_pending(ctx);

        if !self.batch.is_empty() {
            if ctx.viewport.is_valid() {
                self.write_frame_uniform(ctx);
                self.ensure_vertex_capacity(ctx, self.batch.vertices().len());
                self.encode(ctx, target);
            } else {
                log::trace!("skipping immediate pass for invalid viewport {:?}", ctx.viewport);
            }
        }

        self.batch.clear();

        // Released after encoding: this frame's draws may still reference them.
        for id in self.registry.take_releases() {
            self.textures.remove(&id);
            self.warned_missing.remove(&id);
        }
    }

    fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let Some(vbo) = self.vbo.as_ref() else { return };
        ctx.queue
            .write_buffer(vbo, 0, bytemuck::cast_slice(self.batch.vertices()));

        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(frame_bind_group) = self.frame_bind_group.as_ref() else { return };
        let Some(white) = self.white.as_ref() else { return };

        let (target_w, target_h) = ctx.target_size;
        if target_w == 0 || target_h == 0 {
            return;
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel immediate pass"),
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

        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_bind_group(0, frame_bind_group, &[]);

        for draw in self.batch.draw_calls() {
            let (x, y, w, h) = match draw.scissor {
                None => (0, 0, target_w, target_h),
                Some(rect) => match rect.to_top_left(target_w, target_h) {
                    Some(r) => r,
                    None => continue,
                },
            };

            let bind_group = match draw.texture {
                None => &white.bind_group,
                Some(id) => match self.textures.get(&id) {
                    Some(t) => &t.bind_group,
                    None => {
                        if self.warned_missing.insert(id) {
                            log::warn!("draw references unknown texture {}; using white", id.get());
                        }
                        &white.bind_group
                    }
                },
            };

            let pipeline = if draw.cull_back_faces {
                &pipelines.cull_back
            } else {
                &pipelines.cull_none
            };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, bind_group, &[]);
            rpass.set_scissor_rect(x, y, w, h);
            rpass.draw(draw.first_vertex..draw.first_vertex + draw.vertex_count, 0..1);
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.frame_bgl.is_some() && self.texture_bgl.is_some() {
            return;
        }

        let frame_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel immediate frame bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<FrameUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel immediate texture bgl"),
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

        self.frame_bgl = Some(frame_bgl);
        self.texture_bgl = Some(texture_bgl);
        self.pipelines = None;
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.format == ctx.surface_format)
        {
            return;
        }
        let Some(frame_bgl) = self.frame_bgl.as_ref() else { return };
        let Some(texture_bgl) = self.texture_bgl.as_ref() else { return };

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel immediate shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/immediate.wgsl").into()),
        });

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel immediate pipeline layout"),
            bind_group_layouts: &[frame_bgl, texture_bgl],
            immediate_size: 0,
        });

        let build = |label: &str, cull_mode: Option<wgpu::Face>| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(straight_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let pipelines = Pipelines {
            format: ctx.surface_format,
            cull_none: build("tessel immediate pipeline (no cull)", None),
            cull_back: build("tessel immediate pipeline (cull back)", Some(wgpu::Face::Back)),
        };

        log::debug!("immediate pipelines built for {:?}", ctx.surface_format);
        self.pipelines = Some(pipelines);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("tessel immediate sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: self.config.filter,
                min_filter: self.config.filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        if self.frame_bind_group.is_none() {
            let Some(frame_bgl) = self.frame_bgl.as_ref() else { return };

            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel immediate frame ubo"),
                size: std::mem::size_of::<FrameUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            self.frame_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessel immediate frame bind group"),
                layout: frame_bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            }));
            self.frame_ubo = Some(ubo);
        }

        if self.white.is_none() {
            self.white = self.create_texture(ctx, "tessel white texture", 1, 1, &[255; 4]);
        }
    }

    fn upload_pending(&mut self, ctx: &RenderCtx<'_>) {
        for upload in self.registry.take_uploads() {
            if let Some(texture) =
                self.create_texture(ctx, "tessel immediate texture", upload.width, upload.height, &upload.rgba)
            {
                self.textures.insert(upload.id, texture);
                self.warned_missing.remove(&upload.id);
            }
        }
    }

    fn create_texture(
        &self,
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Option<GpuTexture> {
        let texture_bgl = self.texture_bgl.as_ref()?;
        let sampler = self.sampler.as_ref()?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(ctx.surface_format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
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
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Some(GpuTexture {
            _texture: texture,
            bind_group,
        })
    }

    fn write_frame_uniform(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.frame_ubo.as_ref() else { return };
        let uniform = FrameUniform {
            viewport: [ctx.viewport.width, ctx.viewport.height],
            linearize: if ctx.surface_format.is_srgb() { 1.0 } else { 0.0 },
            _pad: 0.0,
        };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let new_cap = required
            .next_power_of_two()
            .max(self.config.initial_vertex_capacity.max(64));
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel immediate vbo"),
            size: (new_cap * std::mem::size_of::<BatchVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
        log::debug!("immediate vertex buffer grown to {new_cap} vertices");
    }
}

impl Rasterizer for ImmediateRenderer {
    fn begin(&mut self, mode: DrawMode) {
        self.batch.begin(mode);
    }

    fn end(&mut self) {
        self.batch.end();
    }

    fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.batch.color4ub(r, g, b, a);
    }

    fn tex_coord2f(&mut self, u: f32, v: f32) {
        self.batch.tex_coord2f(u, v);
    }

    fn vertex2f(&mut self, x: f32, y: f32) {
        self.batch.vertex2f(x, y);
    }

    fn set_texture(&mut self, texture: Option<TextureId>) {
        self.batch.set_texture(texture);
    }

    fn enable_scissor_test(&mut self) {
        self.batch.set_scissor_test(true);
    }

    fn disable_scissor_test(&mut self) {
        self.batch.set_scissor_test(false);
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.batch.scissor(ScissorRect::new(x, y, width, height));
    }

    fn enable_backface_culling(&mut self) {
        self.batch.set_backface_culling(true);
    }

    fn disable_backface_culling(&mut self) {
        self.batch.set_backface_culling(false);
    }

    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        mip_levels: u32,
    ) -> Result<TextureId, TextureError> {
        self.registry.load(pixels, width, height, format, mip_levels)
    }

    fn unload_texture(&mut self, texture: TextureId) {
        self.registry.unload(texture);
    }

    fn draw_render_batch_active(&mut self) {
        self.batch.flush();
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniform {
    viewport: [f32; 2],
    /// 1.0 when the target is sRGB and vertex colors must be linearized.
    linearize: f32,
    _pad: f32, // 16-byte alignment
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2, // pos
    1 => Float32x2, // uv
    2 => Unorm8x4   // color
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<BatchVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

/// Texel format for uploads. Texels are sRGB-encoded like vertex colors and are
/// linearized on sampling when the target is sRGB.
fn texture_format(surface_format: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if surface_format.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// GUI vertex colors carry straight (non-premultiplied) alpha.
fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterizer_calls_reach_the_batch() {
        let mut r = ImmediateRenderer::default();
        r.disable_backface_culling();
        r.enable_scissor_test();
        r.scissor(0, 0, 10, 10);
        r.begin(DrawMode::Triangles);
        r.color4ub(255, 0, 0, 255);
        r.vertex2f(0.0, 0.0);
        r.vertex2f(1.0, 0.0);
        r.vertex2f(0.0, 1.0);
        r.end();
        r.draw_render_batch_active();

        let draws = r.batch().draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].scissor, Some(ScissorRect::new(0, 0, 10, 10)));
        assert!(!draws[0].cull_back_faces);
        assert_eq!(r.batch().vertices()[1].color, [255, 0, 0, 255]);
    }

    #[test]
    fn textures_load_without_a_device() {
        let mut r = ImmediateRenderer::default();
        let id = r.load_texture(&[0; 4], 1, 1, PixelFormat::R8G8B8A8, 1).unwrap();
        assert!(r.textures().contains(id));
        r.unload_texture(id);
        assert!(!r.textures().contains(id));
    }

    fn gui_frame(r: &mut ImmediateRenderer) {
        r.draw_render_batch_active();
        r.disable_backface_culling();
        r.enable_scissor_test();
        r.scissor(0, 0, 100, 100);
        r.begin(DrawMode::Triangles);
        r.vertex2f(0.0, 0.0);
        r.vertex2f(1.0, 0.0);
        r.vertex2f(0.0, 1.0);
        r.end();
        r.draw_render_batch_active();
        r.set_texture(None);
        r.enable_backface_culling();
        r.disable_scissor_test();
    }

    #[test]
    fn skipped_frames_do_not_accumulate_geometry() {
        let mut r = ImmediateRenderer::default();
        let id = r.load_texture(&[0; 4], 1, 1, PixelFormat::R8G8B8A8, 1).unwrap();

        for _ in 0..1000 {
            gui_frame(&mut r);
            r.discard_frame();
        }
        assert!(r.batch().is_empty());
        assert!(r.batch().vertices().is_empty());

        gui_frame(&mut r);
        assert_eq!(r.batch().vertices().len(), 3);
        assert_eq!(r.batch().draw_calls().len(), 1);
        assert!(r.textures().contains(id));
    }

    #[test]
    fn textures_follow_the_target_color_space() {
        assert_eq!(
            texture_format(wgpu::TextureFormat::Bgra8UnormSrgb),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            texture_format(wgpu::TextureFormat::Bgra8Unorm),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }

    #[test]
    fn vertex_layout_matches_batch_vertex() {
        assert_eq!(std::mem::size_of::<BatchVertex>(), 20);
        assert_eq!(vertex_layout().array_stride, 20);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 16);
    }
}
