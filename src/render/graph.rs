use bytemuck::{bytes_of, Pod, Zeroable};
use log::debug;

use crate::config::{BloomSettings, DisplaySettings};
use crate::resize::TargetExtent;
use crate::uniforms::{FrameUniform, UniformFrame};

use super::shaders::{raytrace_source, POST_SHADER};

/// Format of the HDR buffer and both bloom buffers.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// One step of the per-frame pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raymarch into the HDR buffer.
    Raytrace,
    BloomExtract,
    /// Horizontal then vertical Gaussian pass at half resolution.
    BloomBlur,
    /// Additive blend of the blurred highlights back into the HDR buffer.
    BloomComposite,
    /// Exposure, ACES tone mapping and output encoding onto the surface.
    Present,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Raytrace,
        Stage::BloomExtract,
        Stage::BloomBlur,
        Stage::BloomComposite,
        Stage::Present,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Raytrace => "raytrace",
            Stage::BloomExtract => "bloom-extract",
            Stage::BloomBlur => "bloom-blur",
            Stage::BloomComposite => "bloom-composite",
            Stage::Present => "present",
        }
    }
}

/// Mirrors `PostParams` in the post-processing shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    pub texel_size: [f32; 2],
    pub direction: [f32; 2],
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    pub exposure: f32,
    pub encode_srgb: u32,
    pub _padding: [u32; 3],
}

/// Uniform contents of every post pass for one target extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostUniforms {
    pub extract: PostUniform,
    pub blur_horizontal: PostUniform,
    pub blur_vertical: PostUniform,
    pub composite: PostUniform,
    pub present: PostUniform,
}

impl PostUniforms {
    pub fn new(
        bloom: &BloomSettings,
        display: &DisplaySettings,
        extent: TargetExtent,
        encode_srgb: bool,
    ) -> Self {
        let base = PostUniform {
            texel_size: extent.half().texel_size(),
            direction: [0.0, 0.0],
            threshold: bloom.threshold,
            strength: bloom.strength,
            radius: bloom.radius,
            exposure: display.exposure,
            encode_srgb: encode_srgb as u32,
            _padding: [0; 3],
        };
        Self {
            extract: PostUniform {
                texel_size: extent.texel_size(),
                ..base
            },
            blur_horizontal: PostUniform {
                direction: [1.0, 0.0],
                ..base
            },
            blur_vertical: PostUniform {
                direction: [0.0, 1.0],
                ..base
            },
            composite: base,
            present: PostUniform {
                texel_size: extent.texel_size(),
                ..base
            },
        }
    }
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn create(device: &wgpu::Device, label: &str, extent: TargetExtent) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.width.max(1),
                height: extent.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// HDR buffer plus the half-resolution bloom ping-pong pair.
struct GraphTargets {
    hdr: RenderTarget,
    bloom_a: RenderTarget,
    bloom_b: RenderTarget,
}

impl GraphTargets {
    fn create(device: &wgpu::Device, extent: TargetExtent) -> Self {
        Self {
            hdr: RenderTarget::create(device, "hdr-target", extent),
            bloom_a: RenderTarget::create(device, "bloom-target-a", extent.half()),
            bloom_b: RenderTarget::create(device, "bloom-target-b", extent.half()),
        }
    }
}

struct PostBuffers {
    extract: wgpu::Buffer,
    blur_horizontal: wgpu::Buffer,
    blur_vertical: wgpu::Buffer,
    composite: wgpu::Buffer,
    present: wgpu::Buffer,
}

impl PostBuffers {
    fn create(device: &wgpu::Device) -> Self {
        let buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<PostUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self {
            extract: buffer("extract-uniform"),
            blur_horizontal: buffer("blur-horizontal-uniform"),
            blur_vertical: buffer("blur-vertical-uniform"),
            composite: buffer("composite-uniform"),
            present: buffer("present-uniform"),
        }
    }

    fn write(&self, queue: &wgpu::Queue, uniforms: &PostUniforms) {
        queue.write_buffer(&self.extract, 0, bytes_of(&uniforms.extract));
        queue.write_buffer(&self.blur_horizontal, 0, bytes_of(&uniforms.blur_horizontal));
        queue.write_buffer(&self.blur_vertical, 0, bytes_of(&uniforms.blur_vertical));
        queue.write_buffer(&self.composite, 0, bytes_of(&uniforms.composite));
        queue.write_buffer(&self.present, 0, bytes_of(&uniforms.present));
    }
}

struct PostBindGroups {
    extract: wgpu::BindGroup,
    blur_horizontal: wgpu::BindGroup,
    blur_vertical: wgpu::BindGroup,
    composite: wgpu::BindGroup,
    present: wgpu::BindGroup,
}

/// Offscreen targets, pipelines and bind groups for the whole frame.
pub struct RenderGraph {
    extent: TargetExtent,
    bloom: BloomSettings,
    display: DisplaySettings,
    encode_srgb: bool,
    frame_buffer: wgpu::Buffer,
    raytrace_bind_group: wgpu::BindGroup,
    raytrace_pipeline: wgpu::RenderPipeline,
    extract_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    present_pipeline: wgpu::RenderPipeline,
    post_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    post_buffers: PostBuffers,
    targets: GraphTargets,
    bind_groups: PostBindGroups,
}

impl RenderGraph {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        extent: TargetExtent,
        bloom: BloomSettings,
        display: DisplaySettings,
    ) -> Self {
        let encode_srgb = !surface_format.is_srgb();

        let raytrace_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raytrace-shader"),
            source: wgpu::ShaderSource::Wgsl(raytrace_source().into()),
        });
        let post_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post-shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER.into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
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
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let raytrace_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let post_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post-bind-layout"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<PostUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let raytrace_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("raytrace-pipeline-layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let post_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post-pipeline-layout"),
            bind_group_layouts: &[&post_layout],
            push_constant_ranges: &[],
        });

        let raytrace_pipeline = fullscreen_pipeline(
            device,
            &FullscreenStage {
                label: Stage::Raytrace.label(),
                layout: &raytrace_layout,
                module: &raytrace_module,
                vertex_entry: "vs_main",
                fragment_entry: "fs_main",
                format: HDR_FORMAT,
                blend: None,
            },
        );
        let layout = &post_pipeline_layout;
        let module = &post_module;
        let post_stage = move |label, fragment_entry, format, blend| FullscreenStage {
            label,
            layout,
            module,
            vertex_entry: "vs_fullscreen",
            fragment_entry,
            format,
            blend,
        };
        let extract_pipeline = fullscreen_pipeline(
            device,
            &post_stage(Stage::BloomExtract.label(), "fs_extract", HDR_FORMAT, None),
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            &post_stage(Stage::BloomBlur.label(), "fs_blur", HDR_FORMAT, None),
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            &post_stage(
                Stage::BloomComposite.label(),
                "fs_composite",
                HDR_FORMAT,
                Some(ADDITIVE_BLEND),
            ),
        );
        let present_pipeline = fullscreen_pipeline(
            device,
            &post_stage(Stage::Present.label(), "fs_present", surface_format, None),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let post_buffers = PostBuffers::create(device);
        post_buffers.write(
            queue,
            &PostUniforms::new(&bloom, &display, extent, encode_srgb),
        );
        let targets = GraphTargets::create(device, extent);
        let bind_groups =
            create_post_bind_groups(device, &post_layout, &sampler, &post_buffers, &targets);

        debug!(
            "render graph ready at {}x{} (shader sRGB encoding: {encode_srgb})",
            extent.width, extent.height
        );

        Self {
            extent,
            bloom,
            display,
            encode_srgb,
            frame_buffer,
            raytrace_bind_group,
            raytrace_pipeline,
            extract_pipeline,
            blur_pipeline,
            composite_pipeline,
            present_pipeline,
            post_layout,
            sampler,
            post_buffers,
            targets,
            bind_groups,
        }
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    /// Rebuilds every offscreen target and the bind groups that reference
    /// them.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, extent: TargetExtent) {
        if extent == self.extent {
            return;
        }
        self.extent = extent;
        self.targets = GraphTargets::create(device, extent);
        self.post_buffers.write(
            queue,
            &PostUniforms::new(&self.bloom, &self.display, extent, self.encode_srgb),
        );
        self.bind_groups = create_post_bind_groups(
            device,
            &self.post_layout,
            &self.sampler,
            &self.post_buffers,
            &self.targets,
        );
        debug!("render graph resized to {}x{}", extent.width, extent.height);
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, frame: &UniformFrame) {
        queue.write_buffer(&self.frame_buffer, 0, bytes_of(&FrameUniform::from(frame)));
    }

    /// Records every stage of [`Stage::ORDER`], ending on `output`.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        for stage in Stage::ORDER {
            match stage {
                Stage::Raytrace => fullscreen_pass(
                    encoder,
                    stage.label(),
                    &self.targets.hdr.view,
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    &self.raytrace_pipeline,
                    &self.raytrace_bind_group,
                ),
                Stage::BloomExtract => fullscreen_pass(
                    encoder,
                    stage.label(),
                    &self.targets.bloom_a.view,
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    &self.extract_pipeline,
                    &self.bind_groups.extract,
                ),
                Stage::BloomBlur => {
                    fullscreen_pass(
                        encoder,
                        "bloom-blur-horizontal",
                        &self.targets.bloom_b.view,
                        wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        &self.blur_pipeline,
                        &self.bind_groups.blur_horizontal,
                    );
                    fullscreen_pass(
                        encoder,
                        "bloom-blur-vertical",
                        &self.targets.bloom_a.view,
                        wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        &self.blur_pipeline,
                        &self.bind_groups.blur_vertical,
                    );
                }
                Stage::BloomComposite => fullscreen_pass(
                    encoder,
                    stage.label(),
                    &self.targets.hdr.view,
                    wgpu::LoadOp::Load,
                    &self.composite_pipeline,
                    &self.bind_groups.composite,
                ),
                Stage::Present => fullscreen_pass(
                    encoder,
                    stage.label(),
                    output,
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    &self.present_pipeline,
                    &self.bind_groups.present,
                ),
            }
        }
    }
}

const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

struct FullscreenStage<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
}

fn fullscreen_pipeline(device: &wgpu::Device, stage: &FullscreenStage<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(stage.label),
        layout: Some(stage.layout),
        vertex: wgpu::VertexState {
            module: stage.module,
            entry_point: Some(stage.vertex_entry),
            compilation_options: Default::default(),
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: stage.module,
            entry_point: Some(stage.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: stage.format,
                blend: stage.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

fn create_post_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    buffers: &PostBuffers,
    targets: &GraphTargets,
) -> PostBindGroups {
    let bind = |label: &str, source: &RenderTarget, buffer: &wgpu::Buffer| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
        })
    };
    PostBindGroups {
        extract: bind("extract-bind-group", &targets.hdr, &buffers.extract),
        blur_horizontal: bind(
            "blur-horizontal-bind-group",
            &targets.bloom_a,
            &buffers.blur_horizontal,
        ),
        blur_vertical: bind(
            "blur-vertical-bind-group",
            &targets.bloom_b,
            &buffers.blur_vertical,
        ),
        composite: bind("composite-bind-group", &targets.bloom_a, &buffers.composite),
        present: bind("present-bind-group", &targets.hdr, &buffers.present),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(encode_srgb: bool) -> PostUniforms {
        PostUniforms::new(
            &BloomSettings::default(),
            &DisplaySettings::default(),
            TargetExtent {
                width: 1600,
                height: 900,
            },
            encode_srgb,
        )
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let labels: Vec<_> = Stage::ORDER.iter().map(|stage| stage.label()).collect();
        assert_eq!(
            labels,
            [
                "raytrace",
                "bloom-extract",
                "bloom-blur",
                "bloom-composite",
                "present"
            ]
        );
    }

    #[test]
    fn post_uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<PostUniform>(), 48);
    }

    #[test]
    fn blur_passes_run_at_half_resolution() {
        let uniforms = uniforms(false);
        assert_eq!(uniforms.blur_horizontal.direction, [1.0, 0.0]);
        assert_eq!(uniforms.blur_vertical.direction, [0.0, 1.0]);
        assert_eq!(uniforms.blur_horizontal.texel_size, [1.0 / 800.0, 1.0 / 450.0]);
        assert_eq!(uniforms.present.texel_size, [1.0 / 1600.0, 1.0 / 900.0]);
    }

    #[test]
    fn bloom_and_display_settings_reach_every_pass() {
        let uniforms = uniforms(true);
        for pass in [
            uniforms.extract,
            uniforms.blur_horizontal,
            uniforms.blur_vertical,
            uniforms.composite,
            uniforms.present,
        ] {
            assert_eq!(pass.threshold, 1.1);
            assert_eq!(pass.strength, 0.11);
            assert_eq!(pass.radius, 0.28);
            assert_eq!(pass.exposure, 0.94);
            assert_eq!(pass.encode_srgb, 1);
        }
        assert_eq!(self::uniforms(false).present.encode_srgb, 0);
    }
}
