//! wgpu render host: device bring-up, pipelines, and the frame loop.
//!
//! The scene renders in four pipeline families:
//!
//! | family          | geometry                  | blend                |
//! |-----------------|---------------------------|----------------------|
//! | round points    | instanced quads           | additive             |
//! | textured points | instanced quads + map     | additive or normal   |
//! | textured mesh   | indexed triangles         | normal or additive   |
//! | trail lines     | line strip                | normal, no depth     |
//!
//! Point quads are expanded in the vertex shader from a per-instance
//! center and color; the size attenuates with view-space depth the way
//! a perspective point sprite does. Every drawable owns a small uniform
//! buffer (`model`, `tint`, `params`) rewritten each frame from its
//! scene node.

use std::sync::Arc;

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::device::{DeviceProfile, Tier};
use crate::error::GpuError;
use crate::mesh::{self, MeshVertex};
use crate::raster::Raster;
use crate::scene::{LodMode, Scene};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame globals shared by every pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    /// x, y = viewport size in pixels; z = elapsed seconds.
    viewport: [f32; 4],
}

/// Per-drawable uniforms, rewritten every frame.
///
/// `params.x` is the point size (world units, depth-attenuated),
/// `params.y` enables the planet's storm distortion, `params.z` is the
/// alpha-test threshold.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct EntityUniforms {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    params: [f32; 4],
}

const POINT_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> entity: Entity;

const CORNERS = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
);

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) corner: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vi: u32,
    @location(0) center: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VsOut {
    let corner = CORNERS[vi];
    let world = entity.model * vec4<f32>(center, 1.0);
    let view_pos = globals.view * world;
    var clip = globals.view_proj * world;
    let size_px = entity.params.x * globals.viewport.y * 0.5 / max(-view_pos.z, 0.1);
    clip += vec4<f32>(corner * size_px / globals.viewport.xy * 2.0 * clip.w, 0.0, 0.0);

    var out: VsOut;
    out.clip = clip;
    out.color = color * entity.tint.rgb;
    out.corner = corner;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let d = dot(in.corner, in.corner);
    if d > 1.0 {
        discard;
    }
    let alpha = (1.0 - d) * entity.tint.a;
    return vec4<f32>(in.color, alpha);
}
"#;

const SPRITE_POINT_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> entity: Entity;
@group(2) @binding(0) var map: texture_2d<f32>;
@group(2) @binding(1) var map_sampler: sampler;

const CORNERS = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
);

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vi: u32,
    @location(0) center: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VsOut {
    let corner = CORNERS[vi];
    let world = entity.model * vec4<f32>(center, 1.0);
    let view_pos = globals.view * world;
    var clip = globals.view_proj * world;
    let size_px = entity.params.x * globals.viewport.y * 0.5 / max(-view_pos.z, 0.1);
    clip += vec4<f32>(corner * size_px / globals.viewport.xy * 2.0 * clip.w, 0.0, 0.0);

    var out: VsOut;
    out.clip = clip;
    out.color = color * entity.tint.rgb;
    out.uv = vec2<f32>(corner.x, -corner.y) * 0.5 + vec2<f32>(0.5);
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let tex = textureSample(map, map_sampler, in.uv);
    let alpha = tex.a * entity.tint.a;
    if alpha < entity.params.z {
        discard;
    }
    return vec4<f32>(tex.rgb * in.color, alpha);
}
"#;

const MESH_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> entity: Entity;
@group(2) @binding(0) var map: texture_2d<f32>;
@group(2) @binding(1) var map_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = globals.view_proj * entity.model * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    var uv = in.uv;
    let t = globals.viewport.z;
    if entity.params.y > 0.5 {
        // slow storm swirl over the surface
        let angle = length(uv - vec2<f32>(0.5)) * 3.0;
        let twist = sin(angle * 3.0 + t) * 0.1;
        uv += vec2<f32>(twist * sin(t * 0.5), twist * cos(t * 0.5));
    }
    var color = textureSample(map, map_sampler, uv);
    if entity.params.y > 0.5 {
        let noise = sin(uv.x * 10.0 + t) * sin(uv.y * 10.0 + t) * 0.1;
        color = vec4<f32>(color.rgb + noise * vec3<f32>(0.8, 0.4, 0.2), color.a);
    }
    let alpha = color.a * entity.tint.a;
    if alpha < entity.params.z {
        discard;
    }
    return vec4<f32>(color.rgb * entity.tint.rgb, alpha);
}
"#;

const LINE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct Entity {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> entity: Entity;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * entity.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return entity.tint;
}
"#;

const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

struct PipelineSet {
    points_additive: wgpu::RenderPipeline,
    sprite_points_near: wgpu::RenderPipeline,
    sprite_points_far: wgpu::RenderPipeline,
    mesh_solid: wgpu::RenderPipeline,
    mesh_overlay: wgpu::RenderPipeline,
    mesh_additive: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
}

/// One drawable's uniform buffer and bind group.
struct EntityBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl EntityBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("entity uniforms"),
            size: std::mem::size_of::<EntityUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("entity bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn write(&self, queue: &wgpu::Queue, model: Mat4, tint: Vec4, params: Vec4) {
        let uniforms = EntityUniforms {
            model: model.to_cols_array_2d(),
            tint: tint.to_array(),
            params: params.to_array(),
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &mesh::Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.index_count(),
        }
    }
}

/// A point batch: per-instance centers and colors.
struct PointBatch {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    count: u32,
    entity: EntityBinding,
}

impl PointBatch {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        positions: &[f32],
        colors: &[f32],
    ) -> Self {
        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("point positions"),
            contents: bytemuck::cast_slice(positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("point colors"),
            contents: bytemuck::cast_slice(colors),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            positions: position_buffer,
            colors: color_buffer,
            count: (positions.len() / 3) as u32,
            entity: EntityBinding::new(device, layout),
        }
    }
}

/// Heart cluster batch: one position buffer, near and far color sets.
struct HeartBatch {
    positions: wgpu::Buffer,
    colors_near: wgpu::Buffer,
    colors_far: wgpu::Buffer,
    count: u32,
    entity: EntityBinding,
    texture: Option<wgpu::BindGroup>,
}

/// Per-meteor trail slot, rewritten every frame.
struct TrailSlot {
    buffer: wgpu::Buffer,
    capacity: usize,
    entity: EntityBinding,
    head_entity: EntityBinding,
    glow_entity: EntityBinding,
}

struct RingDraw {
    mesh: GpuMesh,
    texture: wgpu::BindGroup,
    entity: EntityBinding,
}

/// Device, surface, and the shared pipeline set.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipelines: PipelineSet,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    entity_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    clamp_sampler: wgpu::Sampler,
    repeat_sampler: wgpu::Sampler,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("stardrift device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_texture(&device, &config);

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let entity_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("entity layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture layout"),
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

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("clamp sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let repeat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("repeat sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipelines = build_pipelines(
            &device,
            format,
            &globals_layout,
            &entity_layout,
            &texture_layout,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            pipelines,
            globals_buffer,
            globals_bind_group,
            entity_layout,
            texture_layout,
            clamp_sampler,
            repeat_sampler,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_texture(&self.device, &self.config);
    }

    /// Upload a CPU raster and bind it with the given sampler.
    fn bind_raster(&self, raster: &Raster, repeat: bool) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: raster.width,
            height: raster.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("raster texture"),
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
            &raster.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(raster.width * 4),
                rows_per_image: Some(raster.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = if repeat {
            &self.repeat_sampler
        } else {
            &self.clamp_sampler
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raster bind group"),
            layout: &self.texture_layout,
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
        })
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

const POINT_VERTEX_LAYOUTS: [wgpu::VertexBufferLayout<'static>; 2] = [
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
];

const MESH_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<MeshVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 12,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

const LINE_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

#[allow(clippy::too_many_arguments)]
fn make_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn build_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    globals_layout: &wgpu::BindGroupLayout,
    entity_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
) -> PipelineSet {
    let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("point shader"),
        source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
    });
    let sprite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("sprite point shader"),
        source: wgpu::ShaderSource::Wgsl(SPRITE_POINT_SHADER.into()),
    });
    let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh shader"),
        source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
    });
    let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("line shader"),
        source: wgpu::ShaderSource::Wgsl(LINE_SHADER.into()),
    });

    let bare_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("bare pipeline layout"),
        bind_group_layouts: &[globals_layout, entity_layout],
        push_constant_ranges: &[],
    });
    let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("textured pipeline layout"),
        bind_group_layouts: &[globals_layout, entity_layout, texture_layout],
        push_constant_ranges: &[],
    });

    PipelineSet {
        points_additive: make_pipeline(
            device,
            "points additive",
            &bare_layout,
            &point_shader,
            &POINT_VERTEX_LAYOUTS,
            format,
            ADDITIVE_BLEND,
            false,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        sprite_points_near: make_pipeline(
            device,
            "sprite points near",
            &textured_layout,
            &sprite_shader,
            &POINT_VERTEX_LAYOUTS,
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            true,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        sprite_points_far: make_pipeline(
            device,
            "sprite points far",
            &textured_layout,
            &sprite_shader,
            &POINT_VERTEX_LAYOUTS,
            format,
            ADDITIVE_BLEND,
            false,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        mesh_solid: make_pipeline(
            device,
            "mesh solid",
            &textured_layout,
            &mesh_shader,
            &[MESH_VERTEX_LAYOUT],
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            true,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        mesh_overlay: make_pipeline(
            device,
            "mesh overlay",
            &textured_layout,
            &mesh_shader,
            &[MESH_VERTEX_LAYOUT],
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        mesh_additive: make_pipeline(
            device,
            "mesh additive",
            &textured_layout,
            &mesh_shader,
            &[MESH_VERTEX_LAYOUT],
            format,
            ADDITIVE_BLEND,
            false,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        lines: make_pipeline(
            device,
            "trail lines",
            &bare_layout,
            &line_shader,
            &[LINE_VERTEX_LAYOUT],
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::PrimitiveTopology::LineStrip,
        ),
    }
}

/// Trail line color.
const TRAIL_TINT: Vec3 = Vec3::new(0.6, 0.918, 1.0);

/// Every GPU-side resource for one built scene.
pub struct SceneRenderer {
    profile: DeviceProfile,

    galaxy: PointBatch,
    starfield: PointBatch,
    hearts: Vec<HeartBatch>,

    quad: GpuMesh,
    sphere: GpuMesh,
    rings: Vec<RingDraw>,
    trails: Vec<TrailSlot>,

    planet_texture: wgpu::BindGroup,
    glow_texture: wgpu::BindGroup,
    nebula_textures: Vec<wgpu::BindGroup>,
    hint_icon_texture: wgpu::BindGroup,
    hint_ring_texture: wgpu::BindGroup,
    hint_text_texture: wgpu::BindGroup,

    planet_entity: EntityBinding,
    glow_entity: EntityBinding,
    nebula_entities: Vec<EntityBinding>,
    hint_icon_entity: EntityBinding,
    hint_ring_entity: EntityBinding,
    hint_text_entity: EntityBinding,
}

impl SceneRenderer {
    pub fn new(ctx: &GpuContext, profile: &DeviceProfile, scene: &Scene) -> Self {
        let device = &ctx.device;
        let layout = &ctx.entity_layout;

        let galaxy = PointBatch::new(
            device,
            layout,
            &scene.galaxy.positions,
            &scene.galaxy.colors,
        );
        let starfield = PointBatch::new(
            device,
            layout,
            &scene.starfield.positions,
            &scene.starfield.colors,
        );

        let hearts = scene
            .clusters
            .iter()
            .map(|cluster| HeartBatch {
                positions: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("heart positions"),
                    contents: bytemuck::cast_slice(&cluster.field.positions.positions),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                colors_near: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("heart near colors"),
                    contents: bytemuck::cast_slice(&cluster.field.colors_near),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                colors_far: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("heart far colors"),
                    contents: bytemuck::cast_slice(&cluster.field.colors_far),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                count: cluster.field.len() as u32,
                entity: EntityBinding::new(device, layout),
                texture: None,
            })
            .collect();

        let band_segments = if profile.tier == Tier::Constrained {
            64
        } else {
            128
        };
        let rings = scene
            .rings
            .iter()
            .map(|entity| {
                let band = &entity.ring.band;
                let mesh = mesh::cylinder_band(
                    entity.ring.radius,
                    1.0,
                    band_segments,
                    band.repeat_factor,
                );
                RingDraw {
                    mesh: GpuMesh::new(device, &mesh),
                    texture: ctx.bind_raster(&band.raster, true),
                    entity: EntityBinding::new(device, layout),
                }
            })
            .collect();

        let trail_floats = profile.meteor_trail_len * 3;
        let trails = (0..profile.meteor_max)
            .map(|_| TrailSlot {
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("meteor trail"),
                    size: (trail_floats * std::mem::size_of::<f32>()) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                capacity: profile.meteor_trail_len,
                entity: EntityBinding::new(device, layout),
                head_entity: EntityBinding::new(device, layout),
                glow_entity: EntityBinding::new(device, layout),
            })
            .collect();

        Self {
            profile: profile.clone(),
            galaxy,
            starfield,
            hearts,
            quad: GpuMesh::new(device, &mesh::quad()),
            sphere: GpuMesh::new(
                device,
                &mesh::sphere(profile.planet_segments, profile.planet_segments),
            ),
            rings,
            trails,
            planet_texture: ctx.bind_raster(&scene.planet_texture, false),
            glow_texture: ctx.bind_raster(&scene.glow_texture, false),
            nebula_textures: scene
                .nebula_textures
                .iter()
                .map(|r| ctx.bind_raster(r, false))
                .collect(),
            hint_icon_texture: ctx.bind_raster(&scene.hint_icon_texture, false),
            hint_ring_texture: ctx.bind_raster(&scene.hint_ring_texture, false),
            hint_text_texture: ctx.bind_raster(&scene.hint_text_texture, false),
            planet_entity: EntityBinding::new(device, layout),
            glow_entity: EntityBinding::new(device, layout),
            nebula_entities: scene
                .nebulae
                .iter()
                .map(|_| EntityBinding::new(device, layout))
                .collect(),
            hint_icon_entity: EntityBinding::new(device, layout),
            hint_ring_entity: EntityBinding::new(device, layout),
            hint_text_entity: EntityBinding::new(device, layout),
        }
    }

    /// Upload a freshly decoded cluster image.
    pub fn attach_heart(&mut self, ctx: &GpuContext, group: usize, raster: &Raster) {
        if let Some(batch) = self.hearts.get_mut(group) {
            batch.texture = Some(ctx.bind_raster(raster, false));
        }
    }

    /// Draw one frame.
    pub fn render(
        &mut self,
        ctx: &GpuContext,
        scene: &Scene,
        camera: &Camera,
        elapsed: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        let queue = &ctx.queue;
        let view_mat = camera.view();
        let globals = Globals {
            view_proj: camera.view_proj().to_cols_array_2d(),
            view: view_mat.to_cols_array_2d(),
            viewport: [
                ctx.config.width as f32,
                ctx.config.height as f32,
                elapsed,
                0.0,
            ],
        };
        queue.write_buffer(&ctx.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // billboards reuse the inverse of the camera's rotation
        let billboard = Mat4::from_mat3(Mat3::from_mat4(view_mat).transpose());

        self.write_entities(ctx, scene, billboard, elapsed);

        let output = ctx.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_bind_group(0, &ctx.globals_bind_group, &[]);

            // opaque-ish geometry first: planet, then near clusters
            let planet_node = scene.graph.node(scene.planet);
            if planet_node.visible {
                pass.set_pipeline(&ctx.pipelines.mesh_solid);
                pass.set_bind_group(1, &self.planet_entity.bind_group, &[]);
                pass.set_bind_group(2, &self.planet_texture, &[]);
                pass.set_vertex_buffer(0, self.sphere.vertices.slice(..));
                pass.set_index_buffer(self.sphere.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
            }

            for (batch, cluster) in self.hearts.iter().zip(&scene.clusters) {
                let node = scene.graph.node(cluster.node);
                let Some(texture) = &batch.texture else {
                    continue;
                };
                if !node.visible || batch.count == 0 {
                    continue;
                }
                let (pipeline, colors) = match cluster.mode {
                    LodMode::Near => (&ctx.pipelines.sprite_points_near, &batch.colors_near),
                    LodMode::Far => (&ctx.pipelines.sprite_points_far, &batch.colors_far),
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &batch.entity.bind_group, &[]);
                pass.set_bind_group(2, texture, &[]);
                pass.set_vertex_buffer(0, batch.positions.slice(..));
                pass.set_vertex_buffer(1, colors.slice(..));
                pass.draw(0..6, 0..batch.count);
            }

            // additive point fields
            pass.set_pipeline(&ctx.pipelines.points_additive);
            if scene.graph.node(scene.galaxy_node).visible && self.galaxy.count > 0 {
                pass.set_bind_group(1, &self.galaxy.entity.bind_group, &[]);
                pass.set_vertex_buffer(0, self.galaxy.positions.slice(..));
                pass.set_vertex_buffer(1, self.galaxy.colors.slice(..));
                pass.draw(0..6, 0..self.galaxy.count);
            }
            if scene.graph.node(scene.starfield_node).visible && scene.star_draw > 0 {
                pass.set_bind_group(1, &self.starfield.entity.bind_group, &[]);
                pass.set_vertex_buffer(0, self.starfield.positions.slice(..));
                pass.set_vertex_buffer(1, self.starfield.colors.slice(..));
                pass.draw(0..6, 0..scene.star_draw as u32);
            }

            // nebulae and the planet glow, both additive billboards
            pass.set_pipeline(&ctx.pipelines.mesh_additive);
            pass.set_vertex_buffer(0, self.quad.vertices.slice(..));
            pass.set_index_buffer(self.quad.indices.slice(..), wgpu::IndexFormat::Uint32);
            for ((entity, texture), &id) in self
                .nebula_entities
                .iter()
                .zip(&self.nebula_textures)
                .zip(&scene.nebulae)
            {
                if !scene.graph.node(id).visible {
                    continue;
                }
                pass.set_bind_group(1, &entity.bind_group, &[]);
                pass.set_bind_group(2, texture, &[]);
                pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
            }
            if scene.graph.node(scene.glow).visible {
                pass.set_bind_group(1, &self.glow_entity.bind_group, &[]);
                pass.set_bind_group(2, &self.glow_texture, &[]);
                pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
            }

            // meteors: line trails, then sphere heads and glow quads
            let live = scene.meteors.stars.len().min(self.trails.len());
            pass.set_pipeline(&ctx.pipelines.lines);
            for slot in &self.trails[..live] {
                pass.set_bind_group(1, &slot.entity.bind_group, &[]);
                pass.set_vertex_buffer(0, slot.buffer.slice(..));
                pass.draw(0..slot.capacity as u32, 0..1);
            }
            pass.set_pipeline(&ctx.pipelines.mesh_additive);
            pass.set_vertex_buffer(0, self.sphere.vertices.slice(..));
            pass.set_index_buffer(self.sphere.indices.slice(..), wgpu::IndexFormat::Uint32);
            for slot in &self.trails[..live] {
                pass.set_bind_group(1, &slot.head_entity.bind_group, &[]);
                pass.set_bind_group(2, &self.glow_texture, &[]);
                pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
            }
            pass.set_vertex_buffer(0, self.quad.vertices.slice(..));
            pass.set_index_buffer(self.quad.indices.slice(..), wgpu::IndexFormat::Uint32);
            for slot in &self.trails[..live] {
                pass.set_bind_group(1, &slot.glow_entity.bind_group, &[]);
                pass.set_bind_group(2, &self.glow_texture, &[]);
                pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
            }

            // text rings, double-faced open cylinders
            pass.set_pipeline(&ctx.pipelines.mesh_overlay);
            for (draw, entity) in self.rings.iter().zip(&scene.rings) {
                if !scene.graph.node(entity.node).visible {
                    continue;
                }
                pass.set_bind_group(1, &draw.entity.bind_group, &[]);
                pass.set_bind_group(2, &draw.texture, &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertices.slice(..));
                pass.set_index_buffer(draw.mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }

            // hint overlay last, on top of everything
            pass.set_vertex_buffer(0, self.quad.vertices.slice(..));
            pass.set_index_buffer(self.quad.indices.slice(..), wgpu::IndexFormat::Uint32);
            for (entity, texture, id) in [
                (&self.hint_ring_entity, &self.hint_ring_texture, scene.hint_ring),
                (&self.hint_icon_entity, &self.hint_icon_texture, scene.hint_icon),
                (&self.hint_text_entity, &self.hint_text_texture, scene.hint_text),
            ] {
                if !scene.graph.node(id).visible {
                    continue;
                }
                pass.set_bind_group(1, &entity.bind_group, &[]);
                pass.set_bind_group(2, texture, &[]);
                pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Refresh every entity uniform buffer from the scene graph.
    fn write_entities(&mut self, ctx: &GpuContext, scene: &Scene, billboard: Mat4, elapsed: f32) {
        let queue = &ctx.queue;
        let profile = &self.profile;

        let node_model = |id| {
            let node = scene.graph.node(id);
            Mat4::from_scale_rotation_translation(
                node.scale,
                Quat::from_euler(
                    EulerRot::XYZ,
                    node.rotation.x,
                    node.rotation.y,
                    node.rotation.z,
                ),
                node.position,
            )
        };
        let billboard_model = |id: crate::scene::NodeId| {
            let node = scene.graph.node(id);
            Mat4::from_translation(node.position) * billboard * Mat4::from_scale(node.scale)
        };
        let tint = |id: crate::scene::NodeId| {
            let node = scene.graph.node(id);
            node.color.extend(if node.transparent {
                node.opacity
            } else {
                1.0
            })
        };

        // the planet faces the camera so the storm stays front and center
        self.planet_entity.write(
            queue,
            billboard_model(scene.planet),
            tint(scene.planet),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
        );
        self.glow_entity.write(
            queue,
            billboard_model(scene.glow),
            tint(scene.glow),
            Vec4::ZERO,
        );
        for (entity, &id) in self.nebula_entities.iter().zip(&scene.nebulae) {
            entity.write(queue, billboard_model(id), tint(id), Vec4::ZERO);
        }

        self.galaxy.entity.write(
            queue,
            node_model(scene.galaxy_node),
            tint(scene.galaxy_node),
            Vec4::new(profile.galaxy_point_size, 0.0, 0.0, 0.0),
        );
        self.starfield.entity.write(
            queue,
            node_model(scene.starfield_node),
            tint(scene.starfield_node),
            Vec4::new(profile.star_size, 0.0, 0.0, 0.0),
        );

        for (batch, cluster) in self.hearts.iter().zip(&scene.clusters) {
            let threshold = match cluster.mode {
                LodMode::Near => 0.1,
                LodMode::Far => 0.01,
            };
            batch.entity.write(
                queue,
                node_model(cluster.node),
                tint(cluster.node),
                Vec4::new(profile.heart_point_size, 0.0, threshold, 0.0),
            );
        }

        for (draw, entity) in self.rings.iter().zip(&scene.rings) {
            let node = scene.graph.node(entity.node);
            draw.entity.write(
                queue,
                node_model(entity.node),
                node.color.extend(node.opacity),
                Vec4::new(0.0, 0.0, 0.01, 0.0),
            );
        }

        for (slot, star) in self.trails.iter().zip(&scene.meteors.stars) {
            let mut points = Vec::with_capacity(slot.capacity * 3);
            for p in star.trail.iter().take(slot.capacity) {
                points.extend_from_slice(&p.to_array());
            }
            // short trails pad with the last sample so the strip stays full
            let last = star.trail.last().copied().unwrap_or(star.head);
            while points.len() < slot.capacity * 3 {
                points.extend_from_slice(&last.to_array());
            }
            queue.write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&points));

            slot.entity.write(
                queue,
                Mat4::IDENTITY,
                TRAIL_TINT.extend(star.trail_opacity()),
                Vec4::ZERO,
            );
            slot.head_entity.write(
                queue,
                Mat4::from_translation(star.head)
                    * Mat4::from_scale(Vec3::splat(profile.meteor_head_radius)),
                Vec4::new(1.0, 1.0, 1.0, star.opacity()),
                Vec4::ZERO,
            );
            let pulse = 0.8 + (elapsed * 5.0).sin() * 0.2;
            slot.glow_entity.write(
                queue,
                Mat4::from_translation(star.head)
                    * billboard
                    * Mat4::from_scale(Vec3::splat(profile.meteor_glow_radius * 2.0)),
                Vec4::new(1.0, 1.0, 1.0, star.opacity() * pulse),
                Vec4::ZERO,
            );
        }

        // hint sprites billboard toward the camera; the label plane is
        // sized by the profile
        for (entity, id) in [
            (&self.hint_icon_entity, scene.hint_icon),
            (&self.hint_ring_entity, scene.hint_ring),
        ] {
            let node = scene.graph.node(id);
            let model = Mat4::from_translation(node.position)
                * billboard
                * Mat4::from_scale(node.scale * profile.hint_icon_height);
            entity.write(queue, model, tint(id), Vec4::ZERO);
        }
        {
            let node = scene.graph.node(scene.hint_text);
            let model = Mat4::from_translation(node.position)
                * Mat4::from_rotation_y(node.rotation.y)
                * Mat4::from_scale(Vec3::new(
                    profile.hint_plane.x,
                    profile.hint_plane.y,
                    1.0,
                ));
            self.hint_text_entity.write(queue, model, tint(scene.hint_text), Vec4::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
        assert_eq!(std::mem::size_of::<EntityUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<EntityUniforms>(), 96);
    }

    #[test]
    fn test_mesh_vertex_layout_matches_struct() {
        assert_eq!(
            MESH_VERTEX_LAYOUT.array_stride,
            std::mem::size_of::<MeshVertex>() as u64
        );
        assert_eq!(MESH_VERTEX_LAYOUT.attributes[1].offset, 12);
    }

    #[test]
    fn test_shaders_declare_both_entry_points() {
        for src in [POINT_SHADER, SPRITE_POINT_SHADER, MESH_SHADER, LINE_SHADER] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }
}
