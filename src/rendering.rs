//! Rendering system with wgpu pipeline and shader management.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::{debug, info};
use wgpu::util::DeviceExt;

use crate::binder::{GpuUniforms, QueueTarget};
use crate::error::{DistortionError, Result};
use crate::params::RoadOptions;
use crate::profile::DistortionProfile;
use crate::road::{RoadMesh, Vertex};
use crate::shader::road_program;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Binding of [`RoadUniforms`] next to `uTime` in `@group(0)`
const ROAD_BINDING: u32 = 1;

/// Uniform buffer for the road shader (view-projection matrix + geometry)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RoadUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub travel_length: f32,
    pub road_width: f32,
    pub island_width: f32,
    pub lanes_per_road: f32,
}

impl RoadUniforms {
    pub fn new(options: &RoadOptions) -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            travel_length: options.length_m,
            road_width: options.road_width_m,
            island_width: options.island_width_m,
            lanes_per_road: options.lanes_per_road as f32,
        }
    }
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    road_uniforms: RoadUniforms,
    road_uniform_buffer: wgpu::Buffer,
    frame_layout: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    distortion: GpuUniforms,
    depth_view: wgpu::TextureView,
}

impl RenderSystem {
    /// Create new rendering system drawing the road bent by `profile`
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        profile: &DistortionProfile,
        road: &RoadOptions,
    ) -> Result<Self> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| DistortionError::Gpu(format!("failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| DistortionError::Gpu("failed to find GPU adapter".to_string()))?;

        info!("rendering on {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| DistortionError::Gpu(format!("failed to request device: {}", e)))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| DistortionError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Create buffers
        let mesh = RoadMesh::new(road);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Road Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Road Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let road_uniforms = RoadUniforms::new(road);
        let road_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Road Uniform Buffer"),
            contents: bytemuck::cast_slice(&[road_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // uTime and road uniforms share group 0
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                GpuUniforms::time_layout_entry(),
                wgpu::BindGroupLayoutEntry {
                    binding: ROAD_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let distortion = GpuUniforms::new(&device, profile);
        let frame_bind_group =
            create_frame_bind_group(&device, &frame_layout, &distortion, &road_uniform_buffer);
        let render_pipeline =
            create_road_pipeline(&device, profile, &frame_layout, &distortion, config.format);
        let depth_view = create_depth_view(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            road_uniforms,
            road_uniform_buffer,
            frame_layout,
            frame_bind_group,
            distortion,
            depth_view,
        })
    }

    /// Rebuild the distortion buffers and pipeline for another profile
    pub fn set_profile(&mut self, profile: &DistortionProfile) {
        self.distortion = GpuUniforms::new(&self.device, profile);
        self.frame_bind_group = create_frame_bind_group(
            &self.device,
            &self.frame_layout,
            &self.distortion,
            &self.road_uniform_buffer,
        );
        self.render_pipeline = create_road_pipeline(
            &self.device,
            profile,
            &self.frame_layout,
            &self.distortion,
            self.config.format,
        );
        debug!("rebuilt road pipeline for '{}'", profile.id());
    }

    /// Id of the profile the current pipeline was built for
    pub fn profile_id(&self) -> &str {
        self.distortion.profile_id()
    }

    /// Destination for the scene's uniform and time uploads
    pub fn uniform_target(&self) -> QueueTarget<'_> {
        QueueTarget {
            queue: &self.queue,
            uniforms: &self.distortion,
        }
    }

    /// Reconfigure the surface after a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    /// Update the camera matrix
    pub fn update_view_proj(&mut self, view_proj: Mat4) {
        self.road_uniforms.view_proj = view_proj.to_cols_array_2d();
        self.queue.write_buffer(
            &self.road_uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.road_uniforms]),
        );
    }

    /// Render a frame
    pub fn render(&self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Road Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            render_pass.set_bind_group(1, self.distortion.bind_group(), &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_frame_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    distortion: &GpuUniforms,
    road_uniform_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Frame Bind Group"),
        layout,
        entries: &[
            distortion.time_bind_group_entry(),
            wgpu::BindGroupEntry {
                binding: ROAD_BINDING,
                resource: road_uniform_buffer.as_entire_binding(),
            },
        ],
    })
}

fn create_road_pipeline(
    device: &wgpu::Device,
    profile: &DistortionProfile,
    frame_layout: &wgpu::BindGroupLayout,
    distortion: &GpuUniforms,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Road Shader"),
        source: wgpu::ShaderSource::Wgsl(road_program(profile).into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Road Pipeline Layout"),
        bind_group_layouts: &[frame_layout, distortion.layout()],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Road Render Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Steep bends can show the underside
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
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
