//! Runs the generated `getDistortion` on the GPU and reads the results back.
//!
//! Complements the naga interpreter in [`crate::parity`]: the same WGSL goes
//! through the driver's real shader compiler, so agreement here is only
//! expected within a looser tolerance.

use glam::Vec3;
use log::{debug, info};
use wgpu::util::DeviceExt;

use crate::binder::{GpuUniforms, QueueTarget, UniformBinder};
use crate::error::{DistortionError, Result};
use crate::parity::{ParityGrid, ParityReport};
use crate::profile::DistortionProfile;
use crate::shader::probe_program;

const WORKGROUP_SIZE: u32 = 64;
const PROBE_GROUP: u32 = 2;

/// Headless device used for shader probing
pub struct GpuProbe {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuProbe {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| DistortionError::Gpu("failed to find GPU adapter".to_string()))?;

        info!("probing on {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Distortion Probe Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| DistortionError::Gpu(format!("failed to request device: {}", e)))?;

        Ok(Self { device, queue })
    }

    /// Evaluate `getDistortion` on the GPU across the grid and compare with
    /// the host formula
    pub async fn check_profile(
        &self,
        profile: &DistortionProfile,
        grid: &ParityGrid,
    ) -> Result<ParityReport> {
        let progress = grid.progress_values();
        if progress.is_empty() {
            return Ok(ParityReport {
                id: profile.id().to_string(),
                samples: 0,
                max_error: 0.0,
            });
        }

        let source = probe_program(profile);
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Distortion Probe Shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let uniforms = GpuUniforms::new(&self.device, profile);
        let mut binder = UniformBinder::new();
        binder.bind(
            profile,
            &mut QueueTarget {
                queue: &self.queue,
                uniforms: &uniforms,
            },
        )?;

        let time_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Probe Time Layout"),
                entries: &[GpuUniforms::time_layout_entry()],
            });
        let time_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Probe Time Bind Group"),
            layout: &time_layout,
            entries: &[uniforms.time_bind_group_entry()],
        });

        let progress_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Probe Progress Buffer"),
                contents: bytemuck::cast_slice(&progress),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let output_size = (progress.len() * std::mem::size_of::<[f32; 4]>()) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Probe Output Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let io_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Probe IO Layout"),
                entries: &[storage_entry(0, true), storage_entry(1, false)],
            });
        let io_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Probe IO Bind Group"),
            layout: &io_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: progress_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Probe Pipeline Layout"),
                bind_group_layouts: &[&time_layout, uniforms.layout(), &io_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Distortion Probe Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("probe_main"),
                compilation_options: Default::default(),
                cache: None,
            });

        let mut report = ParityReport {
            id: profile.id().to_string(),
            samples: 0,
            max_error: 0.0,
        };

        for time in grid.time_values() {
            binder.tick(
                time,
                &mut QueueTarget {
                    queue: &self.queue,
                    uniforms: &uniforms,
                },
            );

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Probe Encoder"),
                });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Probe Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, &time_group, &[]);
                pass.set_bind_group(1, uniforms.bind_group(), &[]);
                pass.set_bind_group(PROBE_GROUP, &io_group, &[]);
                let groups = (progress.len() as u32).div_ceil(WORKGROUP_SIZE);
                pass.dispatch_workgroups(groups, 1, 1);
            }

            let results = self.read_back(encoder, &output_buffer, output_size).await?;

            for (&p, value) in progress.iter().zip(results.chunks_exact(4)) {
                let host = profile.displacement(p, time);
                let shader = Vec3::new(value[0], value[1], value[2]);
                if !grid.accepts(host, shader) {
                    return Err(DistortionError::ParityMismatch {
                        id: report.id,
                        progress: p,
                        time,
                        host,
                        shader,
                        tolerance: grid.tolerance,
                    });
                }
                report.samples += 1;
                report.max_error = report.max_error.max((host - shader).abs().max_element());
            }
        }

        debug!(
            "gpu parity '{}': {} samples, max error {:e}",
            report.id, report.samples, report.max_error
        );
        Ok(report)
    }

    /// Submit `encoder` with a copy of `source` into a staging buffer, then
    /// wait for the mapped contents
    async fn read_back(
        &self,
        mut encoder: wgpu::CommandEncoder,
        source: &wgpu::Buffer,
        size: u64,
    ) -> Result<Vec<f32>> {
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Probe Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        encoder.copy_buffer_to_buffer(source, 0, &staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if the probe was dropped mid-read
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .await
            .map_err(|_| DistortionError::Gpu("buffer map was cancelled".to_string()))?
            .map_err(|e| DistortionError::Gpu(format!("failed to map buffer: {}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();

        drop(data);
        staging_buffer.unmap();

        Ok(result)
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
