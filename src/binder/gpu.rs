//! wgpu buffers and bind group backing a profile's uniforms.

use crate::error::{DistortionError, Result};
use crate::profile::{DistortionProfile, UniformValue};
use crate::shader::TIME_BINDING;

use super::UniformTarget;

/// Every profile uniform is padded to a vec4
const UNIFORM_SIZE: wgpu::BufferAddress = 16;

const VISIBILITY: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX
    .union(wgpu::ShaderStages::FRAGMENT)
    .union(wgpu::ShaderStages::COMPUTE);

#[derive(Debug, Clone, Copy)]
struct SlotLayout {
    name: &'static str,
    arity: usize,
}

/// `uTime` buffer plus one buffer per profile uniform in the distortion group
pub struct GpuUniforms {
    profile_id: String,
    time_buffer: wgpu::Buffer,
    slots: Vec<SlotLayout>,
    buffers: Vec<wgpu::Buffer>,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GpuUniforms {
    /// Allocate buffers matching the layout generated for `profile`
    pub fn new(device: &wgpu::Device, profile: &DistortionProfile) -> Self {
        let time_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Time Uniform Buffer"),
            size: UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let slots: Vec<SlotLayout> = profile
            .uniforms()
            .iter()
            .map(|(name, value)| SlotLayout { name, arity: value.arity() })
            .collect();

        let buffers: Vec<wgpu::Buffer> = slots
            .iter()
            .map(|slot| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(slot.name),
                    size: UNIFORM_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..slots.len() as u32)
            .map(uniform_layout_entry)
            .collect();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Distortion Bind Group Layout"),
            entries: &layout_entries,
        });

        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(slot, buffer)| wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Distortion Bind Group"),
            layout: &layout,
            entries: &entries,
        });

        Self {
            profile_id: profile.id().to_string(),
            time_buffer,
            slots,
            buffers,
            layout,
            bind_group,
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Layout of the distortion group (`@group(1)`)
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Buffer behind `uTime`; consumers place it in their own `@group(0)`
    pub fn time_buffer(&self) -> &wgpu::Buffer {
        &self.time_buffer
    }

    /// Layout entry for `uTime` inside a consumer's `@group(0)`
    pub fn time_layout_entry() -> wgpu::BindGroupLayoutEntry {
        uniform_layout_entry(TIME_BINDING)
    }

    /// Bind group entry for `uTime` inside a consumer's `@group(0)`
    pub fn time_bind_group_entry(&self) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding: TIME_BINDING,
            resource: self.time_buffer.as_entire_binding(),
        }
    }
}

/// Reject a write whose binding, name or arity differs from the layout
fn check_slot(
    id: &str,
    slots: &[SlotLayout],
    slot: u32,
    name: &str,
    value: &UniformValue,
) -> Result<()> {
    let layout = slots.get(slot as usize).ok_or_else(|| {
        DistortionError::invalid(id, format!("no uniform buffer at binding {}", slot))
    })?;

    if layout.name != name {
        return Err(DistortionError::invalid(
            id,
            format!("binding {} holds '{}', not '{}'", slot, layout.name, name),
        ));
    }
    if layout.arity != value.arity() {
        return Err(DistortionError::invalid(
            id,
            format!(
                "uniform '{}' has {} components, layout expects {}",
                name,
                value.arity(),
                layout.arity
            ),
        ));
    }
    Ok(())
}

fn uniform_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: VISIBILITY,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Writes uniforms through a queue into a [`GpuUniforms`] layout
pub struct QueueTarget<'a> {
    pub queue: &'a wgpu::Queue,
    pub uniforms: &'a GpuUniforms,
}

impl UniformTarget for QueueTarget<'_> {
    fn write_uniform(&mut self, slot: u32, name: &str, value: &UniformValue) -> Result<()> {
        let uniforms = self.uniforms;
        check_slot(uniforms.profile_id(), &uniforms.slots, slot, name, value)?;

        self.queue.write_buffer(
            &uniforms.buffers[slot as usize],
            0,
            bytemuck::cast_slice(&value.to_padded()),
        );
        Ok(())
    }

    fn write_time(&mut self, time_s: f32) {
        self.queue.write_buffer(
            &self.uniforms.time_buffer,
            0,
            bytemuck::cast_slice(&[time_s, 0.0, 0.0, 0.0]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec4};

    fn turbulent_slots() -> Vec<SlotLayout> {
        vec![
            SlotLayout { name: "uFreq", arity: 4 },
            SlotLayout { name: "uAmp", arity: 4 },
        ]
    }

    #[test]
    fn test_matching_write_accepted() {
        let slots = turbulent_slots();
        let value = UniformValue::Vec4(Vec4::new(25.0, 5.0, 10.0, 10.0));

        assert!(check_slot("turbulent", &slots, 1, "uAmp", &value).is_ok());
    }

    #[test]
    fn test_write_past_last_binding_rejected() {
        let slots = turbulent_slots();
        let value = UniformValue::Vec4(Vec4::ONE);

        let result = check_slot("turbulent", &slots, 2, "uAmp", &value);
        assert!(matches!(
            result,
            Err(DistortionError::InvalidProfile { ref id, .. }) if id == "turbulent"
        ));
    }

    #[test]
    fn test_write_under_wrong_name_rejected() {
        let slots = turbulent_slots();
        let value = UniformValue::Vec4(Vec4::ONE);

        let result = check_slot("turbulent", &slots, 0, "uAmp", &value);
        assert!(matches!(result, Err(DistortionError::InvalidProfile { .. })));
    }

    #[test]
    fn test_vec2_into_vec4_slot_rejected() {
        let slots = turbulent_slots();
        let value = UniformValue::Vec2(Vec2::new(10.0, 20.0));

        let result = check_slot("turbulent", &slots, 0, "uFreq", &value);
        assert!(matches!(result, Err(DistortionError::InvalidProfile { .. })));
    }
}
