use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::demo::{DemoState, MAX_POINT_LIGHTS};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuPointLight {
    /// xyz position, w intensity.
    pub position: Vec4,
    pub color: Vec4,
}

/// Per-frame values shared by every scene shader. Mirrors `FrameUniform`
/// in `shared/scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniformState {
    pub view_proj: Mat4,
    pub camera_right: Vec4,
    pub camera_up: Vec4,
    pub eye: Vec4,
    pub resolution: Vec2,
    pub time: f32,
    pub ambient: f32,
    pub fog_color: Vec4,
    pub fog_near: f32,
    pub fog_far: f32,
    pub light_count: u32,
    _padding: f32,
    pub lights: [GpuPointLight; MAX_POINT_LIGHTS],
}

impl FrameUniformState {
    pub fn new(state: &DemoState, size: PhysicalSize<u32>) -> Self {
        let resolution = Vec2::new(size.width as f32, size.height as f32);
        let rotation = state.camera.rotation();
        let environment = &state.environment;

        let mut lights = [GpuPointLight::default(); MAX_POINT_LIGHTS];
        for (gpu_light, light) in lights.iter_mut().zip(&environment.point_lights) {
            *gpu_light = GpuPointLight {
                position: light.position.extend(light.intensity),
                color: light.color.extend(1.0),
            };
        }

        Self {
            view_proj: state.view_proj(resolution),
            camera_right: (rotation * Vec3::X).extend(0.0),
            camera_up: (rotation * Vec3::Y).extend(0.0),
            eye: state.camera.eye().extend(1.0),
            resolution,
            time: state.time,
            ambient: environment.ambient_intensity,
            fog_color: environment.fog.color.extend(1.0),
            fog_near: environment.fog.near,
            fog_far: environment.fog.far,
            light_count: environment.point_lights.len().min(MAX_POINT_LIGHTS) as u32,
            _padding: 0.0,
            lights,
        }
    }
}

pub struct FrameUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniformState::zeroed()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame uniform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: FrameUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniformState>(), 288);
        assert_eq!(std::mem::size_of::<FrameUniformState>() % 16, 0);
    }
}
