use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::scene_graph::{Material, Mesh, MeshId, Object3D, ObjectId, Scene, Topology, Vertex};

pub const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Triangles and lines read one vertex per vertex, point sprites read one
/// vertex per instance.
pub fn vertex_buffer_layout(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Mirrors `ObjectUniform` in `shared/scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniformState {
    pub model: Mat4,
    pub normal: Mat4,
    /// rgb base color, a opacity.
    pub color: Vec4,
    /// rgb emissive color premultiplied by intensity, w point size.
    pub emissive: Vec4,
    /// x metalness, y roughness, z fog enabled.
    pub surface: Vec4,
}

impl ObjectUniformState {
    pub fn new(object: &Object3D) -> Self {
        let material: &Material = &object.material;

        Self {
            model: *object.transform.world_matrix(),
            normal: *object.transform.normal_matrix(),
            color: material.color.extend(material.opacity),
            emissive: (material.emissive * material.emissive_intensity)
                .extend(material.point_size),
            surface: Vec4::new(
                material.metalness,
                material.roughness,
                if material.fog { 1.0 } else { 0.0 },
                0.0,
            ),
        }
    }
}

pub struct RenderMesh {
    pub topology: Topology,
    pub vertices: wgpu::Buffer,
    pub indices: Option<wgpu::Buffer>,
    pub element_count: u32,
}

impl RenderMesh {
    pub fn from_mesh(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = (mesh.topology != Topology::Points && !mesh.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} indices", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        Self {
            topology: mesh.topology,
            vertices,
            indices,
            element_count: mesh.element_count(),
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));

        match (&self.indices, self.topology) {
            (_, Topology::Points) => render_pass.draw(0..6, 0..self.element_count),
            (Some(indices), _) => {
                render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.element_count, 0, 0..1);
            }
            (None, _) => render_pass.draw(0..self.element_count, 0..1),
        }
    }
}

pub struct RenderObject {
    pub object_id: ObjectId,
    pub mesh_id: MeshId,
    pub transparent: bool,
    uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// GPU copies of the scene's meshes and per-object uniforms.
pub struct SceneBuffers {
    pub bind_group_layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshId, RenderMesh>,
    objects: Vec<RenderObject>,
}

impl SceneBuffers {
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object uniform bind group layout"),
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
        })
    }

    pub fn new(device: &wgpu::Device, bind_group_layout: wgpu::BindGroupLayout, scene: &Scene) -> Self {
        let meshes: HashMap<_, _> = scene
            .meshes
            .iter()
            .map(|(id, mesh)| (id, RenderMesh::from_mesh(device, mesh)))
            .collect();

        let objects = scene
            .objects
            .iter()
            .filter_map(|(object_id, object)| {
                let mesh_id = object.mesh_id?;

                let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} uniform", object.name)),
                    contents: bytemuck::cast_slice(&[ObjectUniformState::new(object)]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} bind group", object.name)),
                    layout: &bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });

                Some(RenderObject {
                    object_id,
                    mesh_id,
                    transparent: object.material.is_transparent(),
                    uniform_buffer,
                    bind_group,
                })
            })
            .collect::<Vec<_>>();

        log::info!(
            "Uploaded {} meshes for {} drawable objects",
            meshes.len(),
            objects.len()
        );

        Self {
            bind_group_layout,
            meshes,
            objects,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        for render_object in &self.objects {
            if let Some(object) = scene.get_object(render_object.object_id) {
                queue.write_buffer(
                    &render_object.uniform_buffer,
                    0,
                    bytemuck::cast_slice(&[ObjectUniformState::new(object)]),
                );
            }
        }
    }

    /// Opaque objects first, then transparent ones, each in composition order.
    pub fn draw_order(&self) -> impl Iterator<Item = (&RenderObject, &RenderMesh)> {
        let opaque = self.objects.iter().filter(|object| !object.transparent);
        let transparent = self.objects.iter().filter(|object| object.transparent);

        opaque
            .chain(transparent)
            .filter_map(|object| self.meshes.get(&object.mesh_id).map(|mesh| (object, mesh)))
    }
}
