use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use id_arena::Id;

pub type MeshId = Id<Mesh>;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    pub fn point(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Lines,
    /// One camera-facing sprite per vertex. Indices are unused.
    Points,
}

/// Static geometry, built once when the scene is composed.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub topology: Topology,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn element_count(&self) -> u32 {
        match self.topology {
            Topology::Points => self.vertices.len() as u32,
            Topology::Triangles | Topology::Lines => self.indices.len() as u32,
        }
    }
}
