pub mod material;
pub mod mesh;
pub mod object3d;
pub mod scene;
pub mod transform;

pub use material::{srgb_hex, BlendMode, Material};
pub use mesh::{Mesh, MeshId, Topology, Vertex};
pub use object3d::{Object3D, ObjectId, TextLabel};
pub use scene::Scene;
pub use transform::Transform;
