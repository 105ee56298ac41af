use glam::Vec3;
use id_arena::Id;

use crate::animation::Behavior;
use crate::picking::HoverTarget;
use crate::scene_graph::material::Material;
use crate::scene_graph::mesh::MeshId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// A line of text anchored at the object's world position.
///
/// Labels are sized in world units and laid out left/middle aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub font_size: f32,
    pub color: Vec3,
}

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub mesh_id: Option<MeshId>,
    pub material: Material,
    pub label: Option<TextLabel>,
    pub hover: Option<HoverTarget>,
    pub behavior: Option<Behavior>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.set_translation(translation);
        self
    }

    pub fn with_mesh(mut self, mesh_id: MeshId, material: Material) -> Self {
        self.mesh_id = Some(mesh_id);
        self.material = material;
        self
    }

    pub fn with_label(mut self, label: TextLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_hover(mut self, hover: HoverTarget) -> Self {
        self.hover = Some(hover);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            mesh_id: None,
            material: Material::default(),
            label: None,
            hover: None,
            behavior: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
