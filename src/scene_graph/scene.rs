use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::animation::FrameContext;
use crate::scene_graph::mesh::{Mesh, MeshId};
use crate::scene_graph::object3d::{Object3D, ObjectId};

/// Retained scene graph. Objects and meshes are allocated once when the
/// scene is composed and live until the scene is dropped.
pub struct Scene {
    pub objects: Arena<Object3D>,
    pub meshes: Arena<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            meshes: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn add_child(&mut self, parent_id: ObjectId, object: Object3D) -> ObjectId {
        let child_id = self.add_object(object);
        self.set_object_parent(child_id, Some(parent_id));
        child_id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    #[cfg(test)]
    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    #[cfg(test)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.alloc(mesh)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Runs every object's behavior for this frame.
    pub fn animate(&mut self, ctx: &FrameContext) {
        let mut animated = Vec::new();

        for (id, object) in self.objects.iter_mut() {
            let Object3D {
                behavior,
                transform,
                material,
                hover,
                ..
            } = object;

            if let Some(behavior) = behavior {
                behavior.apply(ctx, transform, material, hover.as_ref());
                animated.push(id);
            }
        }

        for id in animated {
            self.invalidate_object_hierarchy(id);
        }
    }

    /// Recomputes world matrices for every object whose world transform is
    /// out of date, parents before children.
    pub fn propagate_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.propagate_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn propagate_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        if object.transform.is_world_dirty() {
            let local_matrix = *object.transform.local_matrix();
            object
                .transform
                .set_world_matrix(parent_world_matrix * local_matrix);
        }

        let world_matrix = *object.transform.world_matrix();
        for &child_id in &object.child_ids {
            self.propagate_transform_recursive(child_id, world_matrix);
        }
    }

    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|c| c.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn world_translation(&self, object_id: ObjectId) -> Option<Vec3> {
        self.objects
            .get(object_id)
            .map(|object| object.transform.world_translation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn child_world_matrix_includes_parent() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::new("parent").at(Vec3::new(1.0, 0.0, 0.0)));
        let child = scene.add_child(parent, Object3D::new("child").at(Vec3::new(0.0, 2.0, 0.0)));

        scene.propagate_transforms();

        let position = scene.world_translation(child).unwrap();
        assert!((position - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn rotating_parent_moves_children() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::new("group"));
        let child = scene.add_child(parent, Object3D::new("label").at(Vec3::new(0.0, 0.0, -3.0)));
        scene.propagate_transforms();

        scene
            .get_object_mut(parent)
            .unwrap()
            .transform
            .set_rotation(Quat::from_rotation_y(std::f32::consts::PI));
        scene.invalidate_object_hierarchy(parent);
        scene.propagate_transforms();

        let position = scene.world_translation(child).unwrap();
        assert!((position - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn reparenting_updates_child_lists() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::new("a"));
        let b = scene.add_object(Object3D::new("b"));
        let child = scene.add_child(a, Object3D::new("child"));

        scene.set_object_parent(child, Some(b));

        assert!(scene.get_object(a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(b).unwrap().child_ids, vec![child]);
        let names: Vec<_> = scene
            .get_object(b)
            .unwrap()
            .children(&scene)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["child"]);
    }

    #[test]
    fn find_object_by_name() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object3D::new("logo"));
        assert_eq!(scene.get_object_by_name("logo"), Some(id));
        assert_eq!(scene.get_object_by_name("missing"), None);
    }
}
