use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

/// Local placement of an object plus lazily computed matrices.
///
/// The local matrix is rebuilt on demand when translation, rotation or scale
/// change. The world matrix is written by the scene during transform
/// propagation and is only valid after `Scene::propagate_transforms`.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: f32,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    normal_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            normal_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
        }
    }

    pub fn local_matrix(&self) -> Ref<'_, Mat4> {
        if self.local_dirty.get() {
            let matrix = Mat4::from_scale_rotation_translation(
                Vec3::splat(self.scale),
                self.rotation,
                self.translation,
            );

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
            self.world_dirty.set(true);
        }

        self.local_matrix.borrow()
    }

    pub fn world_matrix(&self) -> Ref<'_, Mat4> {
        self.world_matrix.borrow()
    }

    /// Inverse transpose of the world matrix, for transforming normals.
    pub fn normal_matrix(&self) -> Ref<'_, Mat4> {
        self.normal_matrix.borrow()
    }

    pub fn world_translation(&self) -> Vec3 {
        self.world_matrix.borrow().w_axis.truncate()
    }

    pub(super) fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.normal_matrix
            .replace(world_matrix.inverse().transpose());
        self.world_dirty.set(false);
    }

    fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
    }

    pub(super) fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_translation_y(&mut self, y: f32) {
        self.translation.y = y;
        self.invalidate_local();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    /// Replaces the yaw component and keeps pitch and roll.
    pub fn set_rotation_y(&mut self, angle: f32) {
        let (_, x, z) = self.rotation.to_euler(EulerRot::YXZ);
        self.rotation = Quat::from_euler(EulerRot::YXZ, angle, x, z);
        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_matrix_follows_translation() {
        let mut transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            transform.local_matrix().w_axis.truncate(),
            Vec3::new(1.0, 2.0, 3.0)
        );

        transform.set_translation_y(-4.0);
        assert_eq!(
            transform.local_matrix().w_axis.truncate(),
            Vec3::new(1.0, -4.0, 3.0)
        );
    }

    #[test]
    fn set_rotation_y_keeps_other_axes() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        transform.set_rotation(Quat::from_euler(EulerRot::YXZ, 0.0, 0.3, 0.0));
        transform.set_rotation_y(0.7);

        let (y, x, z) = transform.rotation().to_euler(EulerRot::YXZ);
        assert!((y - 0.7).abs() < 1e-5);
        assert!((x - 0.3).abs() < 1e-5);
        assert!(z.abs() < 1e-5);
        assert!((transform.rotation_y() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn setters_mark_world_dirty() {
        let mut transform = Transform::from_translation(Vec3::ZERO);
        transform.set_world_matrix(Mat4::IDENTITY);
        assert!(!transform.is_world_dirty());

        transform.set_rotation_y(1.0);
        assert!(transform.is_world_dirty());
    }
}
