use glam::{Mat4, Quat, Vec2, Vec3};

use crate::config::CameraOptions;

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// Zoom factor applied per wheel step at `zoom_speed = 1`.
const ZOOM_STEP: f32 = 0.95;

/// Orbit camera rig around a focus point.
///
/// Spherical coordinates follow the Y-up convention: `polar` is measured from
/// +Y, `azimuth` rotates around +Y starting at +Z. Distance and polar angle
/// are clamped to the configured bounds after every change, so no input can
/// push the camera out of range.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    polar: f32,
    azimuth: f32,

    pending_polar: f32,
    pending_azimuth: f32,

    pub options: CameraOptions,
}

impl OrbitCamera {
    pub fn new(options: CameraOptions) -> Self {
        let target = Vec3::from_array(options.target);
        let offset = Vec3::from_array(options.position) - target;
        let distance = offset.length();

        let (polar, azimuth) = if distance > 0.0 {
            (
                (offset.y / distance).clamp(-1.0, 1.0).acos(),
                offset.x.atan2(offset.z),
            )
        } else {
            (std::f32::consts::FRAC_PI_2, 0.0)
        };

        let mut camera = Self {
            target,
            distance,
            polar,
            azimuth,
            pending_polar: 0.0,
            pending_azimuth: 0.0,
            options,
        };
        camera.clamp();
        camera
    }

    /// Queues a rotation from a pointer drag in physical pixels.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let scale = std::f32::consts::TAU / viewport_height * self.options.rotate_speed;
        self.pending_azimuth -= delta.x * scale;
        self.pending_polar -= delta.y * scale;

        if self.options.damping <= 0.0 {
            self.update();
        }
    }

    /// Moves closer for positive `steps` and further away for negative ones.
    pub fn zoom(&mut self, steps: f32) {
        let scale = ZOOM_STEP.powf(self.options.zoom_speed * steps);
        self.distance *= scale;
        self.clamp();
    }

    /// Translates the focus point in the view plane. Ignored unless panning
    /// is enabled.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32) {
        if !self.options.enable_pan || viewport_height <= 0.0 {
            return;
        }

        let rotation = self.rotation();
        let half_fov = (self.options.fovy.to_radians() * 0.5).tan();
        let units_per_pixel = 2.0 * self.distance * half_fov / viewport_height;
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;

        self.target += (right * -delta.x + up * delta.y) * units_per_pixel * self.options.pan_speed;
    }

    /// Applies queued rotation. With damping enabled only a fraction is
    /// applied per call and the remainder decays.
    pub fn update(&mut self) {
        let damping = self.options.damping;
        if damping > 0.0 {
            self.azimuth += self.pending_azimuth * damping;
            self.polar += self.pending_polar * damping;
            self.pending_azimuth *= 1.0 - damping;
            self.pending_polar *= 1.0 - damping;
        } else {
            self.azimuth += self.pending_azimuth;
            self.polar += self.pending_polar;
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        let options = &self.options;
        let min_polar = options.min_polar_angle.max(POLAR_EPSILON);
        let max_polar = options
            .max_polar_angle
            .min(std::f32::consts::PI - POLAR_EPSILON);

        self.polar = self.polar.clamp(min_polar, max_polar.max(min_polar));
        self.distance = self
            .distance
            .clamp(options.min_distance, options.max_distance);
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn polar_angle(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        let offset = Vec3::new(
            sin_polar * self.azimuth.sin(),
            self.polar.cos(),
            sin_polar * self.azimuth.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.options.fovy.to_radians(),
            aspect,
            self.options.znear,
            self.options.zfar,
        )
    }

    pub fn view_proj(&self, resolution: Vec2) -> Mat4 {
        let aspect = if resolution.y > 0.0 {
            resolution.x / resolution.y
        } else {
            1.0
        };
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space orientation of the camera.
    pub fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.view_matrix().inverse().to_scale_rotation_translation();
        rotation.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(CameraOptions::default())
    }

    fn assert_in_bounds(camera: &OrbitCamera) {
        let options = &camera.options;
        assert!(camera.distance() >= options.min_distance - 1e-5);
        assert!(camera.distance() <= options.max_distance + 1e-5);
        assert!(camera.polar_angle() >= options.min_polar_angle - 1e-5);
        assert!(camera.polar_angle() <= options.max_polar_angle + 1e-5);
    }

    #[test]
    fn starts_at_configured_position() {
        let camera = camera();
        assert!((camera.eye() - Vec3::new(0.0, 5.0, 10.0)).length() < 1e-4);
        assert!((camera.distance() - 125f32.sqrt()).abs() < 1e-4);
        assert_in_bounds(&camera);
    }

    #[test]
    fn out_of_range_start_is_clamped() {
        let camera = OrbitCamera::new(CameraOptions {
            position: [0.0, 100.0, 0.1],
            ..Default::default()
        });
        assert_in_bounds(&camera);
        assert!((camera.polar_angle() - FRAC_PI_4).abs() < 1e-5);
        assert!((camera.distance() - 20.0).abs() < 1e-5);
    }

    #[test]
    fn huge_scroll_stays_within_distance_bounds() {
        let mut camera = camera();
        camera.zoom(10_000.0);
        assert!((camera.distance() - 5.0).abs() < 1e-5);

        camera.zoom(-10_000.0);
        assert!((camera.distance() - 20.0).abs() < 1e-5);

        for steps in [-3.0, 7.5, -120.0, 0.25, 48.0] {
            camera.zoom(steps);
            assert_in_bounds(&camera);
        }
    }

    #[test]
    fn huge_drag_stays_within_polar_bounds() {
        let mut camera = camera();
        camera.rotate(Vec2::new(0.0, 1e6), 720.0);
        for _ in 0..500 {
            camera.update();
            assert_in_bounds(&camera);
        }
        assert!((camera.polar_angle() - FRAC_PI_4).abs() < 1e-4);

        camera.rotate(Vec2::new(3e5, -1e7), 720.0);
        for _ in 0..500 {
            camera.update();
            assert_in_bounds(&camera);
        }
        assert!((camera.polar_angle() - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn damping_converges_to_full_rotation() {
        let mut camera = camera();
        let start = camera.azimuth();
        camera.rotate(Vec2::new(-36.0, 0.0), 720.0);
        for _ in 0..1000 {
            camera.update();
        }
        let expected = std::f32::consts::TAU / 720.0 * 36.0;
        assert!((camera.azimuth() - start - expected).abs() < 1e-3);
    }

    #[test]
    fn undamped_rotation_applies_immediately() {
        let mut camera = OrbitCamera::new(CameraOptions {
            damping: 0.0,
            ..Default::default()
        });
        let start = camera.azimuth();
        camera.rotate(Vec2::new(-72.0, 0.0), 720.0);
        assert!((camera.azimuth() - start - std::f32::consts::TAU / 10.0).abs() < 1e-5);
    }

    #[test]
    fn pan_is_ignored_when_disabled() {
        let mut camera = camera();
        camera.pan(Vec2::new(100.0, 50.0), 720.0);
        assert_eq!(camera.target(), Vec3::ZERO);

        let mut camera = OrbitCamera::new(CameraOptions {
            enable_pan: true,
            ..Default::default()
        });
        camera.pan(Vec2::new(100.0, 0.0), 720.0);
        assert!(camera.target().x < 0.0);
    }

    #[test]
    fn rotation_faces_the_target() {
        let camera = camera();
        let forward = camera.rotation() * Vec3::NEG_Z;
        let expected = (camera.target() - camera.eye()).normalize();
        assert!((forward - expected).length() < 1e-4);
    }
}
