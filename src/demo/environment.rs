use glam::Vec3;

use crate::scene_graph::srgb_hex;

/// Maximum number of point lights the scene shaders accept.
pub const MAX_POINT_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Linear fog between `near` and `far` view distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn factor(&self, distance: f32) -> f32 {
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub background: Vec3,
    pub fog: Fog,
    pub ambient_intensity: f32,
    pub point_lights: Vec<PointLight>,
}

impl Environment {
    pub fn new() -> Self {
        let night = srgb_hex(0x000020);

        Self {
            background: night,
            fog: Fog {
                color: night,
                near: 5.0,
                far: 30.0,
            },
            ambient_intensity: 0.2,
            point_lights: vec![
                PointLight {
                    position: Vec3::new(10.0, 10.0, 10.0),
                    color: srgb_hex(0xff00ff),
                    intensity: 1.0,
                },
                PointLight {
                    position: Vec3::new(-10.0, -10.0, -10.0),
                    color: srgb_hex(0x00ffff),
                    intensity: 1.0,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_factor_is_linear_and_clamped() {
        let fog = Environment::new().fog;
        assert_eq!(fog.factor(0.0), 0.0);
        assert_eq!(fog.factor(5.0), 0.0);
        assert!((fog.factor(17.5) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(30.0), 1.0);
        assert_eq!(fog.factor(500.0), 1.0);
    }

    #[test]
    fn lights_fit_in_the_uniform() {
        let environment = Environment::new();
        assert!(environment.point_lights.len() <= MAX_POINT_LIGHTS);
        assert_eq!(environment.background, environment.fog.color);
    }
}
