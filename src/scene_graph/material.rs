use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    Alpha,
}

/// Surface description shared by meshes, line sets and point clouds.
///
/// Colors are linear RGB. Use [`srgb_hex`] to build them from the usual
/// `#rrggbb` notation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub opacity: f32,
    pub metalness: f32,
    pub roughness: f32,
    /// World-space diameter of a point sprite. Only used by point clouds.
    pub point_size: f32,
    pub blend: BlendMode,
    pub fog: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            point_size: 1.0,
            blend: BlendMode::Opaque,
            fog: true,
        }
    }
}

impl Material {
    pub fn emissive(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            emissive: color,
            emissive_intensity: intensity,
            ..Default::default()
        }
    }

    /// Unlit, alpha blended material for lines and points.
    pub fn basic(color: Vec3, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            blend: BlendMode::Alpha,
            ..Default::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.blend == BlendMode::Alpha
    }
}

/// Converts a `0xRRGGBB` sRGB color to linear RGB.
pub fn srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}
