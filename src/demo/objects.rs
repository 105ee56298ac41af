use glam::Vec3;
use rand::Rng;

use crate::animation::Behavior;
use crate::geometry;
use crate::picking::HoverTarget;
use crate::scene_graph::{srgb_hex, BlendMode, Material, Object3D, ObjectId, Scene, TextLabel};

pub const ORB_ID: &str = "orb";
const ORB_RADIUS: f32 = 0.5;
const ORB_SEGMENTS: u32 = 32;

const LOGO_POSITION: Vec3 = Vec3::new(0.0, 4.0, -3.0);

const LABEL_ORIGIN: Vec3 = Vec3::new(-2.0, 3.0, -3.0);
const LABEL_SPACING: f32 = 0.5;
const LABEL_FONT_SIZE: f32 = 0.3;

pub fn spawn_stars(scene: &mut Scene, count: usize, rng: &mut impl Rng) -> ObjectId {
    let mesh = scene.add_mesh(geometry::star_shell("stars", count, 100.0, 50.0, rng));
    let material = Material {
        point_size: 0.8,
        fog: false,
        ..Default::default()
    };

    scene.add_object(Object3D::new("stars").with_mesh(mesh, material))
}

pub fn spawn_grid(scene: &mut Scene) -> ObjectId {
    let mesh = scene.add_mesh(geometry::grid_lines("grid", 20.0, 20));

    scene.add_object(
        Object3D::new("grid")
            .at(Vec3::new(0.0, -2.0, 0.0))
            .with_mesh(mesh, Material::basic(srgb_hex(0x00ff88), 0.5))
            .with_behavior(Behavior::Pulse),
    )
}

pub fn spawn_orb(scene: &mut Scene, name: &str, position: Vec3) -> ObjectId {
    let mesh = scene.add_mesh(geometry::uv_sphere(
        name,
        ORB_RADIUS,
        ORB_SEGMENTS,
        ORB_SEGMENTS,
    ));
    let material = Material {
        metalness: 0.8,
        roughness: 0.2,
        ..Material::emissive(srgb_hex(0xff00ff), 0.5)
    };

    scene.add_object(
        Object3D::new(name)
            .at(position)
            .with_mesh(mesh, material)
            .with_hover(HoverTarget::new(ORB_ID, ORB_RADIUS))
            .with_behavior(Behavior::Float {
                base: position,
                emissive_intensity: 0.5,
                hovered_emissive_intensity: 1.5,
            }),
    )
}

/// The logo group carries the sway, its child carries the geometry.
pub fn spawn_logo(scene: &mut Scene) -> ObjectId {
    let mesh = scene.add_mesh(geometry::shape_mesh("bolt", &geometry::BOLT_OUTLINE));

    let group = scene.add_object(
        Object3D::new("logo")
            .at(LOGO_POSITION)
            .with_behavior(Behavior::Sway {
                base_y: LOGO_POSITION.y,
            }),
    );
    scene.add_child(
        group,
        Object3D::new("bolt").with_mesh(mesh, Material::emissive(srgb_hex(0x00ffff), 2.0)),
    );

    group
}

pub fn spawn_labels(scene: &mut Scene, lines: &[String]) -> ObjectId {
    let group = scene.add_object(Object3D::new("labels").with_behavior(Behavior::Billboard));

    for (index, text) in lines.iter().enumerate() {
        let position = LABEL_ORIGIN - Vec3::Y * (LABEL_SPACING * index as f32);
        scene.add_child(
            group,
            Object3D::new(format!("label {index}"))
                .at(position)
                .with_label(TextLabel {
                    text: text.clone(),
                    font_size: LABEL_FONT_SIZE,
                    color: srgb_hex(0x00ffff),
                }),
        );
    }

    group
}

pub fn spawn_particles(scene: &mut Scene, count: usize, rng: &mut impl Rng) -> ObjectId {
    let mesh = scene.add_mesh(geometry::particle_cube("particles", count, 20.0, rng));
    let material = Material {
        point_size: 0.05,
        blend: BlendMode::Alpha,
        ..Material::basic(srgb_hex(0x00ffff), 0.6)
    };

    scene.add_object(Object3D::new("particles").with_mesh(mesh, material))
}
