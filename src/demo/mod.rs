mod environment;
mod objects;

use glam::{Mat4, Vec2, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::animation::{AnimationClock, FrameContext};
use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::interaction::InteractionState;
use crate::overlay::Overlay;
use crate::picking::{HoverTracker, Ray};
use crate::post_processing::{GlitchFrame, PostProcessChain};
use crate::scene_graph::{ObjectId, Scene};

pub use environment::{Environment, Fog, PointLight, MAX_POINT_LIGHTS};

/// Everything the frame loop animates and the renderer draws.
pub struct DemoState {
    pub camera: OrbitCamera,
    pub clock: AnimationClock,
    pub time: f32,
    pub scene: Scene,
    pub environment: Environment,
    pub post_processing: PostProcessChain,
    pub glitch: Option<GlitchFrame>,
    pub interaction: InteractionState,
    pub overlay: Overlay,
    pub label_group: ObjectId,
    hover: HoverTracker,
}

impl DemoState {
    pub fn new(config: &SceneConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Composes the scene. Draw order follows the order objects are spawned
    /// here.
    pub fn with_rng(config: &SceneConfig, mut rng: StdRng) -> Self {
        let mut scene = Scene::new();

        objects::spawn_stars(&mut scene, config.scene.star_count, &mut rng);
        objects::spawn_grid(&mut scene);
        objects::spawn_orb(&mut scene, "left orb", Vec3::new(-2.0, 2.0, 0.0));
        objects::spawn_orb(&mut scene, "right orb", Vec3::new(2.0, 2.0, 0.0));
        objects::spawn_logo(&mut scene);
        let label_group = objects::spawn_labels(&mut scene, &config.scene.labels);
        objects::spawn_particles(&mut scene, config.scene.particle_count, &mut rng);

        scene.propagate_transforms();

        let glitch_rng = StdRng::seed_from_u64(rng.gen());

        log::info!(
            "Scene composed: {} objects, {} meshes",
            scene.objects.len(),
            scene.meshes.len()
        );

        Self {
            camera: OrbitCamera::new(config.camera.clone()),
            clock: AnimationClock::start(),
            time: 0.0,
            scene,
            environment: Environment::new(),
            post_processing: PostProcessChain::with_rng(&config.post_processing, glitch_rng),
            glitch: None,
            interaction: InteractionState::new(),
            overlay: Overlay::new(config.overlay.clone()),
            label_group,
            hover: HoverTracker::new(),
        }
    }

    /// Advances the scene to `time` seconds.
    pub fn update(&mut self, time: f32, cursor: Option<Vec2>, viewport: Vec2) {
        self.time = time;
        self.camera.update();

        let camera_rotation = self.camera.rotation();
        let scene = &mut self.scene;
        self.interaction.with_hovered(|hovered| {
            scene.animate(&FrameContext {
                time,
                camera_rotation,
                hovered,
            })
        });
        self.scene.propagate_transforms();

        self.pointer_moved(cursor, viewport);

        let glitch = self.post_processing.sample_glitch(time);
        self.glitch = glitch.filter(|_| self.post_processing.glitch_enabled());
    }

    /// Re-runs hit testing for a new cursor position. `None` means the
    /// cursor left the window.
    pub fn pointer_moved(&mut self, cursor: Option<Vec2>, viewport: Vec2) {
        let ray = cursor.and_then(|cursor| {
            Ray::from_screen(cursor, viewport, self.view_proj(viewport).inverse())
        });

        for event in self.hover.update(&self.scene, ray.as_ref()) {
            event.dispatch(&self.interaction);
        }
    }

    pub fn view_proj(&self, viewport: Vec2) -> Mat4 {
        self.camera.view_proj(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Object3D;

    fn state(seed: u64) -> DemoState {
        DemoState::with_rng(&SceneConfig::default(), StdRng::seed_from_u64(seed))
    }

    fn is_point_cloud(scene: &Scene, object: &Object3D) -> bool {
        object
            .mesh_id
            .and_then(|id| scene.mesh(id))
            .is_some_and(|mesh| mesh.topology == crate::scene_graph::Topology::Points)
    }

    #[test]
    fn composition_order_is_stable() {
        let state = state(1);
        let roots: Vec<_> = state
            .scene
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(_, object)| object.name.as_str())
            .collect();

        assert_eq!(
            roots,
            ["stars", "grid", "left orb", "right orb", "logo", "labels", "particles"]
        );

        let labels = state.scene.get_object(state.label_group).unwrap();
        assert_eq!(labels.child_ids.len(), 7);
    }

    #[test]
    fn two_builds_have_identical_transforms() {
        let a = state(1);
        let b = state(2);

        for ((_, x), (_, y)) in a.scene.objects.iter().zip(b.scene.objects.iter()) {
            assert_eq!(x.name, y.name);
            assert_eq!(*x.transform.world_matrix(), *y.transform.world_matrix());
            assert_eq!(x.material, y.material);

            if !is_point_cloud(&a.scene, x) {
                let mesh_a = x.mesh_id.and_then(|id| a.scene.mesh(id));
                let mesh_b = y.mesh_id.and_then(|id| b.scene.mesh(id));
                assert_eq!(
                    mesh_a.map(|m| &m.vertices),
                    mesh_b.map(|m| &m.vertices)
                );
            }
        }
    }

    #[test]
    fn initial_poses_match_the_layout() {
        let state = state(3);
        let scene = &state.scene;
        let position = |name: &str| {
            scene
                .world_translation(scene.get_object_by_name(name).unwrap())
                .unwrap()
        };

        assert_eq!(position("logo"), Vec3::new(0.0, 4.0, -3.0));
        assert_eq!(position("left orb"), Vec3::new(-2.0, 2.0, 0.0));
        assert_eq!(position("right orb"), Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(position("grid"), Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(position("label 0"), Vec3::new(-2.0, 3.0, -3.0));
        assert_eq!(position("label 6"), Vec3::new(-2.0, 0.0, -3.0));
    }

    #[test]
    fn labels_follow_the_camera_after_update() {
        let mut state = state(4);
        state.camera.rotate(Vec2::new(150.0, -40.0), 720.0);
        for frame in 0..30 {
            state.update(frame as f32 / 60.0, None, Vec2::new(1280.0, 720.0));
        }

        let group = state.scene.get_object(state.label_group).unwrap();
        assert!(group
            .transform
            .rotation()
            .abs_diff_eq(state.camera.rotation(), 1e-5));
    }

    #[test]
    fn logo_at_time_zero() {
        let mut state = state(5);
        state.update(0.0, None, Vec2::new(1280.0, 720.0));

        let logo = state.scene.get_object_by_name("logo").unwrap();
        let logo = state.scene.get_object(logo).unwrap();
        assert_eq!(logo.transform.translation().y, 4.0);
        assert_eq!(logo.transform.rotation_y(), 0.0);
    }

    #[test]
    fn hovering_an_orb_updates_interaction_and_glow() {
        let mut state = state(6);
        let viewport = Vec2::new(1280.0, 720.0);
        state.update(0.0, None, viewport);

        let right = state.scene.get_object_by_name("right orb").unwrap();
        let center = state.scene.world_translation(right).unwrap();
        let clip = state.view_proj(viewport) * center.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let cursor = Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.x,
            (0.5 - ndc.y * 0.5) * viewport.y,
        );

        state.pointer_moved(Some(cursor), viewport);
        assert_eq!(state.interaction.hovered_object().as_deref(), Some("orb"));

        state.update(0.0, Some(cursor), viewport);
        let orb = state.scene.get_object(right).unwrap();
        assert_eq!(orb.material.emissive_intensity, 1.5);

        state.pointer_moved(None, viewport);
        assert_eq!(state.interaction.hovered_object(), None);

        state.update(0.0, None, viewport);
        let orb = state.scene.get_object(right).unwrap();
        assert_eq!(orb.material.emissive_intensity, 0.5);
    }
}
