//! Pointer ray casting and hover enter/leave tracking.

use glam::{Mat4, Vec2, Vec3};

use crate::interaction::InteractionState;
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a world-space ray through a cursor position in physical pixels.
    pub fn from_screen(cursor: Vec2, viewport: Vec2, inverse_view_proj: Mat4) -> Option<Ray> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }

        let ndc = Vec2::new(
            cursor.x / viewport.x * 2.0 - 1.0,
            1.0 - cursor.y / viewport.y * 2.0,
        );

        let near = inverse_view_proj.project_point3(ndc.extend(0.0));
        let far = inverse_view_proj.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;

        Some(Ray {
            origin: near,
            direction,
        })
    }

    /// Distance along the ray to the nearest intersection with a sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let to_center = self.origin - center;
        let b = to_center.dot(self.direction);
        let c = to_center.length_squared() - radius * radius;
        let discriminant = b * b - c;

        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;

        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}

/// Makes an object pointer-sensitive. The object is hit-tested as a sphere
/// of `radius` around its world position.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub id: String,
    pub radius: f32,
}

impl HoverTarget {
    pub fn new(id: impl Into<String>, radius: f32) -> Self {
        Self {
            id: id.into(),
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Enter { object: ObjectId, id: String },
    Leave { object: ObjectId, id: String },
}

impl PointerEvent {
    /// Writes the event into the shared interaction state.
    pub fn dispatch(&self, interaction: &InteractionState) {
        match self {
            PointerEvent::Enter { id, .. } => interaction.set_hovered_object(Some(id)),
            PointerEvent::Leave { .. } => interaction.set_hovered_object(None),
        }
    }
}

/// Remembers which object is under the pointer and reports transitions.
#[derive(Debug, Default)]
pub struct HoverTracker {
    hovered: Option<(ObjectId, String)>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered.as_ref().map(|(id, _)| *id)
    }

    /// Nearest hover target hit by `ray`. World matrices must be current.
    pub fn pick(scene: &Scene, ray: &Ray) -> Option<(ObjectId, f32)> {
        scene
            .objects
            .iter()
            .filter_map(|(id, object)| {
                let target = object.hover.as_ref()?;
                let center = object.transform.world_translation();
                ray.intersect_sphere(center, target.radius)
                    .map(|distance| (id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Updates the hovered object. Leave events always precede enter events.
    pub fn update(&mut self, scene: &Scene, ray: Option<&Ray>) -> Vec<PointerEvent> {
        let hit = ray
            .and_then(|ray| Self::pick(scene, ray))
            .map(|(id, _)| id);

        let current = self.hovered.as_ref().map(|(id, _)| *id);
        if hit == current {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);

        if let Some((object, id)) = self.hovered.take() {
            events.push(PointerEvent::Leave { object, id });
        }

        if let Some(object) = hit {
            let id = scene
                .get_object(object)
                .and_then(|o| o.hover.as_ref())
                .map(|target| target.id.clone())
                .unwrap_or_default();
            events.push(PointerEvent::Enter {
                object,
                id: id.clone(),
            });
            self.hovered = Some((object, id));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Object3D;

    fn ray_towards(target: Vec3) -> Ray {
        let origin = Vec3::new(0.0, 2.0, 10.0);
        Ray {
            origin,
            direction: (target - origin).normalize(),
        }
    }

    fn orb_scene() -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let left = scene.add_object(
            Object3D::new("left")
                .at(Vec3::new(-2.0, 2.0, 0.0))
                .with_hover(HoverTarget::new("orb", 0.5)),
        );
        let right = scene.add_object(
            Object3D::new("right")
                .at(Vec3::new(2.0, 2.0, 0.0))
                .with_hover(HoverTarget::new("orb", 0.5)),
        );
        scene.propagate_transforms();
        (scene, left, right)
    }

    #[test]
    fn ray_hits_sphere_through_center() {
        let ray = ray_towards(Vec3::new(-2.0, 2.0, 0.0));
        let distance = ray.intersect_sphere(Vec3::new(-2.0, 2.0, 0.0), 0.5).unwrap();
        let expected = (Vec3::new(-2.0, 2.0, 0.0) - ray.origin).length() - 0.5;
        assert!((distance - expected).abs() < 1e-4);
    }

    #[test]
    fn ray_misses_beside_sphere() {
        let ray = ray_towards(Vec3::new(-2.0, 3.0, 0.0));
        assert_eq!(ray.intersect_sphere(Vec3::new(-2.0, 2.0, 0.0), 0.5), None);
    }

    #[test]
    fn sphere_behind_ray_is_ignored() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        };
        assert_eq!(ray.intersect_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0), None);
    }

    #[test]
    fn screen_center_ray_points_forward() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(75f32.to_radians(), 1.0, 0.1, 1000.0);
        let inverse = (projection * view).inverse();

        let ray = Ray::from_screen(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0), inverse).unwrap();
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!(Ray::from_screen(Vec2::ZERO, Vec2::ZERO, inverse).is_none());
    }

    #[test]
    fn enter_and_leave_update_interaction_state() {
        let (scene, left, _) = orb_scene();
        let interaction = InteractionState::new();
        let mut tracker = HoverTracker::new();

        let events = tracker.update(&scene, Some(&ray_towards(Vec3::new(-2.0, 2.0, 0.0))));
        assert_eq!(
            events,
            vec![PointerEvent::Enter {
                object: left,
                id: "orb".to_owned()
            }]
        );
        events.iter().for_each(|e| e.dispatch(&interaction));
        assert_eq!(interaction.hovered_object().as_deref(), Some("orb"));

        let events = tracker.update(&scene, Some(&ray_towards(Vec3::new(0.0, 8.0, 0.0))));
        assert!(matches!(events.as_slice(), [PointerEvent::Leave { .. }]));
        events.iter().for_each(|e| e.dispatch(&interaction));
        assert_eq!(interaction.hovered_object(), None);
    }

    #[test]
    fn moving_between_targets_leaves_before_entering() {
        let (scene, left, right) = orb_scene();
        let interaction = InteractionState::new();
        let mut tracker = HoverTracker::new();

        tracker.update(&scene, Some(&ray_towards(Vec3::new(-2.0, 2.0, 0.0))));
        let events = tracker.update(&scene, Some(&ray_towards(Vec3::new(2.0, 2.0, 0.0))));

        assert!(matches!(events[0], PointerEvent::Leave { object, .. } if object == left));
        assert!(matches!(events[1], PointerEvent::Enter { object, .. } if object == right));

        events.iter().for_each(|e| e.dispatch(&interaction));
        assert_eq!(interaction.hovered_object().as_deref(), Some("orb"));
        assert_eq!(tracker.hovered(), Some(right));
    }

    #[test]
    fn staying_on_target_emits_nothing() {
        let (scene, _, _) = orb_scene();
        let mut tracker = HoverTracker::new();
        let ray = ray_towards(Vec3::new(2.0, 2.0, 0.0));

        assert_eq!(tracker.update(&scene, Some(&ray)).len(), 1);
        assert!(tracker.update(&scene, Some(&ray)).is_empty());
    }

    #[test]
    fn losing_the_cursor_leaves() {
        let (scene, _, _) = orb_scene();
        let mut tracker = HoverTracker::new();

        tracker.update(&scene, Some(&ray_towards(Vec3::new(2.0, 2.0, 0.0))));
        let events = tracker.update(&scene, None);
        assert!(matches!(events.as_slice(), [PointerEvent::Leave { .. }]));
        assert_eq!(tracker.hovered(), None);
    }
}
