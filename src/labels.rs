//! Placement of world-space text labels on screen.
//!
//! Label groups copy the camera orientation, so every label lies in a plane
//! parallel to the image plane. That makes a label an axis-aligned block of
//! text on screen whose pixel size only depends on its view depth.

use glam::{Mat4, Vec2, Vec3};

use crate::scene_graph::{Scene, TextLabel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLabel {
    /// Left edge of the text, physical pixels.
    pub left: f32,
    /// Vertical center of the first line, physical pixels.
    pub middle: f32,
    pub font_px: f32,
    /// Normalized device depth, used to sort labels back to front and to
    /// depth test them against the scene.
    pub depth: f32,
    /// Distance along the view direction, used for fog.
    pub view_depth: f32,
}

/// Labels smaller than this are skipped.
const MIN_FONT_PX: f32 = 1.0;

pub fn project_label(
    view: Mat4,
    projection: Mat4,
    world_position: Vec3,
    font_size: f32,
    viewport: Vec2,
) -> Option<ScreenLabel> {
    let clip = projection * view * world_position.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }

    let ndc = clip.truncate() / clip.w;
    if !(0.0..=1.0).contains(&ndc.z) {
        return None;
    }

    let pixels_per_unit = projection.y_axis.y * viewport.y * 0.5 / clip.w;
    let font_px = font_size * pixels_per_unit;
    if font_px < MIN_FONT_PX {
        return None;
    }

    Some(ScreenLabel {
        left: (ndc.x * 0.5 + 0.5) * viewport.x,
        middle: (0.5 - ndc.y * 0.5) * viewport.y,
        font_px,
        depth: ndc.z,
        view_depth: clip.w,
    })
}

/// Every visible label in the scene, furthest first. World matrices must be
/// up to date.
pub fn collect_labels<'a>(
    scene: &'a Scene,
    view: Mat4,
    projection: Mat4,
    viewport: Vec2,
) -> Vec<(&'a TextLabel, ScreenLabel)> {
    let mut labels: Vec<_> = scene
        .objects
        .iter()
        .filter_map(|(_, object)| {
            let label = object.label.as_ref()?;
            let world_position = object.transform.world_translation();
            project_label(view, projection, world_position, label.font_size, viewport)
                .map(|screen| (label, screen))
        })
        .collect();

    labels.sort_by(|(_, a), (_, b)| b.depth.total_cmp(&a.depth));
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Object3D;

    fn camera() -> (Mat4, Mat4) {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 1000.0);
        (view, projection)
    }

    #[test]
    fn centered_label_projects_to_screen_center() {
        let (view, projection) = camera();
        let label =
            project_label(view, projection, Vec3::ZERO, 1.0, Vec2::new(800.0, 800.0)).unwrap();

        assert!((label.left - 400.0).abs() < 1e-3);
        assert!((label.middle - 400.0).abs() < 1e-3);
        // 90 degree FOV at distance 10 spans 20 units over 800 pixels.
        assert!((label.font_px - 40.0).abs() < 1e-3);
        assert!((label.view_depth - 10.0).abs() < 1e-4);
    }

    #[test]
    fn further_labels_are_smaller() {
        let (view, projection) = camera();
        let viewport = Vec2::new(800.0, 600.0);
        let near = project_label(view, projection, Vec3::ZERO, 0.3, viewport).unwrap();
        let far = project_label(view, projection, Vec3::new(0.0, 0.0, -10.0), 0.3, viewport)
            .unwrap();
        assert!(far.font_px < near.font_px);
        assert!(far.depth > near.depth);
    }

    #[test]
    fn labels_behind_the_camera_are_hidden() {
        let (view, projection) = camera();
        let hidden = project_label(
            view,
            projection,
            Vec3::new(0.0, 0.0, 20.0),
            0.3,
            Vec2::new(800.0, 600.0),
        );
        assert_eq!(hidden, None);
    }

    #[test]
    fn collected_labels_are_sorted_back_to_front() {
        let mut scene = Scene::new();
        let label = |text: &str| TextLabel {
            text: text.to_owned(),
            font_size: 0.3,
            color: Vec3::ONE,
        };
        scene.add_object(Object3D::new("near").with_label(label("near")));
        scene.add_object(
            Object3D::new("far")
                .at(Vec3::new(0.0, 0.0, -5.0))
                .with_label(label("far")),
        );
        scene.add_object(Object3D::new("plain"));
        scene.propagate_transforms();

        let (view, projection) = camera();
        let labels = collect_labels(&scene, view, projection, Vec2::new(800.0, 600.0));
        let texts: Vec<_> = labels.iter().map(|(l, _)| l.text.as_str()).collect();
        assert_eq!(texts, ["far", "near"]);
    }
}
