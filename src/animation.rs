//! Per-frame update rules.
//!
//! Every rule is a pure function of the elapsed time and the object's static
//! parameters, so the same `time` always yields the same pose.

use std::time::Instant;

use glam::{Quat, Vec3};

use crate::picking::HoverTarget;
use crate::scene_graph::{Material, Transform};

const LOGO_SWAY_FREQUENCY: f32 = 0.5;
const LOGO_SWAY_ANGLE: f32 = 0.2;
const LOGO_BOB_HEIGHT: f32 = 0.1;

const ORB_FLOAT_HEIGHT: f32 = 0.5;
const ORB_SPIN_SPEED: f32 = 0.5;

const GRID_BASE_OPACITY: f32 = 0.3;
const GRID_OPACITY_SWING: f32 = 0.2;

/// Seconds since the scene was mounted.
pub struct AnimationClock {
    start: Instant,
}

impl AnimationClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Pose produced by the logo and orb rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position_y: f32,
    pub rotation_y: f32,
}

pub fn logo_sway(time: f32, base_y: f32) -> Pose {
    let phase = (time * LOGO_SWAY_FREQUENCY).sin();
    Pose {
        position_y: phase * LOGO_BOB_HEIGHT + base_y,
        rotation_y: phase * LOGO_SWAY_ANGLE,
    }
}

/// The base X coordinate offsets the phase so orbs drift out of sync.
pub fn orb_float(time: f32, base: Vec3) -> Pose {
    Pose {
        position_y: base.y + (time + base.x).sin() * ORB_FLOAT_HEIGHT,
        rotation_y: time * ORB_SPIN_SPEED,
    }
}

/// Oscillates within `[0.1, 0.5]`.
pub fn grid_opacity(time: f32) -> f32 {
    GRID_BASE_OPACITY + time.sin() * GRID_OPACITY_SWING
}

/// Read-only inputs shared by all behaviors during one frame.
pub struct FrameContext<'a> {
    pub time: f32,
    pub camera_rotation: Quat,
    pub hovered: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Gentle bob and sway around `base_y`.
    Sway { base_y: f32 },
    /// Floats around `base` and brightens while hovered.
    Float {
        base: Vec3,
        emissive_intensity: f32,
        hovered_emissive_intensity: f32,
    },
    /// Pulses material opacity.
    Pulse,
    /// Copies the camera orientation.
    Billboard,
}

impl Behavior {
    pub fn apply(
        &self,
        ctx: &FrameContext,
        transform: &mut Transform,
        material: &mut Material,
        hover: Option<&HoverTarget>,
    ) {
        match self {
            Behavior::Sway { base_y } => {
                let pose = logo_sway(ctx.time, *base_y);
                transform.set_rotation_y(pose.rotation_y);
                transform.set_translation_y(pose.position_y);
            }
            Behavior::Float {
                base,
                emissive_intensity,
                hovered_emissive_intensity,
            } => {
                let pose = orb_float(ctx.time, *base);
                transform.set_translation_y(pose.position_y);
                transform.set_rotation_y(pose.rotation_y);

                let hovered = match (hover, ctx.hovered) {
                    (Some(target), Some(id)) => target.id == id,
                    _ => false,
                };
                material.emissive_intensity = if hovered {
                    *hovered_emissive_intensity
                } else {
                    *emissive_intensity
                };
            }
            Behavior::Pulse => {
                material.opacity = grid_opacity(ctx.time);
            }
            Behavior::Billboard => {
                transform.set_rotation(ctx.camera_rotation);
            }
        }
    }
}
