use glam::Vec2;

use crate::demo::DemoState;
use crate::frame_timing::FrameTiming;
use crate::post_processing::Effect;

/// Frame-level inputs gathered by the window.
pub struct FrameInput {
    pub cursor: Option<Vec2>,
    pub viewport: Vec2,
}

pub struct DebugPanel {
    pub visible: bool,
    timing: FrameTiming,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self {
            visible: false,
            timing: FrameTiming::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::debug!("Debug panel visible: {}", self.visible);
    }

    fn draw(&self, state: &mut DemoState, ui: &imgui::Ui) {
        ui.window("holoscene")
            .size([300.0, 260.0], imgui::Condition::FirstUseEver)
            .position([16.0, 64.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("FPS: {:.0}", self.timing.fps()));
                ui.text(format!("Time: {:.2} s", state.time));
                ui.text(format!(
                    "Hovered: {}",
                    state.interaction.hovered_object().as_deref().unwrap_or("-")
                ));
                ui.text(format!(
                    "Camera distance: {:.2}, polar: {:.2}, azimuth: {:.2}",
                    state.camera.distance(),
                    state.camera.polar_angle(),
                    state.camera.azimuth()
                ));
                ui.separator();

                for effect in state.post_processing.effects_mut() {
                    let mut enabled = effect.enabled();
                    if ui.checkbox(effect.kind().label(), &mut enabled) {
                        effect.set_enabled(enabled);
                    }

                    if let Effect::Bloom(bloom) = effect {
                        ui.slider("Bloom intensity", 0.0, 5.0, &mut bloom.intensity);
                    }
                }

                if state.glitch.is_some() {
                    ui.text_colored([1.0, 0.3, 0.3, 1.0], "GLITCH");
                }
            });
    }
}

pub fn update(
    state: &mut DemoState,
    debug_panel: &mut DebugPanel,
    input: &FrameInput,
    ui: &mut imgui::Ui,
) -> anyhow::Result<()> {
    let time = state.clock.elapsed();
    state.update(time, input.cursor, input.viewport);

    debug_panel.timing.end_frame();
    if debug_panel.visible {
        debug_panel.draw(state, ui);
    }

    Ok(())
}
