use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::camera::OrbitCamera;

/// Pixel deltas from touchpads are much larger than wheel lines.
const PIXELS_PER_LINE: f32 = 100.0;

/// Translates pointer events into orbit camera motion.
///
/// Left drag rotates, right drag pans and the wheel zooms.
#[derive(Debug, Default)]
pub struct InputHandler {
    cursor: Option<Vec2>,
    rotating: bool,
    panning: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position in physical pixels, `None` while outside the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Returns true if the event changed the cursor position or left the
    /// window, which means hover state should be refreshed.
    ///
    /// While `ui_wants_mouse` is set, presses and the wheel belong to the UI.
    /// Releases still end a drag that started over the scene.
    pub fn handle_event(
        &mut self,
        camera: &mut OrbitCamera,
        event: &WindowEvent,
        viewport_height: f32,
        ui_wants_mouse: bool,
    ) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                self.mouse_input(*button, *state == ElementState::Pressed, ui_wants_mouse);
                false
            }
            WindowEvent::MouseWheel { .. } if ui_wants_mouse => false,
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.cursor_moved(camera, position, viewport_height);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_left();
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                camera.zoom(steps);
                false
            }
            _ => false,
        }
    }

    fn mouse_input(&mut self, button: MouseButton, pressed: bool, ui_wants_mouse: bool) {
        if pressed && ui_wants_mouse {
            return;
        }
        self.button(button, pressed);
    }

    fn button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right => self.panning = pressed,
            _ => {}
        }
    }

    fn cursor_moved(&mut self, camera: &mut OrbitCamera, position: Vec2, viewport_height: f32) {
        if let Some(previous) = self.cursor {
            let delta = position - previous;
            if self.rotating {
                camera.rotate(delta, viewport_height);
            } else if self.panning {
                camera.pan(delta, viewport_height);
            }
        }
        self.cursor = Some(position);
    }

    fn cursor_left(&mut self) {
        self.cursor = None;
        self.rotating = false;
        self.panning = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraOptions;

    fn undamped_camera() -> OrbitCamera {
        OrbitCamera::new(CameraOptions {
            damping: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn dragging_rotates_only_while_pressed() {
        let mut camera = undamped_camera();
        let mut input = InputHandler::new();
        let azimuth = camera.azimuth();

        input.cursor_moved(&mut camera, Vec2::new(100.0, 100.0), 720.0);
        input.cursor_moved(&mut camera, Vec2::new(150.0, 100.0), 720.0);
        assert_eq!(camera.azimuth(), azimuth);

        input.button(MouseButton::Left, true);
        input.cursor_moved(&mut camera, Vec2::new(200.0, 100.0), 720.0);
        assert!(camera.azimuth() < azimuth);

        input.button(MouseButton::Left, false);
        let after_drag = camera.azimuth();
        input.cursor_moved(&mut camera, Vec2::new(400.0, 100.0), 720.0);
        assert_eq!(camera.azimuth(), after_drag);
    }

    #[test]
    fn leaving_the_window_clears_cursor_and_buttons() {
        let mut camera = undamped_camera();
        let mut input = InputHandler::new();

        input.button(MouseButton::Left, true);
        input.cursor_moved(&mut camera, Vec2::new(10.0, 10.0), 720.0);
        assert_eq!(input.cursor(), Some(Vec2::new(10.0, 10.0)));

        input.cursor_left();
        assert_eq!(input.cursor(), None);

        let azimuth = camera.azimuth();
        input.cursor_moved(&mut camera, Vec2::new(300.0, 10.0), 720.0);
        input.cursor_moved(&mut camera, Vec2::new(500.0, 10.0), 720.0);
        assert_eq!(camera.azimuth(), azimuth);
    }

    #[test]
    fn release_over_ui_ends_the_drag() {
        let mut camera = undamped_camera();
        let mut input = InputHandler::new();

        input.mouse_input(MouseButton::Left, true, false);
        input.cursor_moved(&mut camera, Vec2::new(100.0, 100.0), 720.0);
        input.mouse_input(MouseButton::Left, false, true);
        assert!(!input.rotating);

        let azimuth = camera.azimuth();
        input.cursor_moved(&mut camera, Vec2::new(300.0, 100.0), 720.0);
        assert_eq!(camera.azimuth(), azimuth);
    }

    #[test]
    fn press_over_ui_does_not_start_a_drag() {
        let mut input = InputHandler::new();

        input.mouse_input(MouseButton::Left, true, true);
        input.mouse_input(MouseButton::Right, true, true);
        assert!(!input.rotating);
        assert!(!input.panning);
    }

    #[test]
    fn first_move_after_entering_does_not_jump() {
        let mut camera = undamped_camera();
        let mut input = InputHandler::new();
        let azimuth = camera.azimuth();

        input.button(MouseButton::Left, true);
        input.cursor_moved(&mut camera, Vec2::new(900.0, 10.0), 720.0);
        assert_eq!(camera.azimuth(), azimuth);
    }
}
