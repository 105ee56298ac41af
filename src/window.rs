use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    config::SceneConfig,
    demo::DemoState,
    engine::{self, DebugPanel, FrameInput},
    input::InputHandler,
    rendering::renderer::Renderer,
};

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    config: SceneConfig,
    demo_state: DemoState,
    input: InputHandler,
    debug_panel: DebugPanel,
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    last_frame: Instant,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        let demo_state = DemoState::new(&config);

        Self {
            config,
            demo_state,
            input: InputHandler::new(),
            debug_panel: DebugPanel::new(),
            renderer: None,
            imgui: None,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // The published imgui INI support is broken
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title("holoscene");
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let mut imgui = Self::setup_imgui(&window);
        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            &self.demo_state,
            &self.config,
            &mut imgui.context,
        ))?;

        window.request_redraw();
        self.imgui = Some(imgui);
        self.renderer = Some(renderer);

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(err) = self.create_renderer(event_loop) {
            log::error!("Failed to initialize renderer: {err:?}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        let viewport = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                Key::Named(NamedKey::F1) => self.debug_panel.toggle(),
                _ => {}
            },
            WindowEvent::Resized(new_size) => {
                renderer.resize(*new_size);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                imgui
                    .context
                    .io_mut()
                    .update_delta_time(now - self.last_frame);
                self.last_frame = now;

                if let Err(err) = imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                {
                    log::error!("Failed to prepare imgui frame: {err}");
                    event_loop.exit();
                    return;
                }

                let ui = imgui.context.new_frame();

                let frame_input = FrameInput {
                    cursor: self.input.cursor(),
                    viewport,
                };

                if let Err(err) =
                    engine::update(&mut self.demo_state, &mut self.debug_panel, &frame_input, ui)
                {
                    log::error!("Error during engine::update: {err:?}");
                }

                imgui.platform.prepare_render(ui, &renderer.window);

                match renderer.render(&self.demo_state, &mut imgui.context) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }

                renderer.window.request_redraw();
            }
            _ => {
                let camera = &mut self.demo_state.camera;
                let ui_wants_mouse = imgui.context.io().want_capture_mouse;
                if self
                    .input
                    .handle_event(camera, &event, viewport.y, ui_wants_mouse)
                {
                    self.demo_state.pointer_moved(self.input.cursor(), viewport);
                }
            }
        }

        imgui.platform.handle_event::<()>(
            imgui.context.io_mut(),
            &renderer.window,
            &Event::WindowEvent { window_id, event },
        );
    }
}

pub async fn run(config: SceneConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
