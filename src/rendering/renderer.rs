use std::sync::Arc;

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    config::SceneConfig,
    demo::DemoState,
    rendering::{
        frame_uniform::FrameUniformState,
        imgui_renderer::ImguiRendererState,
        passes::scene_pass::{ScenePass, ScenePassTextureViews},
        post_process::{PostProcessInput, PostProcessor},
        render_common::{create_surface_config, RenderCommon},
        render_object::SceneBuffers,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        text_renderer::TextRenderer,
        texture::{DepthTexture, RenderTarget},
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    scene_buffers: SceneBuffers,

    shader_loader: ShaderLoader,

    scene_pass: ScenePass,
    post_processor: PostProcessor,
    text: TextRenderer,
    imgui: ImguiRendererState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        demo_state: &DemoState,
        config: &SceneConfig,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_config = create_surface_config(&adapter, &surface, size)?;
        surface.configure(&device, &surface_config);

        let common = Arc::new(RenderCommon::new(&device, surface_config.format));

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let scene_buffers = SceneBuffers::new(
            &device,
            SceneBuffers::create_bind_group_layout(&device),
            &demo_state.scene,
        );

        let mut cache_builder = PipelineCacheBuilder::new();

        let scene_pass = ScenePass::create(
            &device,
            common.clone(),
            &scene_buffers.bind_group_layout,
            &mut cache_builder,
        );
        let post_processor = PostProcessor::create(&device, common.clone(), &mut cache_builder, size);

        let shader_loader =
            ShaderLoader::new(device.clone(), cache_builder, config.assets.shader_hot_reload)?;

        let text = TextRenderer::new(
            &device,
            &queue,
            RenderTarget::HDR_FORMAT,
            surface_config.format,
            &config.assets.label_font,
        );

        let imgui = ImguiRendererState::new(&device, &queue, surface_config.format, imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            surface_config,
            device,
            queue,
            common,
            depth_texture,
            scene_buffers,
            shader_loader,
            scene_pass,
            post_processor,
            text,
            imgui,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture.resize(&self.device, new_size);
        self.post_processor.resize(&self.device, new_size);
    }

    /// Draws one frame: scene, labels, effect chain, overlay and debug UI.
    /// Always ends the imgui frame, even when the surface is unavailable.
    pub fn render(
        &mut self,
        demo_state: &DemoState,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) => {
                imgui_context.render();
                return Err(err);
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.common
            .frame_uniform
            .update(&self.queue, FrameUniformState::new(demo_state, self.size));
        self.scene_buffers.update(&self.queue, &demo_state.scene);

        self.text
            .prepare_labels(&self.device, &self.queue, demo_state, self.size);
        self.text.prepare_overlay(
            &self.device,
            &self.queue,
            demo_state,
            self.size,
            self.window.scale_factor() as f32,
        );

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;
        let background = demo_state.environment.background;

        self.scene_pass.render(
            &ScenePassTextureViews {
                color: self.post_processor.scene_view(),
                depth: self.depth_texture.view(),
            },
            wgpu::Color {
                r: background.x as f64,
                g: background.y as f64,
                b: background.z as f64,
                a: 1.0,
            },
            &mut encoder,
            pipeline_cache,
            &self.scene_buffers,
        );

        self.text.render_labels(
            &mut encoder,
            self.post_processor.scene_view(),
            self.depth_texture.view(),
        );

        self.post_processor.render(
            &self.device,
            &self.queue,
            &mut encoder,
            pipeline_cache,
            &PostProcessInput {
                chain: &demo_state.post_processing,
                glitch: demo_state.glitch,
                time: demo_state.time,
            },
            &view,
        );

        self.text.render_overlay(&mut encoder, &view);

        self.imgui
            .render(&view, imgui_context, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        output.present();

        self.text.trim();

        Ok(())
    }
}
