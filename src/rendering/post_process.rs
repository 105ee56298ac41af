use std::sync::Arc;

use glam::Vec4;
use wgpu::Device;
use winit::dpi::PhysicalSize;

use crate::post_processing::{Effect, GlitchFrame, PostProcessChain};
use crate::rendering::{
    passes::{
        bloom_pass::BloomPass,
        effect_pass::{EffectLayout, EffectParams, EffectPass},
    },
    render_common::RenderCommon,
    shader_loader::{PipelineCache, PipelineCacheBuilder, ShaderDefinition},
    texture::RenderTarget,
};

const CHROMATIC_ABERRATION_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Chromatic aberration",
    path: "chromatic_aberration.wgsl",
};

const SCANLINE_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Scanline",
    path: "scanline.wgsl",
};

const GLITCH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Glitch",
    path: "glitch.wgsl",
};

const PRESENT_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Present",
    path: "present.wgsl",
};

/// Per-frame inputs of the effect chain.
pub struct PostProcessInput<'a> {
    pub chain: &'a PostProcessChain,
    pub glitch: Option<GlitchFrame>,
    pub time: f32,
}

/// Runs the enabled effects over the HDR scene image, alternating between
/// two intermediate targets, then writes the result to the surface.
pub struct PostProcessor {
    common: Arc<RenderCommon>,
    scene: RenderTarget,
    targets: [RenderTarget; 2],
    bloom: BloomPass,
    chromatic_aberration: EffectPass,
    scanline: EffectPass,
    glitch: EffectPass,
    present: EffectPass,
}

fn create_targets(device: &Device, size: PhysicalSize<u32>) -> (RenderTarget, [RenderTarget; 2]) {
    (
        RenderTarget::new(device, size, "Scene color"),
        [
            RenderTarget::new(device, size, "Post process ping"),
            RenderTarget::new(device, size, "Post process pong"),
        ],
    )
}

impl PostProcessor {
    pub fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        cache_builder: &mut PipelineCacheBuilder,
        size: PhysicalSize<u32>,
    ) -> Self {
        let layout = EffectLayout::new(device);

        let bloom = BloomPass::create(device, common.clone(), &layout, cache_builder, size);

        let mut hdr_pass = |shader| {
            EffectPass::create(
                device,
                common.clone(),
                &layout,
                cache_builder,
                shader,
                "fs_main",
                RenderTarget::HDR_FORMAT,
            )
        };

        let chromatic_aberration = hdr_pass(CHROMATIC_ABERRATION_SHADER);
        let scanline = hdr_pass(SCANLINE_SHADER);
        let glitch = hdr_pass(GLITCH_SHADER);

        let present = EffectPass::create(
            device,
            common.clone(),
            &layout,
            cache_builder,
            PRESENT_SHADER,
            "fs_main",
            common.surface_format,
        );

        let (scene, targets) = create_targets(device, size);

        Self {
            common,
            scene,
            targets,
            bloom,
            chromatic_aberration,
            scanline,
            glitch,
            present,
        }
    }

    pub fn resize(&mut self, device: &Device, size: PhysicalSize<u32>) {
        let (scene, targets) = create_targets(device, size);
        self.scene = scene;
        self.targets = targets;
        self.bloom.resize(device, size);
    }

    /// The scene pass and the label layer draw here.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        self.scene.view()
    }

    pub fn render(
        &self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        input: &PostProcessInput,
        surface_view: &wgpu::TextureView,
    ) {
        let size = self.scene.size();
        let mut source = self.scene.view();
        let mut next = 0;

        for effect in input.chain.enabled_effects() {
            let target = self.targets[next].view();

            match effect {
                Effect::Bloom(options) => self.bloom.render(
                    device,
                    queue,
                    encoder,
                    pipeline_cache,
                    options,
                    source,
                    target,
                ),
                Effect::ChromaticAberration(options) => self.chromatic_aberration.render(
                    device,
                    queue,
                    encoder,
                    pipeline_cache,
                    source,
                    None,
                    target,
                    EffectParams::new(Vec4::new(options.offset[0], options.offset[1], 0.0, 0.0)),
                ),
                Effect::Scanline(options) => self.scanline.render(
                    device,
                    queue,
                    encoder,
                    pipeline_cache,
                    source,
                    None,
                    target,
                    EffectParams::new(Vec4::new(
                        options.density,
                        options.opacity,
                        size.height as f32,
                        0.0,
                    )),
                ),
                Effect::Glitch(_) => {
                    // Only runs while a glitch window is active.
                    let Some(glitch) = input.glitch else {
                        continue;
                    };

                    self.glitch.render(
                        device,
                        queue,
                        encoder,
                        pipeline_cache,
                        source,
                        None,
                        target,
                        EffectParams::new(Vec4::new(
                            glitch.strength,
                            glitch.seed,
                            input.time,
                            0.0,
                        )),
                    )
                }
            }

            source = target;
            next = 1 - next;
        }

        let encode_gamma = if self.common.surface_format.is_srgb() {
            0.0
        } else {
            1.0
        };

        self.present.render(
            device,
            queue,
            encoder,
            pipeline_cache,
            source,
            None,
            surface_view,
            EffectParams::new(Vec4::new(encode_gamma, 0.0, 0.0, 0.0)),
        );
    }
}
