use std::sync::Arc;

use glam::Vec4;
use wgpu::Device;
use winit::dpi::PhysicalSize;

use crate::config::BloomOptions;
use crate::rendering::{
    passes::effect_pass::{EffectLayout, EffectParams, EffectPass},
    render_common::RenderCommon,
    shader_loader::{PipelineCache, PipelineCacheBuilder, ShaderDefinition},
    texture::RenderTarget,
};

const BLOOM_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Bloom",
    path: "bloom.wgsl",
};

/// Bright-pass, separable blur at half resolution, additive combine.
pub struct BloomPass {
    extract: EffectPass,
    blur_h: EffectPass,
    blur_v: EffectPass,
    combine: EffectPass,
    bright: RenderTarget,
    blurred: RenderTarget,
}

fn half_size(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new((size.width / 2).max(1), (size.height / 2).max(1))
}

impl BloomPass {
    pub fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        layout: &EffectLayout,
        cache_builder: &mut PipelineCacheBuilder,
        size: PhysicalSize<u32>,
    ) -> Self {
        let mut pass = |entry_point| {
            EffectPass::create(
                device,
                common.clone(),
                layout,
                cache_builder,
                BLOOM_SHADER,
                entry_point,
                RenderTarget::HDR_FORMAT,
            )
        };

        let extract = pass("fs_extract");
        let blur_h = pass("fs_blur_h");
        let blur_v = pass("fs_blur_v");
        let combine = pass("fs_combine");

        let half = half_size(size);

        Self {
            extract,
            blur_h,
            blur_v,
            combine,
            bright: RenderTarget::new(device, half, "Bloom bright"),
            blurred: RenderTarget::new(device, half, "Bloom blurred"),
        }
    }

    pub fn resize(&mut self, device: &Device, size: PhysicalSize<u32>) {
        let half = half_size(size);
        self.bright = RenderTarget::new(device, half, "Bloom bright");
        self.blurred = RenderTarget::new(device, half, "Bloom blurred");
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        options: &BloomOptions,
        source: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) {
        let half = self.bright.size();
        let texel = Vec4::new(1.0 / half.width as f32, 1.0 / half.height as f32, 0.0, 0.0);

        self.extract.render(
            device,
            queue,
            encoder,
            pipeline_cache,
            source,
            None,
            self.bright.view(),
            EffectParams::new(Vec4::new(
                options.luminance_threshold,
                options.luminance_smoothing,
                0.0,
                0.0,
            )),
        );

        self.blur_h.render(
            device,
            queue,
            encoder,
            pipeline_cache,
            self.bright.view(),
            None,
            self.blurred.view(),
            EffectParams::new(Vec4::new(texel.x, 0.0, 0.0, 0.0)),
        );

        self.blur_v.render(
            device,
            queue,
            encoder,
            pipeline_cache,
            self.blurred.view(),
            None,
            self.bright.view(),
            EffectParams::new(Vec4::new(0.0, texel.y, 0.0, 0.0)),
        );

        self.combine.render(
            device,
            queue,
            encoder,
            pipeline_cache,
            source,
            Some(self.bright.view()),
            target,
            EffectParams::new(Vec4::new(options.intensity, 0.0, 0.0, 0.0)),
        );
    }
}
