use std::path::Path;

use glam::{Vec2, Vec3};
use glyphon::{
    Attrs, Buffer, Cache, Color, ColorMode, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer as GlyphonRenderer, Viewport,
};
use wgpu::{DepthBiasState, Device, MultisampleState, StencilState};
use winit::dpi::PhysicalSize;

use crate::assets::{resolve_label_font, LabelFont};
use crate::demo::{DemoState, Fog};
use crate::labels::collect_labels;
use crate::overlay::anchor;
use crate::rendering::texture::DepthTexture;

const LINE_HEIGHT: f32 = 1.2;

fn srgb_channel(linear: f32) -> u8 {
    let linear = linear.clamp(0.0, 1.0);
    let encoded = if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// glyphon takes sRGB-encoded colors.
fn to_text_color(linear: Vec3) -> Color {
    Color::rgb(
        srgb_channel(linear.x),
        srgb_channel(linear.y),
        srgb_channel(linear.z),
    )
}

/// Labels fade into the fog the same way the scene shaders do, by view depth.
fn fogged_label_color(color: Vec3, fog: &Fog, distance: f32) -> Color {
    to_text_color(color.lerp(fog.color, fog.factor(distance)))
}

/// Font database, glyph caches and the resolved label family, shared by
/// both text layers.
struct Typesetter {
    font_system: FontSystem,
    swash_cache: SwashCache,
    cache: Cache,
    label_font: LabelFont,
}

struct PositionedText {
    left: f32,
    top: f32,
    color: Color,
    /// Normalized device depth, ignored by layers without depth testing.
    depth: f32,
}

/// Glyphs carry the index of their placement as metadata.
fn placement_depth(placements: &[PositionedText], metadata: usize) -> f32 {
    placements.get(metadata).map_or(0.0, |placement| placement.depth)
}

/// One glyph atlas and renderer for one target format.
struct TextLayer {
    atlas: TextAtlas,
    renderer: GlyphonRenderer,
    viewport: Viewport,
    buffers: Vec<Buffer>,
    placements: Vec<PositionedText>,
}

impl TextLayer {
    fn new(
        device: &Device,
        queue: &wgpu::Queue,
        typesetter: &Typesetter,
        format: wgpu::TextureFormat,
        color_mode: ColorMode,
        depth_stencil: Option<wgpu::DepthStencilState>,
    ) -> Self {
        let mut atlas =
            TextAtlas::with_color_mode(device, queue, &typesetter.cache, format, color_mode);
        let renderer =
            GlyphonRenderer::new(&mut atlas, device, MultisampleState::default(), depth_stencil);
        let viewport = Viewport::new(device, &typesetter.cache);

        Self {
            atlas,
            renderer,
            viewport,
            buffers: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Lays out `text` into the buffer at `index`, reusing it when possible,
    /// and returns the size of the laid out block.
    fn layout(
        &mut self,
        font_system: &mut FontSystem,
        index: usize,
        text: &str,
        font_px: f32,
        attrs: &Attrs,
    ) -> Vec2 {
        let metrics = Metrics::new(font_px, font_px * LINE_HEIGHT);

        if index < self.buffers.len() {
            self.buffers[index].set_metrics(font_system, metrics);
        } else {
            self.buffers.push(Buffer::new(font_system, metrics));
        }

        let buffer = &mut self.buffers[index];
        buffer.set_size(font_system, None, None);
        buffer.set_text(font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(font_system, false);

        buffer.layout_runs().fold(Vec2::ZERO, |size, run| {
            Vec2::new(size.x.max(run.line_w), size.y + run.line_height)
        })
    }

    fn prepare(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        typesetter: &mut Typesetter,
        size: PhysicalSize<u32>,
    ) {
        self.viewport.update(
            queue,
            Resolution {
                width: size.width,
                height: size.height,
            },
        );

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: size.width as i32,
            bottom: size.height as i32,
        };

        let areas = self
            .buffers
            .iter()
            .zip(&self.placements)
            .map(|(buffer, placement)| TextArea {
                buffer,
                left: placement.left,
                top: placement.top,
                scale: 1.0,
                bounds,
                default_color: placement.color,
                custom_glyphs: &[],
            });

        let placements = &self.placements;
        if let Err(err) = self.renderer.prepare_with_depth(
            device,
            queue,
            &mut typesetter.font_system,
            &mut self.atlas,
            &self.viewport,
            areas,
            &mut typesetter.swash_cache,
            |metadata| placement_depth(placements, metadata),
        ) {
            log::error!("Failed to prepare text: {err}");
            self.placements.clear();
        }
    }

    fn render(
        &self,
        label: &str,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: Option<&wgpu::TextureView>,
    ) {
        if self.placements.is_empty() {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if let Err(err) = self
            .renderer
            .render(&self.atlas, &self.viewport, &mut render_pass)
        {
            log::error!("Failed to render text: {err}");
        }
    }

    fn trim(&mut self) {
        self.atlas.trim();
    }
}

/// Draws the billboarded scene labels into the HDR image and the screen
/// overlay onto the final frame.
pub struct TextRenderer {
    typesetter: Typesetter,
    labels: TextLayer,
    overlay: TextLayer,
}

impl TextRenderer {
    pub fn new(
        device: &Device,
        queue: &wgpu::Queue,
        hdr_format: wgpu::TextureFormat,
        surface_format: wgpu::TextureFormat,
        label_font: &Path,
    ) -> Self {
        let mut font_system = FontSystem::new();
        let label_font = resolve_label_font(font_system.db_mut(), label_font);

        let typesetter = Typesetter {
            font_system,
            swash_cache: SwashCache::new(),
            cache: Cache::new(device),
            label_font,
        };

        let overlay_color_mode = if surface_format.is_srgb() {
            ColorMode::Accurate
        } else {
            ColorMode::Web
        };

        // Labels are hidden by nearer scene geometry but never write depth.
        let label_depth = wgpu::DepthStencilState {
            format: DepthTexture::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        };

        let labels = TextLayer::new(
            device,
            queue,
            &typesetter,
            hdr_format,
            ColorMode::Accurate,
            Some(label_depth),
        );
        let overlay = TextLayer::new(
            device,
            queue,
            &typesetter,
            surface_format,
            overlay_color_mode,
            None,
        );

        Self {
            typesetter,
            labels,
            overlay,
        }
    }

    pub fn prepare_labels(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        state: &DemoState,
        size: PhysicalSize<u32>,
    ) {
        let viewport = Vec2::new(size.width as f32, size.height as f32);
        let view = state.camera.view_matrix();
        let projection = state.camera.projection_matrix(viewport.x / viewport.y.max(1.0));

        let typesetter = &mut self.typesetter;
        let layer = &mut self.labels;
        layer.placements.clear();

        let family = typesetter.label_font.family();
        let labels = collect_labels(&state.scene, view, projection, viewport);

        for (index, (label, screen)) in labels.iter().enumerate() {
            layer.layout(
                &mut typesetter.font_system,
                index,
                &label.text,
                screen.font_px,
                &Attrs::new().family(family).metadata(index),
            );

            let color = fogged_label_color(label.color, &state.environment.fog, screen.view_depth);

            layer.placements.push(PositionedText {
                left: screen.left,
                top: screen.middle - screen.font_px * LINE_HEIGHT * 0.5,
                color,
                depth: screen.depth,
            });
        }

        layer.prepare(device, queue, typesetter, size);
    }

    /// Draws labels over the scene image, tested against the scene depth.
    pub fn render_labels(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth: &wgpu::TextureView,
    ) {
        self.labels.render("Label pass", encoder, view, Some(depth));
    }

    pub fn prepare_overlay(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        state: &DemoState,
        size: PhysicalSize<u32>,
        scale_factor: f32,
    ) {
        let typesetter = &mut self.typesetter;
        let layer = &mut self.overlay;
        layer.placements.clear();

        let overlay = &state.overlay;
        if !overlay.enabled() {
            return;
        }

        let viewport = Vec2::new(size.width as f32, size.height as f32);
        let margin = overlay.margin() * scale_factor;
        let [r, g, b] = overlay.color();
        let color = Color::rgb(r, g, b);
        let attrs = Attrs::new().family(glyphon::Family::Monospace);

        let items = overlay.items(chrono::Local::now().time());
        for (index, item) in items.iter().enumerate() {
            let block = layer.layout(
                &mut typesetter.font_system,
                index,
                &item.text,
                item.font_size * scale_factor,
                &attrs,
            );
            let position = anchor(item.corner, block, viewport, margin);

            layer.placements.push(PositionedText {
                left: position.x,
                top: position.y,
                color,
                depth: 0.0,
            });
        }

        layer.prepare(device, queue, typesetter, size);
    }

    pub fn render_overlay(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        self.overlay.render("Overlay pass", encoder, view, None);
    }

    /// Frees glyphs that were not used this frame.
    pub fn trim(&mut self) {
        self.labels.trim();
        self.overlay.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fog() -> Fog {
        Fog {
            color: Vec3::new(0.0, 0.0, 0.25),
            near: 5.0,
            far: 30.0,
        }
    }

    fn placed_at(depth: f32) -> PositionedText {
        PositionedText {
            left: 0.0,
            top: 0.0,
            color: Color::rgb(255, 255, 255),
            depth,
        }
    }

    #[test]
    fn glyph_depth_follows_its_placement() {
        let placements = [placed_at(0.98), placed_at(0.95), placed_at(0.9)];
        assert_eq!(placement_depth(&placements, 0), 0.98);
        assert_eq!(placement_depth(&placements, 2), 0.9);
    }

    #[test]
    fn glyph_without_placement_is_nearest() {
        let placements = [placed_at(0.98)];
        assert_eq!(placement_depth(&placements, 5), 0.0);
        assert_eq!(placement_depth(&[], 0), 0.0);
    }

    #[test]
    fn srgb_encoding_endpoints() {
        assert_eq!(srgb_channel(0.0), 0);
        assert_eq!(srgb_channel(1.0), 255);
        assert_eq!(srgb_channel(2.0), 255);
        // Linear mid-grey is lighter once encoded.
        assert_eq!(srgb_channel(0.5), 188);
    }

    #[test]
    fn labels_inside_fog_near_keep_their_color() {
        let cyan = Vec3::new(0.0, 1.0, 1.0);
        assert_eq!(fogged_label_color(cyan, &fog(), 2.0), Color::rgb(0, 255, 255));
    }

    #[test]
    fn labels_past_fog_far_take_the_fog_color() {
        let cyan = Vec3::new(0.0, 1.0, 1.0);
        assert_eq!(
            fogged_label_color(cyan, &fog(), 100.0),
            to_text_color(fog().color)
        );
    }
}
