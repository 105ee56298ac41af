use std::collections::HashMap;
use std::sync::Arc;

use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    render_common::RenderCommon,
    render_object::{vertex_buffer_layout, SceneBuffers},
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::{DepthTexture, RenderTarget},
};
use crate::scene_graph::Topology;

const MESH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Mesh",
    path: "mesh.wgsl",
};

const LINES_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Lines",
    path: "lines.wgsl",
};

const POINTS_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Points",
    path: "points.wgsl",
};

pub struct ScenePassTextureViews<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

/// Rasterizes every drawable object into the HDR scene target.
pub struct ScenePass {
    common: Arc<RenderCommon>,
    pipelines: HashMap<(Topology, bool), PipelineId>,
}

impl ScenePass {
    pub fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        object_layout: &wgpu::BindGroupLayout,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene pipeline layout"),
            bind_group_layouts: &[&common.frame_uniform.bind_group_layout, object_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();

        for topology in [Topology::Triangles, Topology::Lines, Topology::Points] {
            for transparent in [false, true] {
                let shader_def = match topology {
                    Topology::Triangles => MESH_SHADER,
                    Topology::Lines => LINES_SHADER,
                    Topology::Points => POINTS_SHADER,
                };

                let layout = layout.clone();
                let id = cache_builder.add_shader(
                    shader_def,
                    Box::new(
                        move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                            Ok(create_pipeline(
                                device,
                                &layout,
                                shader_def,
                                source,
                                topology,
                                transparent,
                            ))
                        },
                    ),
                );
                pipelines.insert((topology, transparent), id);
            }
        }

        Self { common, pipelines }
    }

    pub fn render(
        &self,
        texture_views: &ScenePassTextureViews,
        clear_color: wgpu::Color,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        buffers: &SceneBuffers,
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, &self.common.frame_uniform.bind_group, &[]);

        for (object, mesh) in buffers.draw_order() {
            let Some(pipeline) = self
                .pipelines
                .get(&(mesh.topology, object.transparent))
                .and_then(|&id| pipeline_cache.get(id))
            else {
                continue;
            };

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &object.bind_group, &[]);
            mesh.draw(&mut render_pass);
        }
    }
}

fn create_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    shader_def: &ShaderDefinition,
    source: &str,
    topology: Topology,
    transparent: bool,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(shader_def.name),
        source: ShaderSource::Wgsl(source.into()),
    });

    let (primitive_topology, step_mode) = match topology {
        Topology::Triangles => (
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::VertexStepMode::Vertex,
        ),
        Topology::Lines => (
            wgpu::PrimitiveTopology::LineList,
            wgpu::VertexStepMode::Vertex,
        ),
        Topology::Points => (
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::VertexStepMode::Instance,
        ),
    };

    let blend = if transparent {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };

    let label = format!(
        "{} {} pipeline",
        shader_def.name,
        if transparent { "transparent" } else { "opaque" }
    );

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_buffer_layout(step_mode)],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: RenderTarget::HDR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: primitive_topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // The logo is a flat shape seen from both sides.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthTexture::DEPTH_FORMAT,
            depth_write_enabled: !transparent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
