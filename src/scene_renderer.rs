//! Instanced scene drawing for `SceneDraw` passes.
//!
//! The whole scene is one mesh drawn once per instance. Each [`SceneMaterial`] is a
//! fragment entry point of `scene.wgsl`; pipelines are built on first use per material
//! and depth format.

use std::collections::HashMap;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::geometry::SceneContent;
use crate::mesh::{InstanceRaw, Mesh, Vertex3d};
use crate::render_graph::SceneMaterial;

/// Matches `SceneUniforms` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
    pub base_color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(camera: &Camera, base_color: Vec3) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            _padding: 0.0,
            base_color: base_color.extend(1.0).to_array(),
        }
    }
}

fn fragment_entry(material: SceneMaterial) -> &'static str {
    match material {
        SceneMaterial::Lit => "fs_lit",
        SceneMaterial::Gooch => "fs_gooch",
        SceneMaterial::DepthOverride => "fs_depth",
    }
}

pub struct SceneRenderer {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(SceneMaterial, wgpu::TextureFormat), wgpu::RenderPipeline>,
    color_format: wgpu::TextureFormat,
    mesh: Mesh,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    base_color: Vec3,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene: &SceneContent,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let instances: Vec<InstanceRaw> = scene
            .instances
            .iter()
            .map(InstanceRaw::from_transform)
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!(
            "scene: {} triangles x {} instances",
            scene.geometry.triangle_count(),
            instances.len()
        );

        Self {
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            color_format,
            mesh: Mesh::from_geometry(device, &scene.geometry),
            instance_buffer,
            instance_count: instances.len() as u32,
            base_color: scene.base_color,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn uniforms(&self, camera: &Camera) -> SceneUniforms {
        SceneUniforms::new(camera, self.base_color)
    }

    /// Records the scene into `render_pass`, which must have a depth attachment of
    /// `depth_format`.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        render_pass: &mut wgpu::RenderPass<'_>,
        material: SceneMaterial,
        depth_format: wgpu::TextureFormat,
        bind_group: &wgpu::BindGroup,
    ) {
        let pipeline = self.pipeline(device, material, depth_format);
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.mesh.index_count, 0, 0..self.instance_count);
    }

    fn pipeline(
        &mut self,
        device: &wgpu::Device,
        material: SceneMaterial,
        depth_format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let Self {
            shader,
            pipeline_layout,
            color_format,
            pipelines,
            ..
        } = self;

        pipelines.entry((material, depth_format)).or_insert_with(|| {
            log::debug!("building scene pipeline {material:?} / {depth_format:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT, InstanceRaw::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(fragment_entry(material)),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: *color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }
}
