//! Fullscreen quad programs.
//!
//! Every program is `quad.wgsl` (uniforms, vertex stage, depth helpers) followed by the
//! program's own bindings and `fs` entry point. Texture uniforms live at fixed binding
//! slots so a program can be written without knowing the pass that binds it:
//!
//! | uniform       | texture | sampler |
//! |---------------|---------|---------|
//! | `scene_color` | 1       | 2       |
//! | `scene_depth` | 3       | -       |
//! | `edge_mask`   | 5       | 6       |
//!
//! Depth is never filtered, so depth bindings have no sampler and are read with
//! `textureLoad`.

use std::collections::HashMap;

use crate::camera::Camera;
use crate::render_graph::{Channel, FilterMode, ProgramId, ResolvedBindings, UniformName};

const QUAD_PRELUDE: &str = include_str!("shaders/quad.wgsl");

/// A registered fragment program and the texture inputs it declares.
#[derive(Clone, Copy, Debug)]
pub struct FullscreenProgram {
    pub id: ProgramId,
    pub source: &'static str,
    pub inputs: &'static [(UniformName, Channel)],
}

impl FullscreenProgram {
    /// Whether a pass's bound textures match what the program declares, in any order.
    pub fn accepts(&self, bound: &[(UniformName, Channel)]) -> bool {
        bound.len() == self.inputs.len() && bound.iter().all(|b| self.inputs.contains(b))
    }

    pub fn full_source(&self) -> String {
        format!("{QUAD_PRELUDE}\n{}", self.source)
    }
}

pub const DEPTH_VISUALIZE: FullscreenProgram = FullscreenProgram {
    id: ProgramId("depth_visualize"),
    source: include_str!("shaders/depth_visualize.wgsl"),
    inputs: &[
        (UniformName::SceneColor, Channel::Color),
        (UniformName::SceneDepth, Channel::Depth),
    ],
};

pub const OUTLINE: FullscreenProgram = FullscreenProgram {
    id: ProgramId("outline"),
    source: include_str!("shaders/outline.wgsl"),
    inputs: &[(UniformName::SceneDepth, Channel::Depth)],
};

pub const COMPOSITE: FullscreenProgram = FullscreenProgram {
    id: ProgramId("composite"),
    source: include_str!("shaders/composite.wgsl"),
    inputs: &[
        (UniformName::SceneColor, Channel::Color),
        (UniformName::EdgeMask, Channel::Color),
    ],
};

pub const BUILTIN_PROGRAMS: &[FullscreenProgram] = &[DEPTH_VISUALIZE, OUTLINE, COMPOSITE];

pub fn find_program(id: ProgramId) -> Option<&'static FullscreenProgram> {
    BUILTIN_PROGRAMS.iter().find(|program| program.id == id)
}

/// Binding index of a texture uniform. The sampler, if any, sits at the next index.
pub fn texture_slot(uniform: UniformName) -> Option<u32> {
    match uniform {
        UniformName::SceneColor => Some(1),
        UniformName::SceneDepth => Some(3),
        UniformName::EdgeMask => Some(5),
        _ => None,
    }
}

/// Matches `QuadUniforms` in `quad.wgsl`. Unbound scalars read as zero.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_near: f32,
    pub camera_far: f32,
    pub linearization_method: f32,
    pub blend: f32,
    pub time: f32,
    pub _padding: [f32; 3],
}

impl QuadUniforms {
    pub fn new<H>(camera: &Camera, bindings: &ResolvedBindings<'_, H>) -> Self {
        let mut uniforms = Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            ..Self::default()
        };
        for scalar in &bindings.scalars {
            let slot = match scalar.uniform {
                UniformName::CameraNear => &mut uniforms.camera_near,
                UniformName::CameraFar => &mut uniforms.camera_far,
                UniformName::LinearizationMethod => &mut uniforms.linearization_method,
                UniformName::Blend => &mut uniforms.blend,
                UniformName::Time => &mut uniforms.time,
                _ => continue,
            };
            *slot = scalar.value;
        }
        uniforms
    }
}

type ProgramKey = (ProgramId, Vec<(UniformName, Channel)>);

pub struct CompiledProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

/// Compiles programs on first use, keyed by program and the channel layout of the
/// bound textures. A program that fails to compile is remembered and not retried.
pub struct ProgramCache {
    format: wgpu::TextureFormat,
    compiled: HashMap<ProgramKey, Option<CompiledProgram>>,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
}

impl ProgramCache {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let sampler = |label, filter| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };

        Self {
            format,
            compiled: HashMap::new(),
            nearest_sampler: sampler("Nearest Sampler", wgpu::FilterMode::Nearest),
            linear_sampler: sampler("Linear Sampler", wgpu::FilterMode::Linear),
        }
    }

    /// Compiles `program` for `inputs` unless that was already attempted. Returns whether
    /// a usable pipeline exists.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        program: &FullscreenProgram,
        inputs: &[(UniformName, Channel)],
    ) -> bool {
        let format = self.format;
        self.compiled
            .entry((program.id, inputs.to_vec()))
            .or_insert_with(|| compile(device, format, program, inputs))
            .is_some()
    }

    pub fn get(
        &self,
        id: ProgramId,
        inputs: &[(UniformName, Channel)],
    ) -> Option<&CompiledProgram> {
        self.compiled.get(&(id, inputs.to_vec()))?.as_ref()
    }

    pub fn sampler(&self, filter: FilterMode) -> &wgpu::Sampler {
        match filter {
            FilterMode::Nearest => &self.nearest_sampler,
            FilterMode::Linear => &self.linear_sampler,
        }
    }
}

fn compile(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &FullscreenProgram,
    inputs: &[(UniformName, Channel)],
) -> Option<CompiledProgram> {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }];
    for &(uniform, channel) in inputs {
        let slot = texture_slot(uniform)?;
        match channel {
            Channel::Color => {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: slot,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                });
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: slot + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                });
            }
            Channel::Depth => entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }),
        }
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.id.0),
        source: wgpu::ShaderSource::Wgsl(program.full_source().into()),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Fullscreen Bind Group Layout"),
        entries: &entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Fullscreen Pipeline Layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.id.0),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        log::error!("fullscreen program `{}` failed to compile: {err}", program.id);
        return None;
    }

    log::debug!("compiled fullscreen program `{}` for {:?}", program.id, inputs);
    Some(CompiledProgram { pipeline, layout })
}
