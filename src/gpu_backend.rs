//! The wgpu implementation of [`RenderBackend`].
//!
//! Each frame acquires one surface texture and records every pass into a single command
//! encoder, one render pass per draw. Nothing is submitted until `end_frame`.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::error::{AllocationError, FrameError};
use crate::fullscreen::{self, ProgramCache, QuadUniforms};
use crate::geometry::SceneContent;
use crate::gpu::{DEPTH_FORMAT, DEPTH_STENCIL_FORMAT, GpuContext};
use crate::render_graph::{
    Capabilities, Channel, DrawCall, DrawOutput, PassId, PassKind, RenderBackend,
    ResolvedBindings, TargetDescriptor, TargetId, UniformName,
};
use crate::scene_renderer::SceneRenderer;

/// GPU storage for one render target.
pub struct GpuTarget {
    id: TargetId,
    size: (u32, u32),
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: Option<DepthBuffer>,
}

impl GpuTarget {
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

struct DepthBuffer {
    texture: wgpu::Texture,
    format: wgpu::TextureFormat,
    /// All aspects, for the depth-stencil attachment.
    attachment: wgpu::TextureView,
    /// Depth aspect only, for sampling in a later pass.
    sampled: wgpu::TextureView,
}

impl DepthBuffer {
    fn new(
        device: &wgpu::Device,
        label: &str,
        size: (u32, u32),
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let attachment = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampled = texture.create_view(&wgpu::TextureViewDescriptor {
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });
        Self {
            texture,
            format,
            attachment,
            sampled,
        }
    }

    fn has_stencil(&self) -> bool {
        self.format.has_stencil_aspect()
    }
}

struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// Draws pipelines with wgpu.
///
/// Render targets use the surface format for colour so any pass can write either to a
/// target or to the screen with the same programs.
pub struct WgpuBackend {
    gpu: GpuContext,
    scene: SceneRenderer,
    programs: ProgramCache,
    /// One uniform buffer per pass, so passes in the same frame don't overwrite
    /// each other's values before submission.
    uniforms: HashMap<(PassId, u64), wgpu::Buffer>,
    /// Depth for scene draws whose output has none of its own.
    scratch_depth: Option<(DepthBuffer, (u32, u32))>,
    frame: Option<ActiveFrame>,
    force_degraded: bool,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext, scene: &SceneContent) -> Self {
        let scene = SceneRenderer::new(&gpu.device, gpu.format(), scene);
        let programs = ProgramCache::new(&gpu.device, gpu.format());
        Self {
            gpu,
            scene,
            programs,
            uniforms: HashMap::new(),
            scratch_depth: None,
            frame: None,
            force_degraded: false,
        }
    }

    /// Reports depth texture sampling as unsupported, to exercise the fallback path.
    pub fn force_degraded(mut self, force: bool) -> Self {
        self.force_degraded = force;
        self
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn create_target(&self, desc: &TargetDescriptor) -> GpuTarget {
        let device = &self.gpu.device;
        let size = (desc.width, desc.height);
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.id.0),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.gpu.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = desc.options.needs_depth.then(|| {
            let format = if desc.options.needs_stencil {
                DEPTH_STENCIL_FORMAT
            } else {
                DEPTH_FORMAT
            };
            DepthBuffer::new(device, desc.id.0, size, format)
        });

        GpuTarget {
            id: desc.id,
            size,
            color,
            color_view,
            depth,
        }
    }
}

fn uniform_buffer<'a>(
    cache: &'a mut HashMap<(PassId, u64), wgpu::Buffer>,
    device: &wgpu::Device,
    pass: PassId,
    contents: &[u8],
) -> &'a wgpu::Buffer {
    cache
        .entry((pass, contents.len() as u64))
        .or_insert_with(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(pass.0),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })
}

fn load_op(clear: Option<[f32; 4]>) -> wgpu::LoadOp<wgpu::Color> {
    match clear {
        Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        None => wgpu::LoadOp::Load,
    }
}

impl RenderBackend for WgpuBackend {
    type Target = GpuTarget;

    fn capabilities(&self) -> Capabilities {
        if self.force_degraded {
            Capabilities {
                depth_texture_sampling: false,
                ..self.gpu.capabilities
            }
        } else {
            self.gpu.capabilities
        }
    }

    fn allocate_target(&mut self, desc: &TargetDescriptor) -> Result<GpuTarget, AllocationError> {
        let fail = |reason: String| AllocationError {
            target: desc.id,
            width: desc.width,
            height: desc.height,
            reason,
        };

        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 {
            return Err(fail("empty size".to_string()));
        }
        if desc.width > max || desc.height > max {
            return Err(fail(format!("exceeds the device limit of {max}")));
        }

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let target = self.create_target(desc);
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());

        if let Some(err) = validation.or(out_of_memory) {
            self.release_target(target);
            return Err(fail(err.to_string()));
        }
        Ok(target)
    }

    fn release_target(&mut self, target: GpuTarget) {
        target.color.destroy();
        if let Some(depth) = target.depth {
            depth.texture.destroy();
        }
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice, dropping the unfinished frame");
            self.frame = None;
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Err(FrameError::Reconfigured);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(FrameError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(err) => return Err(FrameError::Other(err.to_string())),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_, GpuTarget>) {
        let Self {
            gpu,
            scene,
            programs,
            uniforms,
            scratch_depth,
            frame,
            ..
        } = self;

        let Some(ActiveFrame { view, encoder, .. }) = frame.as_mut() else {
            log::warn!("draw for pass `{}` outside a frame", call.pass);
            return;
        };

        let (color_view, size, own_depth) = match call.output {
            DrawOutput::Screen => (&*view, (gpu.width(), gpu.height()), None),
            DrawOutput::Target(target) => (&target.color_view, target.size, target.depth.as_ref()),
        };
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: load_op(call.clear),
                store: wgpu::StoreOp::Store,
            },
        };

        match call.kind {
            PassKind::SceneDraw { material } => {
                let depth = match own_depth {
                    Some(depth) => depth,
                    None => scratch(scratch_depth, &gpu.device, size),
                };

                let values = scene.uniforms(call.camera);
                let bytes = bytemuck::bytes_of(&values);
                let buffer = uniform_buffer(uniforms, &gpu.device, call.pass, bytes);
                gpu.queue.write_buffer(buffer, 0, bytes);
                let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Scene Bind Group"),
                    layout: scene.bind_group_layout(),
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(call.pass.0),
                    color_attachments: &[Some(color_attachment)],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &depth.attachment,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: depth.has_stencil().then_some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(0),
                            store: wgpu::StoreOp::Store,
                        }),
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                scene.draw(&gpu.device, &mut render_pass, material, depth.format, &bind_group);
            }
            PassKind::FullscreenQuad { program } => {
                let Some(registered) = fullscreen::find_program(program) else {
                    log::error!("pass `{}` uses unknown program `{program}`", call.pass);
                    return;
                };

                let inputs: Vec<(UniformName, Channel)> = call
                    .bindings
                    .textures
                    .iter()
                    .map(|texture| (texture.uniform, texture.channel))
                    .collect();
                if !registered.accepts(&inputs) {
                    log::error!(
                        "pass `{}` binds {inputs:?} but `{program}` expects {:?}, skipping",
                        call.pass,
                        registered.inputs
                    );
                    return;
                }
                if !programs.prepare(&gpu.device, registered, &inputs) {
                    return;
                }
                let Some(compiled) = programs.get(program, &inputs) else {
                    return;
                };

                let values = QuadUniforms::new(call.camera, call.bindings);
                let bytes = bytemuck::bytes_of(&values);
                let buffer = uniform_buffer(uniforms, &gpu.device, call.pass, bytes);
                gpu.queue.write_buffer(buffer, 0, bytes);

                let Some(entries) = bind_group_entries(programs, buffer, call.bindings) else {
                    log::error!(
                        "pass `{}` reads a depth channel from a target without depth",
                        call.pass
                    );
                    return;
                };
                let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Fullscreen Bind Group"),
                    layout: &compiled.layout,
                    entries: &entries,
                });

                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(call.pass.0),
                    color_attachments: &[Some(color_attachment)],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                render_pass.set_pipeline(&compiled.pipeline);
                render_pass.set_bind_group(0, &bind_group, &[]);
                render_pass.draw(0..6, 0..1);
            }
        }
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.gpu.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
    }
}

/// Depth attachment for scene draws into outputs without their own, rebuilt when the
/// output size changes.
fn scratch<'a>(
    slot: &'a mut Option<(DepthBuffer, (u32, u32))>,
    device: &wgpu::Device,
    size: (u32, u32),
) -> &'a DepthBuffer {
    if slot.as_ref().is_some_and(|(_, current)| *current != size) {
        if let Some((stale, _)) = slot.take() {
            stale.texture.destroy();
        }
    }
    let (buffer, _) = slot.get_or_insert_with(|| {
        let buffer = DepthBuffer::new(device, "Scratch Depth", size, DEPTH_FORMAT);
        (buffer, size)
    });
    buffer
}

fn bind_group_entries<'a>(
    programs: &'a ProgramCache,
    buffer: &'a wgpu::Buffer,
    bindings: &'a ResolvedBindings<'a, GpuTarget>,
) -> Option<Vec<wgpu::BindGroupEntry<'a>>> {
    let mut entries = vec![wgpu::BindGroupEntry {
        binding: 0,
        resource: buffer.as_entire_binding(),
    }];

    for texture in &bindings.textures {
        let slot = fullscreen::texture_slot(texture.uniform)?;
        match texture.channel {
            Channel::Color => {
                entries.push(wgpu::BindGroupEntry {
                    binding: slot,
                    resource: wgpu::BindingResource::TextureView(&texture.handle.color_view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: slot + 1,
                    resource: wgpu::BindingResource::Sampler(programs.sampler(texture.filter)),
                });
            }
            Channel::Depth => {
                let depth = texture.handle.depth.as_ref()?;
                entries.push(wgpu::BindGroupEntry {
                    binding: slot,
                    resource: wgpu::BindingResource::TextureView(&depth.sampled),
                });
            }
        }
    }

    Some(entries)
}
