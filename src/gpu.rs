//! Device, queue and surface setup.
//!
//! [`GpuContext`] owns the wgpu objects everything else borrows. It also probes the
//! adapter once for the optional features a [`Pipeline`](crate::Pipeline) may need.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use winit::window::Window;
//! # fn demo(window: Arc<Window>) -> Result<(), strata::GpuError> {
//! use strata::GpuContext;
//!
//! let gpu = GpuContext::new(window)?;
//! if !gpu.capabilities.depth_texture_sampling {
//!     log::warn!("post-processing will fall back to the plain scene");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;
use crate::render_graph::Capabilities;

/// Depth format used when a target needs a stencil aspect.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
/// Depth format used otherwise.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Core GPU context holding the wgpu resources of one window.
pub struct GpuContext {
    /// The window surface frames are presented to.
    pub surface: wgpu::Surface<'static>,
    /// Logical device used to create buffers, textures and pipelines.
    pub device: wgpu::Device,
    /// Queue for uploads and command submission.
    pub queue: wgpu::Queue,
    /// Current surface configuration; its size follows the window.
    pub config: wgpu::SurfaceConfiguration,
    /// Probed from the adapter at creation.
    pub capabilities: Capabilities,
}

impl GpuContext {
    /// Creates the instance, surface, adapter and device for `window`, then configures
    /// the surface with an sRGB format and Fifo presentation.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Strata Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let capabilities = probe_capabilities(&adapter);
        log::debug!("capabilities: {capabilities:?}");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            capabilities,
        })
    }

    /// Reconfigures the surface. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigures at the current size, after the surface was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}

fn probe_capabilities(adapter: &wgpu::Adapter) -> Capabilities {
    let samplable = |format: wgpu::TextureFormat| {
        let features = adapter.get_texture_format_features(format);
        features
            .allowed_usages
            .contains(wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT)
    };

    Capabilities {
        depth_texture_sampling: samplable(DEPTH_FORMAT) && samplable(DEPTH_STENCIL_FORMAT),
        stencil_buffer: adapter
            .get_texture_format_features(DEPTH_STENCIL_FORMAT)
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
    }
}
