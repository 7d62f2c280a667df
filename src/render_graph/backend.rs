//! The seam between the pipeline and whatever actually talks to the GPU.

use std::fmt;

use crate::camera::Camera;
use crate::error::{AllocationError, FrameError};
use crate::render_graph::bindings::ResolvedBindings;
use crate::render_graph::pass::{PassId, PassKind};
use crate::render_graph::render_target::TargetDescriptor;

/// Optional platform features a pipeline may depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth buffers can be bound as textures and sampled by a later pass.
    DepthTextureSampling,
    /// Depth buffers can carry a stencil aspect.
    StencilBuffer,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthTextureSampling => f.write_str("depth texture sampling"),
            Self::StencilBuffer => f.write_str("stencil buffer"),
        }
    }
}

/// Capability flags reported by a backend at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub depth_texture_sampling: bool,
    pub stencil_buffer: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        depth_texture_sampling: true,
        stencil_buffer: true,
    };

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::DepthTextureSampling => self.depth_texture_sampling,
            Capability::StencilBuffer => self.stencil_buffer,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// Destination of a draw.
#[derive(Debug)]
pub enum DrawOutput<'a, T> {
    Target(&'a T),
    Screen,
}

/// One `render_into(target | screen, scene, camera)` request.
#[derive(Debug)]
pub struct DrawCall<'a, T> {
    pub pass: PassId,
    pub kind: PassKind,
    pub camera: &'a Camera,
    pub output: DrawOutput<'a, T>,
    /// RGBA clear colour, or `None` to draw over existing contents.
    pub clear: Option<[f32; 4]>,
    pub bindings: &'a ResolvedBindings<'a, T>,
}

/// A renderer the pipeline can allocate targets on and issue draws to.
///
/// Calls arrive in a fixed order each frame: `begin_frame`, one `draw` per pass in
/// declaration order, then `end_frame`. Allocation and release only happen at setup
/// and on viewport resize, never between `begin_frame` and `end_frame`.
pub trait RenderBackend {
    /// Backend-specific storage for one render target.
    type Target;

    /// Reports optional features; checked once when a pipeline is built.
    fn capabilities(&self) -> Capabilities;

    fn allocate_target(&mut self, desc: &TargetDescriptor) -> Result<Self::Target, AllocationError>;

    fn release_target(&mut self, target: Self::Target);

    /// Prepares a frame. An error means the frame is skipped.
    fn begin_frame(&mut self) -> Result<(), FrameError>;

    fn draw(&mut self, call: &DrawCall<'_, Self::Target>);

    /// Submits everything recorded since `begin_frame` and presents.
    fn end_frame(&mut self);
}
