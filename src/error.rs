//! Error types shared across the pipeline, the GPU backend and the app runner.

use thiserror::Error;

use crate::render_graph::{PassId, TargetId, UniformName};

/// Errors detected while declaring a [`Pipeline`](crate::Pipeline).
///
/// All of these are structural: the pass sequence is static, so they are caught once at
/// construction and never at draw time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("pipeline has no passes")]
    Empty,

    #[error("pipeline has no scene pass to fall back to")]
    NoScenePass,

    #[error("render target `{0}` is declared twice")]
    DuplicateTarget(TargetId),

    #[error("pass `{0}` is declared twice")]
    DuplicatePass(PassId),

    #[error("pass `{pass}` references undeclared render target `{target}`")]
    UnknownTarget { pass: PassId, target: TargetId },

    #[error("pass `{pass}` reads `{target}` before any earlier pass writes it")]
    ForwardReference { pass: PassId, target: TargetId },

    #[error("pass `{pass}` reads `{target}` while writing it")]
    ReadsOwnOutput { pass: PassId, target: TargetId },

    #[error("pass `{pass}` samples the depth of `{target}`, which has no depth buffer")]
    NoDepthBuffer { pass: PassId, target: TargetId },

    #[error("pass `{pass}` binds `{uniform}` twice")]
    DuplicateUniform { pass: PassId, uniform: UniformName },

    #[error("pass `{pass}` binds `{uniform}` to the wrong kind of source")]
    UniformKindMismatch { pass: PassId, uniform: UniformName },

    #[error("scene pass `{0}` cannot take texture inputs")]
    SceneInputs(PassId),
}

/// A render target could not be created at the requested size and format.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to allocate render target `{target}` at {width}x{height}: {reason}")]
pub struct AllocationError {
    pub target: TargetId,
    pub width: u32,
    pub height: u32,
    pub reason: String,
}

/// The backend could not start a frame; the frame is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("surface lost or outdated, reconfigured")]
    Reconfigured,

    #[error("timed out acquiring the next surface texture")]
    Timeout,

    #[error("surface is out of memory")]
    OutOfMemory,

    #[error("surface error: {0}")]
    Other(String),
}

/// GPU initialisation failures.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Top-level failures of the windowed runner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
