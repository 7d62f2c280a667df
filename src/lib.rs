//! # Strata
//!
//! **Multi-pass offscreen rendering on wgpu, with the depth and outline demos built on it.**
//!
//! A [`Pipeline`] runs an ordered list of passes each frame. A pass draws the scene or a
//! fullscreen quad, reads earlier passes' render targets through typed uniform bindings,
//! and writes to its own target or to the screen. Targets follow the viewport: every
//! resize reallocates them at the new pixel size without touching the pass wiring.
//!
//! ## Quick Start
//!
//! ```no_run
//! use strata::{AppConfig, Demo, LoggingConfig, init_logging};
//!
//! fn main() -> Result<(), strata::AppError> {
//!     init_logging(LoggingConfig::default());
//!     strata::run(AppConfig::new().demo(Demo::Outline).size(1280, 720))
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`render_graph`](crate::Pipeline): passes, targets, bindings and the
//!   [`RenderBackend`] seam. Knows nothing about wgpu.
//! - [`WgpuBackend`]: the GPU implementation of that seam.
//! - [`DemoPipelines`]: the depth visualization and Gooch outline setups.
//! - [`run`]: the winit host loop, clock, orbit camera and keyboard settings panel.

mod app;
mod camera;
mod clock;
mod demos;
mod depth;
mod error;
mod fullscreen;
mod geometry;
mod gpu;
mod gpu_backend;
mod input;
mod logging;
mod mesh;
mod orbit_camera;
mod render_graph;
mod scene_renderer;
mod settings;
mod viewport;

pub use app::{AppConfig, run};
pub use camera::{Camera, Projection};
pub use clock::{FrameClock, FrameTime};
pub use demos::{
    Demo, DemoPipelines, depth_override_pipeline, depth_visualize_pipeline, lit_scene_pipeline,
    outline_pipeline, scene_pipeline,
};
pub use depth::{LinearizationMethod, perspective_depth_to_view_z, view_z_to_orthographic_depth};
pub use error::{AllocationError, AppError, FrameError, GpuError, PipelineError};
pub use fullscreen::{FullscreenProgram, QuadUniforms};
pub use geometry::{RawGeometry, SceneContent, TorusKnot, scatter_on_sphere};
pub use gpu::{DEPTH_FORMAT, DEPTH_STENCIL_FORMAT, GpuContext};
pub use gpu_backend::{GpuTarget, WgpuBackend};
pub use input::Input;
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{InstanceRaw, Mesh, Transform, Vertex3d};
pub use orbit_camera::{OrbitCamera, OrbitMode};
pub use render_graph::{
    Capabilities, Capability, Channel, DegradedReason, DrawCall, DrawOutput, FilterMode,
    FrameContext, InputBinding, Output, Pass, PassCamera, PassId, PassKind, Pipeline,
    PipelineBuilder, PipelineState, ProgramId, RenderBackend, RenderTarget, ResolvedBindings,
    ResolvedScalar, ResolvedTexture, ScalarBinding, ScalarSource, SceneMaterial,
    TargetDescriptor, TargetId, TargetOptions, TargetTable, TargetUsage, UniformKind,
    UniformName, resolve,
};
pub use scene_renderer::{SceneRenderer, SceneUniforms};
pub use settings::{Settings, VisualizeMode};
pub use viewport::{Viewport, ViewportListener};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
