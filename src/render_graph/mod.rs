//! Declarative multi-pass offscreen rendering.
//!
//! A [`Pipeline`] is an ordered list of [`Pass`]es plus the [`RenderTarget`]s they
//! exchange pixels through. Each pass issues exactly one draw: either a traversal of the
//! 3D scene or a single fullscreen quad. Passes read earlier targets through typed
//! uniform bindings and write to their own target or to the screen.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   scene    ┌─────────────┐   edges    ┌─────────────┐
//! │  SceneDraw  │──(colour)─▶│  Fullscreen │──(mask)───▶│  Fullscreen │──▶ Screen
//! │  (Gooch)    │──(depth)──▶│  (outline)  │            │ (composite) │
//! └─────────────┘     │      └─────────────┘            └─────────────┘
//!                     └───────────────(colour)─────────────────▲
//! ```
//!
//! Targets are referenced by [`TargetId`], never by handle. Handles are looked up again
//! every frame, so a resize only has to swap the [`TargetTable`] contents.
//!
//! # Backends
//!
//! Everything GPU-specific sits behind [`RenderBackend`]. The crate ships a wgpu
//! implementation; tests drive the pipeline through a recording backend instead.
//!
//! # Example
//!
//! ```ignore
//! use strata::*;
//!
//! let pipeline = Pipeline::builder()
//!     .target("scene", TargetOptions::color(FilterMode::Nearest).with_depth_stencil())
//!     .pass(Pass::scene("scene", SceneMaterial::Lit).into_target("scene"))
//!     .pass(
//!         Pass::fullscreen("post", "depth_visualize")
//!             .depth(UniformName::SceneDepth, "scene")
//!             .scalar(UniformName::CameraNear, ScalarSource::CameraNear)
//!             .scalar(UniformName::CameraFar, ScalarSource::CameraFar),
//!     )
//!     .build(&mut backend, viewport)?;
//!
//! // In the render loop:
//! pipeline.execute(&mut backend, &FrameContext::new(&camera, &settings, clock.tick()));
//! ```

mod backend;
mod bindings;
mod context;
mod graph;
mod pass;
mod render_target;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Capabilities, Capability, DrawCall, DrawOutput, RenderBackend};
pub use bindings::{
    Channel, InputBinding, ResolvedBindings, ResolvedScalar, ResolvedTexture, ScalarBinding,
    ScalarSource, UniformKind, UniformName, resolve,
};
pub use context::FrameContext;
pub use graph::{DegradedReason, Pipeline, PipelineBuilder, PipelineState};
pub use pass::{Output, Pass, PassCamera, PassId, PassKind, ProgramId, SceneMaterial};
pub use render_target::{
    FilterMode, RenderTarget, TargetDescriptor, TargetId, TargetOptions, TargetTable, TargetUsage,
};
