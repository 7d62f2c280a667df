//! Pass declarations: what a pass draws, which camera it uses, what it reads and where it
//! writes.

use std::fmt;

use crate::render_graph::bindings::{InputBinding, ScalarBinding, ScalarSource, UniformName};
use crate::render_graph::render_target::TargetId;

/// Stable name of a pass within a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PassId(pub &'static str);

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Name of a registered fullscreen fragment program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub &'static str);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Surface material used when a pass traverses the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneMaterial {
    /// Ambient + hemisphere + key light on the base colour.
    Lit,
    /// Warm/cool tone shading.
    Gooch,
    /// Every surface replaced by `1 - depth` in grey.
    DepthOverride,
}

/// The single draw a pass issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    /// Full 3D scene traversal against the pass camera.
    SceneDraw { material: SceneMaterial },
    /// One full-screen quad shaded by `program`, reading the bound textures.
    FullscreenQuad { program: ProgramId },
}

/// Which camera a pass is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassCamera {
    /// The frame's scene camera, shared by reference across passes.
    Scene,
    /// The fixed orthographic post-processing camera.
    Fullscreen,
}

/// Where a pass writes its pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Target(TargetId),
    Screen,
}

/// A single draw operation in a [`Pipeline`](crate::Pipeline).
///
/// Passes are immutable once the pipeline is built. Only the scalar values behind their
/// [`ScalarSource`]s change between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Pass {
    pub id: PassId,
    pub kind: PassKind,
    pub camera: PassCamera,
    pub inputs: Vec<InputBinding>,
    pub scalars: Vec<ScalarBinding>,
    pub output: Output,
    pub clear: Option<[f32; 4]>,
}

impl Pass {
    /// A scene traversal with the scene camera, clearing to black.
    pub fn scene(id: &'static str, material: SceneMaterial) -> Self {
        Self {
            id: PassId(id),
            kind: PassKind::SceneDraw { material },
            camera: PassCamera::Scene,
            inputs: Vec::new(),
            scalars: Vec::new(),
            output: Output::Screen,
            clear: Some([0.0, 0.0, 0.0, 1.0]),
        }
    }

    /// A fullscreen quad pass with the post camera.
    pub fn fullscreen(id: &'static str, program: &'static str) -> Self {
        Self {
            id: PassId(id),
            kind: PassKind::FullscreenQuad {
                program: ProgramId(program),
            },
            camera: PassCamera::Fullscreen,
            inputs: Vec::new(),
            scalars: Vec::new(),
            output: Output::Screen,
            clear: Some([0.0, 0.0, 0.0, 1.0]),
        }
    }

    /// Write into an offscreen target instead of the screen.
    pub fn into_target(mut self, target: &'static str) -> Self {
        self.output = Output::Target(TargetId(target));
        self
    }

    /// Write to the screen (the default).
    pub fn to_screen(mut self) -> Self {
        self.output = Output::Screen;
        self
    }

    /// Bind the colour buffer of `target` to `uniform`.
    pub fn color(mut self, uniform: UniformName, target: &'static str) -> Self {
        self.inputs.push(InputBinding::color(uniform, TargetId(target)));
        self
    }

    /// Bind the depth buffer of `target` to `uniform`.
    pub fn depth(mut self, uniform: UniformName, target: &'static str) -> Self {
        self.inputs.push(InputBinding::depth(uniform, TargetId(target)));
        self
    }

    /// Bind a scalar uniform to a live value.
    pub fn scalar(mut self, uniform: UniformName, source: ScalarSource) -> Self {
        self.scalars.push(ScalarBinding { uniform, source });
        self
    }

    pub fn is_scene(&self) -> bool {
        matches!(self.kind, PassKind::SceneDraw { .. })
    }

    pub fn output_target(&self) -> Option<TargetId> {
        match self.output {
            Output::Target(id) => Some(id),
            Output::Screen => None,
        }
    }
}
