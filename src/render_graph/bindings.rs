//! Typed uniform bindings and their per-frame resolution.
//!
//! Every pass declares which symbolic uniforms it reads. Texture uniforms point at a
//! render target by id and channel; scalar uniforms point at a [`ScalarSource`]. Both
//! are validated when the pipeline is built and resolved again each frame, so a new
//! handle after a resize or a new far plane from the control panel is picked up without
//! rebuilding anything.

use std::fmt;

use crate::error::PipelineError;
use crate::render_graph::context::FrameContext;
use crate::render_graph::pass::Pass;
use crate::render_graph::render_target::{FilterMode, TargetId, TargetTable};

/// Closed set of uniform names a pass may bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformName {
    /// Colour buffer of the rendered scene.
    SceneColor,
    /// Raw, non-linear depth of the rendered scene.
    SceneDepth,
    /// Outline mask produced by an edge pass.
    EdgeMask,
    CameraNear,
    CameraFar,
    /// Which depth linearization to apply, as the numeric visualize mode.
    LinearizationMethod,
    /// Free blend parameter in `[0, 1]`.
    Blend,
    /// Seconds since the clock started.
    Time,
}

/// Whether a uniform takes a texture or a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Texture,
    Scalar,
}

impl UniformName {
    pub fn kind(self) -> UniformKind {
        match self {
            Self::SceneColor | Self::SceneDepth | Self::EdgeMask => UniformKind::Texture,
            Self::CameraNear
            | Self::CameraFar
            | Self::LinearizationMethod
            | Self::Blend
            | Self::Time => UniformKind::Scalar,
        }
    }

    /// Name used in shader source and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SceneColor => "scene_color",
            Self::SceneDepth => "scene_depth",
            Self::EdgeMask => "edge_mask",
            Self::CameraNear => "camera_near",
            Self::CameraFar => "camera_far",
            Self::LinearizationMethod => "linearization_method",
            Self::Blend => "blend",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for UniformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which buffer of a render target is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Color,
    Depth,
}

/// A texture uniform fed from an earlier pass's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputBinding {
    pub uniform: UniformName,
    pub source: TargetId,
    pub channel: Channel,
}

impl InputBinding {
    pub fn color(uniform: UniformName, source: TargetId) -> Self {
        Self {
            uniform,
            source,
            channel: Channel::Color,
        }
    }

    pub fn depth(uniform: UniformName, source: TargetId) -> Self {
        Self {
            uniform,
            source,
            channel: Channel::Depth,
        }
    }
}

/// Where a scalar uniform gets its value each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarSource {
    CameraNear,
    CameraFar,
    VisualizeMode,
    Blend,
    ElapsedTime,
    Constant(f32),
}

impl ScalarSource {
    /// Reads the current value. Never cached across frames.
    pub fn read(self, ctx: &FrameContext) -> f32 {
        match self {
            Self::CameraNear => ctx.camera.near,
            Self::CameraFar => ctx.camera.far,
            Self::VisualizeMode => ctx.settings.visualize.index() as f32,
            Self::Blend => ctx.settings.blend,
            Self::ElapsedTime => ctx.time.elapsed,
            Self::Constant(value) => value,
        }
    }
}

/// A scalar uniform and its live source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarBinding {
    pub uniform: UniformName,
    pub source: ScalarSource,
}

/// A texture binding resolved to the target's current handle.
#[derive(Debug)]
pub struct ResolvedTexture<'a, H> {
    pub uniform: UniformName,
    pub target: TargetId,
    pub channel: Channel,
    pub filter: FilterMode,
    pub handle: &'a H,
}

/// A scalar binding resolved to this frame's value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedScalar {
    pub uniform: UniformName,
    pub value: f32,
}

/// Concrete inputs for one draw: textures then scalars, each in declared order.
#[derive(Debug)]
pub struct ResolvedBindings<'a, H> {
    pub textures: Vec<ResolvedTexture<'a, H>>,
    pub scalars: Vec<ResolvedScalar>,
}

impl<H> ResolvedBindings<'_, H> {
    pub fn empty() -> Self {
        Self {
            textures: Vec::new(),
            scalars: Vec::new(),
        }
    }

    pub fn scalar(&self, uniform: UniformName) -> Option<f32> {
        self.scalars
            .iter()
            .find(|scalar| scalar.uniform == uniform)
            .map(|scalar| scalar.value)
    }

    pub fn texture(&self, uniform: UniformName) -> Option<&ResolvedTexture<'_, H>> {
        self.textures.iter().find(|texture| texture.uniform == uniform)
    }
}

/// Checks one pass's bindings in isolation: kinds match, no uniform is bound twice.
pub(crate) fn validate(pass: &Pass) -> Result<(), PipelineError> {
    let mut seen = Vec::with_capacity(pass.inputs.len() + pass.scalars.len());

    for input in &pass.inputs {
        if input.uniform.kind() != UniformKind::Texture {
            return Err(PipelineError::UniformKindMismatch {
                pass: pass.id,
                uniform: input.uniform,
            });
        }
        if seen.contains(&input.uniform) {
            return Err(PipelineError::DuplicateUniform {
                pass: pass.id,
                uniform: input.uniform,
            });
        }
        seen.push(input.uniform);
    }

    for scalar in &pass.scalars {
        if scalar.uniform.kind() != UniformKind::Scalar {
            return Err(PipelineError::UniformKindMismatch {
                pass: pass.id,
                uniform: scalar.uniform,
            });
        }
        if seen.contains(&scalar.uniform) {
            return Err(PipelineError::DuplicateUniform {
                pass: pass.id,
                uniform: scalar.uniform,
            });
        }
        seen.push(scalar.uniform);
    }

    Ok(())
}

/// Resolves a pass's bindings against the current handle table and frame inputs.
///
/// Pure: the same table, settings and camera always give the same result.
pub fn resolve<'a, H>(
    pass: &Pass,
    targets: &'a TargetTable<H>,
    ctx: &FrameContext,
) -> Result<ResolvedBindings<'a, H>, PipelineError> {
    let textures = pass
        .inputs
        .iter()
        .map(|input| {
            let target = targets
                .get(input.source)
                .ok_or(PipelineError::UnknownTarget {
                    pass: pass.id,
                    target: input.source,
                })?;
            let filter = match input.channel {
                Channel::Color => target.options().color_filter(),
                Channel::Depth => target.options().depth_filter(),
            };
            Ok(ResolvedTexture {
                uniform: input.uniform,
                target: input.source,
                channel: input.channel,
                filter,
                handle: target.handle(),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    let scalars = pass
        .scalars
        .iter()
        .map(|binding| ResolvedScalar {
            uniform: binding.uniform,
            value: binding.source.read(ctx),
        })
        .collect();

    Ok(ResolvedBindings { textures, scalars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::clock::FrameTime;
    use crate::render_graph::pass::Pass;
    use crate::render_graph::render_target::{RenderTarget, TargetOptions};
    use crate::render_graph::testing::{MockTarget, RecordingBackend};
    use crate::settings::{Settings, VisualizeMode};

    fn table(backend: &mut RecordingBackend) -> TargetTable<MockTarget> {
        let mut table = TargetTable::new();
        table.push(
            RenderTarget::create(
                backend,
                TargetId("scene"),
                800,
                600,
                TargetOptions::color(FilterMode::Linear).with_depth_stencil(),
            )
            .unwrap(),
        );
        table
    }

    #[test]
    fn scalars_are_read_fresh_from_camera_and_settings() {
        let mut backend = RecordingBackend::new();
        let targets = table(&mut backend);
        let pass = Pass::fullscreen("post", "depth_visualize")
            .depth(UniformName::SceneDepth, "scene")
            .scalar(UniformName::CameraNear, ScalarSource::CameraNear)
            .scalar(UniformName::CameraFar, ScalarSource::CameraFar)
            .scalar(UniformName::LinearizationMethod, ScalarSource::VisualizeMode);

        let mut camera = Camera::default();
        let mut settings = Settings::default();
        settings.visualize = VisualizeMode::DepthLinearNdc;

        camera.far = 50.0;
        let ctx = FrameContext::new(&camera, &settings, FrameTime::zero());
        let first = resolve(&pass, &targets, &ctx).unwrap();
        assert_eq!(first.scalar(UniformName::CameraFar), Some(50.0));
        assert_eq!(first.scalar(UniformName::LinearizationMethod), Some(3.0));

        camera.far = 12.5;
        let ctx = FrameContext::new(&camera, &settings, FrameTime::zero());
        let second = resolve(&pass, &targets, &ctx).unwrap();
        assert_eq!(second.scalar(UniformName::CameraFar), Some(12.5));
        assert_eq!(second.scalar(UniformName::CameraNear), Some(camera.near));
    }

    #[test]
    fn depth_channel_is_always_nearest() {
        let mut backend = RecordingBackend::new();
        let targets = table(&mut backend);
        let pass = Pass::fullscreen("post", "depth_visualize")
            .color(UniformName::SceneColor, "scene")
            .depth(UniformName::SceneDepth, "scene");
        let camera = Camera::default();
        let settings = Settings::default();
        let ctx = FrameContext::new(&camera, &settings, FrameTime::zero());

        let resolved = resolve(&pass, &targets, &ctx).unwrap();
        let color = resolved.texture(UniformName::SceneColor).unwrap();
        let depth = resolved.texture(UniformName::SceneDepth).unwrap();
        assert_eq!(color.filter, FilterMode::Linear);
        assert_eq!(depth.filter, FilterMode::Nearest);
        assert_eq!(resolved.textures[0].uniform, UniformName::SceneColor);
    }

    #[test]
    fn rejects_mismatched_and_duplicate_uniforms() {
        let pass = Pass::fullscreen("post", "composite").color(UniformName::Blend, "scene");
        assert_eq!(
            validate(&pass),
            Err(PipelineError::UniformKindMismatch {
                pass: pass.id,
                uniform: UniformName::Blend,
            })
        );

        let pass = Pass::fullscreen("post", "composite")
            .scalar(UniformName::Blend, ScalarSource::Blend)
            .scalar(UniformName::Blend, ScalarSource::Constant(1.0));
        assert_eq!(
            validate(&pass),
            Err(PipelineError::DuplicateUniform {
                pass: pass.id,
                uniform: UniformName::Blend,
            })
        );
    }
}
