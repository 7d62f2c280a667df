//! The two demo pipelines: depth visualization and Gooch outlines.
//!
//! A demo is a fixed set of [`Pipeline`]s plus the rule for picking one each frame. Both
//! demos draw the same torus-knot scene and follow the same visualize modes; they only
//! differ in the scene material and in how the post-processing passes are wired.

use std::fmt;

use crate::error::PipelineError;
use crate::render_graph::{
    FilterMode, FrameContext, Pass, Pipeline, PipelineBuilder, RenderBackend, ScalarSource,
    SceneMaterial, TargetOptions, UniformName,
};
use crate::settings::{Settings, VisualizeMode};
use crate::viewport::{Viewport, ViewportListener};

/// Which demo the application runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Demo {
    /// Raw, overridden and linearized depth.
    #[default]
    Depth,
    /// Gooch shading with depth-discontinuity outlines.
    Outline,
}

impl Demo {
    /// Starting settings; each demo opens on the view it was written to show.
    pub fn default_settings(self) -> Settings {
        match self {
            Self::Depth => Settings::default(),
            Self::Outline => {
                Settings::default().with_visualize(VisualizeMode::DepthLinearPerspective)
            }
        }
    }

    /// Material of the scene pass in every pipeline of this demo.
    pub fn scene_material(self) -> SceneMaterial {
        match self {
            Self::Depth => SceneMaterial::Lit,
            Self::Outline => SceneMaterial::Gooch,
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth => f.write_str("depth"),
            Self::Outline => f.write_str("outline"),
        }
    }
}

/// `SceneDraw(material)` straight to the screen.
pub fn scene_pipeline(material: SceneMaterial) -> PipelineBuilder {
    PipelineBuilder::new().pass(Pass::scene("scene", material))
}

/// `SceneDraw(Lit)` straight to the screen.
pub fn lit_scene_pipeline() -> PipelineBuilder {
    scene_pipeline(SceneMaterial::Lit)
}

/// Every material replaced by `1 - depth`, straight to the screen.
pub fn depth_override_pipeline() -> PipelineBuilder {
    scene_pipeline(SceneMaterial::DepthOverride)
}

/// Scene into an offscreen target, then linearized depth on a fullscreen quad.
pub fn depth_visualize_pipeline() -> PipelineBuilder {
    PipelineBuilder::new()
        .target(
            "scene",
            TargetOptions::color(FilterMode::Nearest).with_depth_stencil(),
        )
        .pass(Pass::scene("scene", SceneMaterial::Lit).into_target("scene"))
        .pass(
            Pass::fullscreen("visualize", "depth_visualize")
                .color(UniformName::SceneColor, "scene")
                .depth(UniformName::SceneDepth, "scene")
                .scalar(UniformName::CameraNear, ScalarSource::CameraNear)
                .scalar(UniformName::CameraFar, ScalarSource::CameraFar)
                .scalar(UniformName::LinearizationMethod, ScalarSource::VisualizeMode),
        )
}

/// Gooch scene, an edge mask from its linearized depth, then the two composited on
/// screen.
pub fn outline_pipeline() -> PipelineBuilder {
    PipelineBuilder::new()
        .target(
            "scene",
            TargetOptions::color(FilterMode::Linear).with_depth_stencil(),
        )
        .target("edges", TargetOptions::lookup())
        .pass(Pass::scene("scene", SceneMaterial::Gooch).into_target("scene"))
        .pass(
            Pass::fullscreen("outline", "outline")
                .depth(UniformName::SceneDepth, "scene")
                .scalar(UniformName::CameraNear, ScalarSource::CameraNear)
                .scalar(UniformName::CameraFar, ScalarSource::CameraFar)
                .scalar(UniformName::LinearizationMethod, ScalarSource::VisualizeMode)
                .into_target("edges"),
        )
        .pass(
            Pass::fullscreen("composite", "composite")
                .color(UniformName::SceneColor, "scene")
                .color(UniformName::EdgeMask, "edges")
                .scalar(UniformName::Blend, ScalarSource::Blend),
        )
}

/// The built pipelines of one demo, one per group of visualize modes.
///
/// | mode                        | pipeline                          |
/// |-----------------------------|-----------------------------------|
/// | `Scene`                     | the demo's material to the screen |
/// | `DepthOverride`             | `1 - depth` to the screen         |
/// | `DepthLinear*`              | the demo's post-processing chain  |
pub struct DemoPipelines<H> {
    demo: Demo,
    scene: Pipeline<H>,
    depth_override: Pipeline<H>,
    post: Pipeline<H>,
}

impl<H> DemoPipelines<H> {
    pub fn build<B>(demo: Demo, backend: &mut B, viewport: Viewport) -> Result<Self, PipelineError>
    where
        B: RenderBackend<Target = H>,
    {
        log::info!("building {demo} demo");
        let post = match demo {
            Demo::Depth => depth_visualize_pipeline(),
            Demo::Outline => outline_pipeline(),
        };
        Ok(Self {
            demo,
            scene: scene_pipeline(demo.scene_material()).build(backend, viewport)?,
            depth_override: depth_override_pipeline().build(backend, viewport)?,
            post: post.build(backend, viewport)?,
        })
    }

    pub fn demo(&self) -> Demo {
        self.demo
    }

    /// The pipeline this frame runs for `settings`.
    pub fn select(&self, settings: &Settings) -> &Pipeline<H> {
        match settings.visualize {
            VisualizeMode::Scene => &self.scene,
            VisualizeMode::DepthOverride => &self.depth_override,
            VisualizeMode::DepthLinearPerspective | VisualizeMode::DepthLinearNdc => &self.post,
        }
    }

    pub fn execute<B>(&self, backend: &mut B, ctx: &FrameContext)
    where
        B: RenderBackend<Target = H>,
    {
        self.select(ctx.settings).execute(backend, ctx);
    }

    /// Forwards a viewport change to every pipeline, selected or not.
    pub fn on_viewport_change<B>(&mut self, backend: &mut B, viewport: Viewport)
    where
        B: RenderBackend<Target = H>,
    {
        for pipeline in [&mut self.scene, &mut self.depth_override, &mut self.post] {
            pipeline.on_viewport_change(backend, viewport);
        }
    }

    pub fn on_viewport_resize<B>(&mut self, backend: &mut B, width: u32, height: u32)
    where
        B: RenderBackend<Target = H>,
    {
        for pipeline in [&mut self.scene, &mut self.depth_override, &mut self.post] {
            pipeline.on_viewport_resize(backend, width, height);
        }
    }

    pub fn destroy<B>(self, backend: &mut B)
    where
        B: RenderBackend<Target = H>,
    {
        self.scene.destroy(backend);
        self.depth_override.destroy(backend);
        self.post.destroy(backend);
    }
}

impl<B: RenderBackend> ViewportListener<B> for DemoPipelines<B::Target> {
    fn viewport_changed(&mut self, backend: &mut B, viewport: Viewport) {
        self.on_viewport_change(backend, viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::clock::FrameTime;
    use crate::render_graph::testing::{MockTarget, RecordingBackend};
    use crate::render_graph::{Capabilities, PassId, PassKind, ProgramId, TargetId};

    fn build(demo: Demo, backend: &mut RecordingBackend) -> DemoPipelines<MockTarget> {
        DemoPipelines::build(demo, backend, Viewport::new(640, 480, 1.0)).unwrap()
    }

    fn run(
        demo: &DemoPipelines<MockTarget>,
        backend: &mut RecordingBackend,
        camera: &Camera,
        settings: &Settings,
    ) {
        let ctx = FrameContext::new(camera, settings, FrameTime::zero());
        demo.execute(backend, &ctx);
    }

    fn drawn_kinds(
        demo: &DemoPipelines<MockTarget>,
        backend: &mut RecordingBackend,
        mode: VisualizeMode,
    ) -> Vec<PassKind> {
        backend.take_ops();
        let settings = demo.demo().default_settings().with_visualize(mode);
        run(demo, backend, &Camera::default(), &settings);
        backend.draws().iter().map(|draw| draw.kind).collect()
    }

    #[test]
    fn depth_demo_switches_pipeline_with_the_visualize_mode() {
        let mut backend = RecordingBackend::new();
        let demo = build(Demo::Depth, &mut backend);

        let expectations = [
            (
                VisualizeMode::Scene,
                vec![PassKind::SceneDraw {
                    material: SceneMaterial::Lit,
                }],
            ),
            (
                VisualizeMode::DepthOverride,
                vec![PassKind::SceneDraw {
                    material: SceneMaterial::DepthOverride,
                }],
            ),
            (
                VisualizeMode::DepthLinearPerspective,
                vec![
                    PassKind::SceneDraw {
                        material: SceneMaterial::Lit,
                    },
                    PassKind::FullscreenQuad {
                        program: ProgramId("depth_visualize"),
                    },
                ],
            ),
        ];

        for (mode, kinds) in expectations {
            assert_eq!(drawn_kinds(&demo, &mut backend, mode), kinds, "{mode}");
        }
    }

    #[test]
    fn outline_demo_switches_pipeline_with_the_visualize_mode() {
        let mut backend = RecordingBackend::new();
        let demo = build(Demo::Outline, &mut backend);

        assert_eq!(
            drawn_kinds(&demo, &mut backend, VisualizeMode::Scene),
            vec![PassKind::SceneDraw {
                material: SceneMaterial::Gooch,
            }]
        );
        assert_eq!(
            drawn_kinds(&demo, &mut backend, VisualizeMode::DepthOverride),
            vec![PassKind::SceneDraw {
                material: SceneMaterial::DepthOverride,
            }]
        );
        for mode in [
            VisualizeMode::DepthLinearPerspective,
            VisualizeMode::DepthLinearNdc,
        ] {
            assert_eq!(drawn_kinds(&demo, &mut backend, mode).len(), 3, "{mode}");
        }
    }

    #[test]
    fn linearization_method_follows_the_mode() {
        let camera = Camera::default().with_clip(0.1, 25.0);

        let quads = [
            (Demo::Depth, PassId("visualize")),
            (Demo::Outline, PassId("outline")),
        ];
        for (demo, pass) in quads {
            let mut backend = RecordingBackend::new();
            let pipelines = build(demo, &mut backend);

            for (mode, method) in [
                (VisualizeMode::DepthLinearPerspective, 2.0),
                (VisualizeMode::DepthLinearNdc, 3.0),
            ] {
                backend.take_ops();
                let settings = Settings::default().with_visualize(mode);
                run(&pipelines, &mut backend, &camera, &settings);
                let draws = backend.draws();
                let quad = draws.iter().find(|draw| draw.pass == pass).unwrap();
                assert_eq!(
                    quad.scalars,
                    vec![
                        (UniformName::CameraNear, 0.1),
                        (UniformName::CameraFar, 25.0),
                        (UniformName::LinearizationMethod, method),
                    ],
                    "{demo} {mode}"
                );
            }
        }
    }

    #[test]
    fn resize_reaches_every_pipeline() {
        for demo in [Demo::Depth, Demo::Outline] {
            let mut backend = RecordingBackend::new();
            let mut pipelines = build(demo, &mut backend);

            pipelines.on_viewport_resize(&mut backend, 1024, 768);

            assert_eq!(pipelines.post.target_size("scene"), Some((1024, 768)));
            for pipeline in [&pipelines.scene, &pipelines.depth_override, &pipelines.post] {
                assert_eq!(pipeline.viewport(), Viewport::new(1024, 768, 1.0));
            }
        }
    }

    #[test]
    fn outline_demo_wires_three_passes() {
        let mut backend = RecordingBackend::new();
        let demo = build(Demo::Outline, &mut backend);
        backend.take_ops();

        let settings = Demo::Outline.default_settings().with_blend(0.75);
        run(&demo, &mut backend, &Camera::default(), &settings);

        let draws = backend.draws();
        let passes: Vec<_> = draws.iter().map(|draw| draw.pass).collect();
        assert_eq!(
            passes,
            vec![PassId("scene"), PassId("outline"), PassId("composite")]
        );

        assert_eq!(draws[0].output.map(|(id, _)| id), Some(TargetId("scene")));
        assert_eq!(draws[1].output.map(|(id, _)| id), Some(TargetId("edges")));
        assert_eq!(draws[2].output, None);

        let composite_inputs: Vec<_> = draws[2]
            .textures
            .iter()
            .map(|(uniform, target, _)| (*uniform, *target))
            .collect();
        assert_eq!(
            composite_inputs,
            vec![
                (UniformName::SceneColor, TargetId("scene")),
                (UniformName::EdgeMask, TargetId("edges")),
            ]
        );
        assert_eq!(draws[2].scalars, vec![(UniformName::Blend, 0.75)]);
    }

    #[test]
    fn outline_demo_falls_back_without_depth_sampling() {
        let mut backend = RecordingBackend::new().with_capabilities(Capabilities {
            depth_texture_sampling: false,
            stencil_buffer: true,
        });
        let demo = build(Demo::Outline, &mut backend);
        let settings = Demo::Outline.default_settings();
        assert!(demo.select(&settings).is_degraded());
        assert_eq!(backend.allocations(), 0);

        run(&demo, &mut backend, &Camera::default(), &settings);
        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(
            draws[0].kind,
            PassKind::SceneDraw {
                material: SceneMaterial::Gooch
            }
        );
        assert_eq!(draws[0].output, None);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut backend = RecordingBackend::new();
        let demo = build(Demo::Outline, &mut backend);
        demo.destroy(&mut backend);
        assert_eq!(backend.allocations(), 2);
        assert_eq!(backend.releases(), 2);
    }

    #[test]
    fn every_demo_pipeline_validates() {
        for builder in [
            lit_scene_pipeline(),
            scene_pipeline(SceneMaterial::Gooch),
            depth_override_pipeline(),
            depth_visualize_pipeline(),
            outline_pipeline(),
        ] {
            assert_eq!(builder.validate(), Ok(()));
        }
    }

    #[test]
    fn outline_opens_on_perspective_linearization() {
        assert_eq!(Demo::Depth.default_settings().visualize, VisualizeMode::Scene);
        assert_eq!(
            Demo::Outline.default_settings().visualize,
            VisualizeMode::DepthLinearPerspective
        );
    }
}
