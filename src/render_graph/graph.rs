//! The pipeline and its builder.

use crate::camera::Camera;
use crate::error::{AllocationError, PipelineError};
use crate::render_graph::backend::{Capability, DrawCall, DrawOutput, RenderBackend};
use crate::render_graph::bindings::{self, Channel, ResolvedBindings};
use crate::render_graph::context::FrameContext;
use crate::render_graph::pass::{Output, Pass, PassCamera};
use crate::render_graph::render_target::{RenderTarget, TargetId, TargetOptions, TargetTable};
use crate::viewport::{Viewport, ViewportListener};

/// Builder for a [`Pipeline`].
///
/// Targets and passes are declared up front. Nothing touches the backend until
/// [`build`](Self::build), which validates the whole declaration first.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::builder()
///     .target("scene", TargetOptions::color(FilterMode::Nearest).with_depth_stencil())
///     .pass(Pass::scene("scene", SceneMaterial::Lit).into_target("scene"))
///     .pass(
///         Pass::fullscreen("visualize", "depth_visualize")
///             .color(UniformName::SceneColor, "scene")
///             .depth(UniformName::SceneDepth, "scene")
///             .scalar(UniformName::CameraFar, ScalarSource::CameraFar),
///     )
///     .build(&mut backend, viewport)?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    targets: Vec<(TargetId, TargetOptions)>,
    passes: Vec<Pass>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an owned render target.
    pub fn target(mut self, id: &'static str, options: TargetOptions) -> Self {
        self.targets.push((TargetId(id), options));
        self
    }

    /// Appends a pass. Passes run in the order they are added.
    pub fn pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    /// Checks the declaration without allocating anything.
    ///
    /// Every input must name a declared target written by an *earlier* pass, so the
    /// pass order alone guarantees nothing is sampled before it is drawn this frame.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.passes.is_empty() {
            return Err(PipelineError::Empty);
        }

        for (i, (id, _)) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|(other, _)| other == id) {
                return Err(PipelineError::DuplicateTarget(*id));
            }
        }

        for (i, pass) in self.passes.iter().enumerate() {
            if self.passes[..i].iter().any(|other| other.id == pass.id) {
                return Err(PipelineError::DuplicatePass(pass.id));
            }
        }

        if !self.passes.iter().any(Pass::is_scene) {
            return Err(PipelineError::NoScenePass);
        }

        let mut written: Vec<TargetId> = Vec::new();
        for pass in &self.passes {
            bindings::validate(pass)?;

            if pass.is_scene() && !pass.inputs.is_empty() {
                return Err(PipelineError::SceneInputs(pass.id));
            }

            let output = pass.output_target();
            if let Some(target) = output {
                if self.options(target).is_none() {
                    return Err(PipelineError::UnknownTarget {
                        pass: pass.id,
                        target,
                    });
                }
            }

            for input in &pass.inputs {
                let options =
                    self.options(input.source)
                        .ok_or(PipelineError::UnknownTarget {
                            pass: pass.id,
                            target: input.source,
                        })?;
                if output == Some(input.source) {
                    return Err(PipelineError::ReadsOwnOutput {
                        pass: pass.id,
                        target: input.source,
                    });
                }
                if !written.contains(&input.source) {
                    return Err(PipelineError::ForwardReference {
                        pass: pass.id,
                        target: input.source,
                    });
                }
                if input.channel == Channel::Depth && !options.needs_depth {
                    return Err(PipelineError::NoDepthBuffer {
                        pass: pass.id,
                        target: input.source,
                    });
                }
            }

            if let Some(target) = output {
                written.push(target);
            }
        }

        Ok(())
    }

    /// Capabilities the declared pipeline cannot run without.
    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut required = Vec::new();
        let samples_depth = self
            .passes
            .iter()
            .flat_map(|pass| pass.inputs.iter())
            .any(|input| input.channel == Channel::Depth);
        if samples_depth {
            required.push(Capability::DepthTextureSampling);
        }
        if self.targets.iter().any(|(_, options)| options.needs_stencil) {
            required.push(Capability::StencilBuffer);
        }
        required
    }

    /// Validates, checks capabilities and allocates every target at the viewport's
    /// pixel size.
    ///
    /// A missing capability or a failed allocation does not fail the build: the
    /// pipeline comes back [degraded](PipelineState::Degraded) and draws its first
    /// scene pass straight to the screen. Only declaration errors are returned.
    pub fn build<B: RenderBackend>(
        self,
        backend: &mut B,
        viewport: Viewport,
    ) -> Result<Pipeline<B::Target>, PipelineError> {
        self.validate()?;

        let required = self.required_capabilities();
        let fallback = self.passes.iter().position(Pass::is_scene).unwrap_or(0);

        let mut pipeline = Pipeline {
            declared: self.targets,
            passes: self.passes,
            targets: TargetTable::new(),
            viewport,
            state: PipelineState::Ready,
            fallback,
            post_camera: Camera::fullscreen(),
        };

        let capabilities = backend.capabilities();
        if let Some(missing) = required.into_iter().find(|c| !capabilities.supports(*c)) {
            log::warn!("{missing} is not supported, post-processing disabled");
            pipeline.state = PipelineState::Degraded(DegradedReason::CapabilityMissing(missing));
            return Ok(pipeline);
        }

        let (width, height) = viewport.physical_size();
        match pipeline.allocate_all(backend, width, height) {
            Ok(targets) => {
                pipeline.targets.replace(targets);
            }
            Err(err) => {
                log::warn!("{err}, post-processing disabled until the next resize");
                pipeline.state = PipelineState::Degraded(DegradedReason::Allocation);
            }
        }

        log::info!(
            "pipeline built: {} passes, {} targets at {}x{}",
            pipeline.passes.len(),
            pipeline.declared.len(),
            width,
            height
        );
        Ok(pipeline)
    }

    fn options(&self, id: TargetId) -> Option<&TargetOptions> {
        self.targets
            .iter()
            .find(|(target, _)| *target == id)
            .map(|(_, options)| options)
    }
}

/// Why a pipeline is running its fallback path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegradedReason {
    /// Detected at setup; permanent for this pipeline.
    CapabilityMissing(Capability),
    /// Targets could not be allocated at setup; retried on the next resize.
    Allocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    Degraded(DegradedReason),
}

/// An ordered list of passes plus the render targets they exchange pixels through.
///
/// `Pipeline` owns its target table exclusively. Every frame, [`execute`](Self::execute)
/// runs each pass in declaration order, resolving bindings against whatever handles the
/// table holds at that moment. On a viewport change every target is reallocated at the
/// new pixel size; pass declarations and their wiring never change.
///
/// # Buffer lifecycle
///
/// ```text
/// build ──► allocate all (declaration order)
/// resize ─► allocate all at new size ─► release all old
///              │ any failure
///              └──► release the new ones, keep the stale ones
/// ```
pub struct Pipeline<H> {
    declared: Vec<(TargetId, TargetOptions)>,
    passes: Vec<Pass>,
    targets: TargetTable<H>,
    viewport: Viewport,
    state: PipelineState,
    /// Index of the scene pass used when degraded.
    fallback: usize,
    post_camera: Camera,
}

impl<H> Pipeline<H> {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Renders one frame: every pass in order, or only the fallback scene pass when
    /// degraded.
    ///
    /// A frame the backend cannot begin is skipped with a warning; the loop carries on.
    pub fn execute<B>(&self, backend: &mut B, ctx: &FrameContext)
    where
        B: RenderBackend<Target = H>,
    {
        if let Err(err) = backend.begin_frame() {
            log::warn!("skipping frame {}: {err}", ctx.time.frame_index);
            return;
        }

        match self.state {
            PipelineState::Ready => {
                for pass in &self.passes {
                    self.run_pass(backend, pass, ctx);
                }
            }
            PipelineState::Degraded(_) => self.run_fallback(backend, ctx),
        }

        backend.end_frame();
    }

    /// Reallocates every owned target for a new drawable size, keeping the current
    /// pixel density.
    pub fn on_viewport_resize<B>(&mut self, backend: &mut B, width: u32, height: u32)
    where
        B: RenderBackend<Target = H>,
    {
        let viewport = Viewport::new(width, height, self.viewport.pixel_density);
        self.on_viewport_change(backend, viewport);
    }

    /// Reallocates every owned target at `viewport`'s pixel size.
    ///
    /// Zero-sized viewports (a minimised window) are ignored. Reallocation happens even
    /// when the size is unchanged, and contents are never carried over.
    pub fn on_viewport_change<B>(&mut self, backend: &mut B, viewport: Viewport)
    where
        B: RenderBackend<Target = H>,
    {
        if !viewport.is_valid() {
            log::debug!("ignoring empty viewport {viewport:?}");
            return;
        }
        self.viewport = viewport;

        if let PipelineState::Degraded(DegradedReason::CapabilityMissing(_)) = self.state {
            return;
        }

        let (width, height) = viewport.physical_size();
        match self.allocate_all(backend, width, height) {
            Ok(fresh) => {
                for stale in self.targets.replace(fresh) {
                    stale.destroy(backend);
                }
                if self.state != PipelineState::Ready {
                    log::info!("render targets allocated, post-processing restored");
                    self.state = PipelineState::Ready;
                }
                log::debug!("render targets resized to {width}x{height}");
            }
            Err(err) => {
                log::warn!("{err}, keeping previous render targets");
            }
        }
    }

    /// Releases every owned target back to the backend.
    pub fn destroy<B>(mut self, backend: &mut B)
    where
        B: RenderBackend<Target = H>,
    {
        for target in self.targets.drain() {
            target.destroy(backend);
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.state, PipelineState::Degraded(_))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn targets(&self) -> &TargetTable<H> {
        &self.targets
    }

    /// Pixel size of an owned target, if it is currently allocated.
    pub fn target_size(&self, id: &'static str) -> Option<(u32, u32)> {
        self.targets.get(TargetId(id)).map(RenderTarget::size)
    }

    /// Allocates a full replacement table in declaration order. On failure anything
    /// allocated so far is released again.
    fn allocate_all<B>(
        &self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<Vec<RenderTarget<H>>, AllocationError>
    where
        B: RenderBackend<Target = H>,
    {
        let mut fresh = Vec::with_capacity(self.declared.len());
        for &(id, options) in &self.declared {
            match RenderTarget::create(backend, id, width, height, options) {
                Ok(target) => fresh.push(target),
                Err(err) => {
                    for target in fresh {
                        target.destroy(backend);
                    }
                    return Err(err);
                }
            }
        }
        Ok(fresh)
    }

    fn run_pass<B>(&self, backend: &mut B, pass: &Pass, ctx: &FrameContext)
    where
        B: RenderBackend<Target = H>,
    {
        let bindings = match bindings::resolve(pass, &self.targets, ctx) {
            Ok(bindings) => bindings,
            Err(err) => {
                log::error!("{err}");
                return;
            }
        };

        let output = match pass.output {
            Output::Screen => DrawOutput::Screen,
            Output::Target(id) => match self.targets.get(id) {
                Some(target) => DrawOutput::Target(target.handle()),
                None => {
                    log::error!("pass `{}` writes unallocated target `{id}`", pass.id);
                    return;
                }
            },
        };

        let camera = match pass.camera {
            PassCamera::Scene => ctx.camera,
            PassCamera::Fullscreen => &self.post_camera,
        };

        backend.draw(&DrawCall {
            pass: pass.id,
            kind: pass.kind,
            camera,
            output,
            clear: pass.clear,
            bindings: &bindings,
        });
    }

    fn run_fallback<B>(&self, backend: &mut B, ctx: &FrameContext)
    where
        B: RenderBackend<Target = H>,
    {
        let pass = &self.passes[self.fallback];
        let bindings = ResolvedBindings::empty();
        backend.draw(&DrawCall {
            pass: pass.id,
            kind: pass.kind,
            camera: ctx.camera,
            output: DrawOutput::Screen,
            clear: pass.clear.or(Some([0.0, 0.0, 0.0, 1.0])),
            bindings: &bindings,
        });
    }
}

impl<B: RenderBackend> ViewportListener<B> for Pipeline<B::Target> {
    fn viewport_changed(&mut self, backend: &mut B, viewport: Viewport) {
        self.on_viewport_change(backend, viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameTime;
    use crate::render_graph::backend::Capabilities;
    use crate::render_graph::bindings::{ScalarSource, UniformName};
    use crate::render_graph::pass::{PassId, PassKind, SceneMaterial};
    use crate::render_graph::render_target::FilterMode;
    use crate::render_graph::testing::{MockTarget, Op, RecordingBackend};
    use crate::settings::Settings;

    /// scene+depth -> outline -> composite, all offscreen.
    fn outline_chain() -> PipelineBuilder {
        Pipeline::<MockTarget>::builder()
            .target("scene", TargetOptions::color(FilterMode::Linear).with_depth_stencil())
            .target("edges", TargetOptions::lookup())
            .target("composite", TargetOptions::color(FilterMode::Linear))
            .pass(Pass::scene("scene", SceneMaterial::Gooch).into_target("scene"))
            .pass(
                Pass::fullscreen("outline", "outline")
                    .depth(UniformName::SceneDepth, "scene")
                    .scalar(UniformName::CameraNear, ScalarSource::CameraNear)
                    .scalar(UniformName::CameraFar, ScalarSource::CameraFar)
                    .into_target("edges"),
            )
            .pass(
                Pass::fullscreen("composite", "composite")
                    .color(UniformName::SceneColor, "scene")
                    .color(UniformName::EdgeMask, "edges")
                    .scalar(UniformName::Blend, ScalarSource::Blend)
                    .into_target("composite"),
            )
    }

    fn run_frame(
        pipeline: &Pipeline<MockTarget>,
        backend: &mut RecordingBackend,
        camera: &Camera,
        settings: &Settings,
    ) {
        let ctx = FrameContext::new(camera, settings, FrameTime::zero());
        pipeline.execute(backend, &ctx);
    }

    fn run_default_frame(pipeline: &Pipeline<MockTarget>, backend: &mut RecordingBackend) {
        run_frame(pipeline, backend, &Camera::default(), &Settings::default());
    }

    fn pass_order(backend: &RecordingBackend) -> Vec<PassId> {
        backend.draws().iter().map(|draw| draw.pass).collect()
    }

    #[test]
    fn resize_reallocates_every_target_and_keeps_pass_order() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        for id in ["scene", "edges", "composite"] {
            assert_eq!(pipeline.target_size(id), Some((800, 600)));
        }

        pipeline.on_viewport_resize(&mut backend, 1600, 1200);
        for id in ["scene", "edges", "composite"] {
            assert_eq!(pipeline.target_size(id), Some((1600, 1200)));
        }

        backend.take_ops();
        run_default_frame(&pipeline, &mut backend);

        assert_eq!(
            pass_order(&backend),
            vec![PassId("scene"), PassId("outline"), PassId("composite")]
        );
    }

    #[test]
    fn targets_follow_pixel_density() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 2.0))
            .unwrap();
        assert_eq!(pipeline.target_size("scene"), Some((1600, 1200)));

        for (w, h) in [(1024, 768), (300, 200), (1280, 720)] {
            pipeline.on_viewport_resize(&mut backend, w, h);
        }
        for target in pipeline.targets().iter() {
            assert_eq!(target.size(), (2560, 1440));
        }

        pipeline.on_viewport_change(&mut backend, Viewport::new(1280, 720, 1.5));
        for target in pipeline.targets().iter() {
            assert_eq!(target.size(), (1920, 1080));
        }
    }

    #[test]
    fn targets_match_the_window_at_fractional_scale() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::from_physical(1001, 601, 1.5))
            .unwrap();
        assert_eq!(pipeline.target_size("scene"), Some((1001, 601)));

        pipeline.on_viewport_change(&mut backend, Viewport::from_physical(1367, 769, 1.25));
        for target in pipeline.targets().iter() {
            assert_eq!(target.size(), (1367, 769));
        }
    }

    #[test]
    fn resize_allocates_new_before_releasing_old_in_declaration_order() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        backend.take_ops();

        pipeline.on_viewport_resize(&mut backend, 1024, 768);

        let ops = backend.take_ops();
        let kinds: Vec<_> = ops
            .iter()
            .map(|op| match op {
                Op::Allocate { target, .. } => ("alloc", *target),
                Op::Release { target, .. } => ("release", *target),
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("alloc", TargetId("scene")),
                ("alloc", TargetId("edges")),
                ("alloc", TargetId("composite")),
                ("release", TargetId("scene")),
                ("release", TargetId("edges")),
                ("release", TargetId("composite")),
            ]
        );
    }

    #[test]
    fn same_size_resize_still_reallocates() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        let passes_before = pipeline.passes().to_vec();

        pipeline.on_viewport_resize(&mut backend, 800, 600);
        let first: Vec<u64> = pipeline.targets().iter().map(|t| t.handle().serial).collect();
        pipeline.on_viewport_resize(&mut backend, 800, 600);
        let second: Vec<u64> = pipeline.targets().iter().map(|t| t.handle().serial).collect();

        assert_eq!(backend.allocations(), 9);
        assert_eq!(backend.releases(), 6);
        assert!(first.iter().zip(&second).all(|(a, b)| a != b));
        assert_eq!(pipeline.passes(), passes_before.as_slice());
    }

    #[test]
    fn bindings_pick_up_new_handles_after_resize() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        pipeline.on_viewport_resize(&mut backend, 640, 480);
        let scene_serial = pipeline.targets().get(TargetId("scene")).unwrap().handle().serial;
        backend.take_ops();

        run_default_frame(&pipeline, &mut backend);

        let draws = backend.draws();
        assert_eq!(draws[0].output, Some((TargetId("scene"), scene_serial)));
        assert_eq!(
            draws[2].textures[0],
            (UniformName::SceneColor, TargetId("scene"), scene_serial)
        );
    }

    #[test]
    fn execution_is_deterministic() {
        let mut backend = RecordingBackend::new();
        let pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        backend.take_ops();
        run_default_frame(&pipeline, &mut backend);
        let first = backend.take_ops();
        run_default_frame(&pipeline, &mut backend);
        let second = backend.take_ops();

        assert_eq!(first, second);
        assert_eq!(first.first(), Some(&Op::BeginFrame));
        assert_eq!(first.last(), Some(&Op::EndFrame));
    }

    #[test]
    fn inputs_only_read_targets_written_earlier_this_frame() {
        let mut backend = RecordingBackend::new();
        let pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        backend.take_ops();
        run_default_frame(&pipeline, &mut backend);

        let mut written = Vec::new();
        for draw in backend.draws() {
            for (_, target, _) in &draw.textures {
                assert!(written.contains(target), "{} read before written", target);
            }
            if let Some((target, _)) = draw.output {
                written.push(target);
            }
        }
    }

    #[test]
    fn scalar_uniforms_track_live_settings() {
        let mut backend = RecordingBackend::new();
        let pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();

        let mut camera = Camera::default();
        let mut settings = Settings::default();
        camera.far = 20.0;
        settings.blend = 0.25;
        backend.take_ops();
        run_frame(&pipeline, &mut backend, &camera, &settings);

        let draws = backend.draws();
        assert!(draws[1].scalars.contains(&(UniformName::CameraFar, 20.0)));
        assert_eq!(draws[2].scalars, vec![(UniformName::Blend, 0.25)]);
    }

    #[test]
    fn missing_capability_degrades_to_one_screen_draw() {
        let mut backend = RecordingBackend::new().with_capabilities(Capabilities {
            depth_texture_sampling: false,
            stencil_buffer: true,
        });
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        assert_eq!(
            pipeline.state(),
            PipelineState::Degraded(DegradedReason::CapabilityMissing(
                Capability::DepthTextureSampling
            ))
        );

        pipeline.on_viewport_resize(&mut backend, 1024, 768);
        run_default_frame(&pipeline, &mut backend);

        assert_eq!(backend.allocations(), 0);
        assert_eq!(backend.releases(), 0);
        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].pass, PassId("scene"));
        assert_eq!(
            draws[0].kind,
            PassKind::SceneDraw {
                material: SceneMaterial::Gooch
            }
        );
        assert_eq!(draws[0].output, None);
        assert!(draws[0].textures.is_empty());
    }

    #[test]
    fn setup_allocation_failure_degrades_and_recovers_on_resize() {
        let mut backend = RecordingBackend::new();
        backend.fail_target("edges");
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();

        assert_eq!(
            pipeline.state(),
            PipelineState::Degraded(DegradedReason::Allocation)
        );
        assert!(pipeline.targets().is_empty());
        // the scene target allocated before the failure was handed back
        assert_eq!(backend.allocations(), 1);
        assert_eq!(backend.releases(), 1);

        backend.clear_failures();
        pipeline.on_viewport_resize(&mut backend, 800, 600);
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert_eq!(pipeline.targets().len(), 3);
    }

    #[test]
    fn resize_failure_keeps_stale_targets() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        let before: Vec<u64> = pipeline.targets().iter().map(|t| t.handle().serial).collect();

        backend.fail_target("composite");
        pipeline.on_viewport_resize(&mut backend, 1920, 1080);

        let after: Vec<u64> = pipeline.targets().iter().map(|t| t.handle().serial).collect();
        assert_eq!(before, after);
        assert_eq!(pipeline.target_size("scene"), Some((800, 600)));
        assert_eq!(pipeline.state(), PipelineState::Ready);

        backend.clear_failures();
        pipeline.on_viewport_resize(&mut backend, 1920, 1080);
        assert_eq!(pipeline.target_size("composite"), Some((1920, 1080)));
    }

    #[test]
    fn zero_sized_viewport_is_ignored() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        backend.take_ops();

        pipeline.on_viewport_resize(&mut backend, 0, 600);

        assert!(backend.ops().is_empty());
        assert_eq!(pipeline.viewport(), Viewport::new(800, 600, 1.0));
    }

    #[test]
    fn skipped_frame_issues_no_draws() {
        let mut backend = RecordingBackend::new();
        let pipeline = outline_chain()
            .build(&mut backend, Viewport::new(800, 600, 1.0))
            .unwrap();
        backend.take_ops();
        backend.skip_frames(true);

        run_default_frame(&pipeline, &mut backend);

        assert!(backend.ops().is_empty());
    }

    #[test]
    fn rejects_forward_references() {
        let result = Pipeline::<MockTarget>::builder()
            .target("scene", TargetOptions::color(FilterMode::Linear).with_depth())
            .pass(
                Pass::fullscreen("post", "depth_visualize")
                    .depth(UniformName::SceneDepth, "scene"),
            )
            .pass(Pass::scene("scene", SceneMaterial::Lit).into_target("scene"))
            .validate();

        assert_eq!(
            result,
            Err(PipelineError::ForwardReference {
                pass: PassId("post"),
                target: TargetId("scene"),
            })
        );
    }

    #[test]
    fn rejects_bad_declarations() {
        let base = || {
            Pipeline::<MockTarget>::builder()
                .target("scene", TargetOptions::color(FilterMode::Linear))
                .pass(Pass::scene("scene", SceneMaterial::Lit).into_target("scene"))
        };

        assert_eq!(
            Pipeline::<MockTarget>::builder().validate(),
            Err(PipelineError::Empty)
        );
        assert_eq!(
            Pipeline::<MockTarget>::builder()
                .pass(Pass::fullscreen("post", "composite"))
                .validate(),
            Err(PipelineError::NoScenePass)
        );
        assert_eq!(
            base()
                .target("scene", TargetOptions::lookup())
                .validate(),
            Err(PipelineError::DuplicateTarget(TargetId("scene")))
        );
        assert_eq!(
            base()
                .pass(Pass::fullscreen("post", "x").depth(UniformName::SceneDepth, "scene"))
                .validate(),
            Err(PipelineError::NoDepthBuffer {
                pass: PassId("post"),
                target: TargetId("scene"),
            })
        );
        assert_eq!(
            base()
                .pass(Pass::fullscreen("post", "x").color(UniformName::SceneColor, "nope"))
                .validate(),
            Err(PipelineError::UnknownTarget {
                pass: PassId("post"),
                target: TargetId("nope"),
            })
        );
        assert_eq!(
            base()
                .pass(
                    Pass::fullscreen("post", "x")
                        .color(UniformName::SceneColor, "scene")
                        .into_target("scene")
                )
                .validate(),
            Err(PipelineError::ReadsOwnOutput {
                pass: PassId("post"),
                target: TargetId("scene"),
            })
        );
        assert_eq!(
            base()
                .pass(Pass::scene("scene", SceneMaterial::Lit))
                .validate(),
            Err(PipelineError::DuplicatePass(PassId("scene")))
        );
    }

    #[test]
    fn required_capabilities_follow_declaration() {
        assert_eq!(
            outline_chain().required_capabilities(),
            vec![Capability::DepthTextureSampling, Capability::StencilBuffer]
        );
        let plain = Pipeline::<MockTarget>::builder()
            .pass(Pass::scene("scene", SceneMaterial::Lit));
        assert!(plain.required_capabilities().is_empty());
    }
}
