//! The winit host: window, GPU setup and the frame loop.
//!
//! [`run`] drives a small state machine. The app starts `Pending` with its
//! [`AppConfig`], builds the window, backend and demo pipelines on the first `resumed`
//! event, and then redraws continuously. Each frame ticks the clock, moves the orbit
//! camera, applies keyboard settings and executes the selected pipeline. Window resizes
//! and scale-factor changes reach every pipeline between frames.
//!
//! ```no_run
//! use strata::{AppConfig, Demo, OrbitMode, Settings, VisualizeMode};
//!
//! let config = AppConfig::new()
//!     .demo(Demo::Depth)
//!     .settings(Settings::default().with_visualize(VisualizeMode::DepthLinearNdc))
//!     .orbit(OrbitMode::AutoRotate { speed: 0.3 });
//! strata::run(config)?;
//! # Ok::<(), strata::AppError>(())
//! ```

use std::sync::Arc;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::clock::FrameClock;
use crate::demos::{Demo, DemoPipelines};
use crate::error::AppError;
use crate::geometry::SceneContent;
use crate::gpu::GpuContext;
use crate::gpu_backend::{GpuTarget, WgpuBackend};
use crate::input::Input;
use crate::orbit_camera::{OrbitCamera, OrbitMode};
use crate::render_graph::FrameContext;
use crate::settings::Settings;
use crate::viewport::{Viewport, ViewportListener};

/// Configuration for the app window and the demo it runs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width in logical pixels.
    pub width: u32,
    /// Initial window height in logical pixels.
    pub height: u32,
    /// Which demo to build.
    pub demo: Demo,
    /// Starting settings; `None` uses the demo's own defaults.
    pub settings: Option<Settings>,
    /// Pretend depth texture sampling is unsupported.
    pub force_degraded: bool,
    /// How the camera orbits the scene.
    pub orbit: OrbitMode,
    /// Seed for the torus-knot layout.
    pub scene_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Strata".to_string(),
            width: 1280,
            height: 720,
            demo: Demo::default(),
            settings: None,
            force_degraded: false,
            orbit: OrbitMode::default(),
            scene_seed: 1,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn demo(mut self, demo: Demo) -> Self {
        self.demo = demo;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn force_degraded(mut self, force: bool) -> Self {
        self.force_degraded = force;
        self
    }

    pub fn orbit(mut self, mode: OrbitMode) -> Self {
        self.orbit = mode;
        self
    }

    pub fn scene_seed(mut self, seed: u64) -> Self {
        self.scene_seed = seed;
        self
    }

    fn initial_settings(&self) -> Settings {
        self.settings.unwrap_or_else(|| self.demo.default_settings())
    }
}

/// Opens a window and runs the configured demo until it is closed.
///
/// # Example
/// ```no_run
/// use strata::{AppConfig, Demo};
///
/// strata::run(AppConfig::new().title("Outlines").demo(Demo::Outline))?;
/// # Ok::<(), strata::AppError>(())
/// ```
pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = StrataApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        StrataApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

const SCENE_INSTANCES: usize = 50;
const SCENE_RADIUS: f32 = 5.0;

enum StrataApp {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Failed(AppError),
    Exited,
}

struct Running {
    window: Arc<Window>,
    backend: WgpuBackend,
    demo: DemoPipelines<GpuTarget>,
    camera: Camera,
    orbit: OrbitCamera,
    input: Input,
    settings: Settings,
    clock: FrameClock,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let scene = SceneContent::torus_knots(SCENE_INSTANCES, SCENE_RADIUS, config.scene_seed);
        let mut backend = WgpuBackend::new(gpu, &scene).force_degraded(config.force_degraded);

        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        let settings = config.initial_settings();

        let mut camera = Camera::default().with_clip(0.1, settings.camera_far);
        camera.set_aspect(viewport.aspect());
        let orbit = OrbitCamera::looking_from(camera.position, Vec3::ZERO).mode(config.orbit);

        let demo = DemoPipelines::build(config.demo, &mut backend, viewport)?;
        log::info!(
            "controls: 1-4 visualize mode, up/down far plane, left/right blend, \
             drag to orbit, esc to quit"
        );

        Ok(Self {
            window,
            backend,
            demo,
            camera,
            orbit,
            input: Input::new(),
            settings,
            clock: FrameClock::new(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize_surface(width, height);

        let viewport = Viewport::from_physical(width, height, self.window.scale_factor());
        self.camera.set_aspect(viewport.aspect());
        self.demo.viewport_changed(&mut self.backend, viewport);
    }

    fn redraw(&mut self) {
        let time = self.clock.tick();

        self.orbit.update(&self.input, time.dt);
        self.orbit.apply(&mut self.camera);
        self.settings.handle_input(&self.input);
        self.camera.set_far(self.settings.camera_far);

        let ctx = FrameContext::new(&self.camera, &self.settings, time);
        self.demo.execute(&mut self.backend, &ctx);

        self.input.begin_frame();
    }

    fn shutdown(self) {
        let Self {
            mut backend, demo, ..
        } = self;
        demo.destroy(&mut backend);
    }
}

impl ApplicationHandler for StrataApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let StrataApp::Pending { config } = self else {
            return;
        };

        match Running::new(event_loop, config) {
            Ok(running) => {
                running.window.request_redraw();
                *self = StrataApp::Running(Box::new(running));
            }
            Err(err) => {
                *self = StrataApp::Failed(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let StrataApp::Running(app) = self else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => app.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = app.window.inner_size();
                app.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if app.input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                app.redraw();
                app.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if matches!(self, StrataApp::Running(_)) {
            if let StrataApp::Running(app) = std::mem::replace(self, StrataApp::Exited) {
                let app = *app;
                app.shutdown();
            }
        }
    }
}
