use std::process::ExitCode;

use clap::Parser;

use strata::{AppConfig, Demo, LoggingConfig, OrbitMode, Settings, VisualizeMode, init_logging};

/// Multi-pass depth and outline demos.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about)]
struct Args {
    /// Which demo to run
    #[arg(long, value_enum, default_value_t = Demo::Depth)]
    demo: Demo,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Initial visualize mode (defaults to the demo's own)
    #[arg(long, value_enum)]
    visualize: Option<VisualizeMode>,

    /// Initial camera far plane
    #[arg(long)]
    far: Option<f32>,

    /// Initial outline blend in [0, 1]
    #[arg(long)]
    param: Option<f32>,

    /// Orbit automatically at this many radians per second
    #[arg(long)]
    auto_rotate: Option<f32>,

    /// Seed for the scene layout
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Act as if depth textures cannot be sampled
    #[arg(long)]
    force_degraded: bool,

    /// Log filter in env_logger syntax, e.g. "strata=debug"
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = self.demo.default_settings();
        if let Some(mode) = self.visualize {
            settings = settings.with_visualize(mode);
        }
        if let Some(far) = self.far {
            settings = settings.with_camera_far(far);
        }
        if let Some(blend) = self.param {
            settings = settings.with_blend(blend);
        }
        settings
    }

    fn config(&self) -> AppConfig {
        let orbit = match self.auto_rotate {
            Some(speed) => OrbitMode::AutoRotate { speed },
            None => OrbitMode::Interactive,
        };

        AppConfig::new()
            .title(format!("Strata - {} demo", self.demo))
            .size(self.width, self.height)
            .demo(self.demo)
            .settings(self.settings())
            .orbit(orbit)
            .scene_seed(self.seed)
            .force_degraded(self.force_degraded)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(LoggingConfig::with_filter(args.log.clone()));

    match strata::run(args.config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
