use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueHint;
use glyphcast_engine::logging::LoggingConfig;
use glyphcast_engine::math::Vec3;
use glyphcast_engine::render::{MotionPolicy, RenderConfig};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum BackendChoice {
    /// Host-only pipeline.
    Cpu,
    /// Compute offload; fails if no device is available.
    Gpu,
    /// Compute offload when a device is available, host otherwise.
    Auto,
}

impl std::fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendChoice::Cpu => f.write_str("cpu"),
            BackendChoice::Gpu => f.write_str("gpu"),
            BackendChoice::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Spin a mesh in the terminal as ASCII art")]
pub struct Cli {
    /// Logging output filters; comma-separated. Falls back to RUST_LOG
    #[arg(short, long, env = "GLYPHCAST_LOG_FILTER")]
    pub log_filter: Option<String>,
    /// Grid width in cells
    #[arg(long, default_value_t = 120)]
    pub width: u32,
    /// Grid height in cells
    #[arg(long, default_value_t = 50)]
    pub height: u32,
    /// Target frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 70.0)]
    pub fov: f32,
    /// Direction towards the light, in view space
    #[arg(long, default_value = "0,0,1", value_parser = parse_vec3, value_name = "X,Y,Z")]
    pub light: Vec3,
    /// Distance from the camera to the mesh centre
    #[arg(long, default_value_t = 5.0)]
    pub distance: f32,
    /// Brightness multiplier before glyph lookup
    #[arg(long, default_value_t = 1.0)]
    pub exposure: f32,
    /// Scale rotation by frame time instead of stepping a fixed angle per frame
    #[arg(long)]
    pub time_scaled: bool,
    /// OBJ file to render; defaults to the bundled cube
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub mesh: Option<PathBuf>,
    /// Which pipeline renders the frames
    #[arg(long, default_value_t = BackendChoice::Auto)]
    pub backend: BackendChoice,
    /// Stop after this many presented frames
    #[arg(long)]
    pub frames: Option<u64>,
    /// Hide the FPS counter
    #[arg(long)]
    pub no_fps: bool,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        self.log_filter
            .clone()
            .map(LoggingConfig::with_filter)
            .unwrap_or_default()
    }

    pub fn render_config(&self) -> RenderConfig {
        let defaults = RenderConfig::default();
        RenderConfig {
            width: self.width,
            height: self.height,
            target_fps: self.fps,
            fov_degrees: self.fov,
            light_direction: self.light,
            position: Vec3::new(0.0, 0.0, -self.distance),
            shade: glyphcast_engine::raster::ShadeParams {
                exposure: self.exposure,
                ..defaults.shade
            },
            motion: if self.time_scaled {
                MotionPolicy::TimeScaled {
                    reference_fps: defaults.target_fps,
                }
            } else {
                MotionPolicy::FixedStep
            },
            show_fps: !self.no_fps,
            ..defaults
        }
    }
}

fn parse_vec3(s: &str) -> Result<Vec3, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let parts = s
        .trim()
        .split(',')
        .map(|p| f32::from_str(p.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected X,Y,Z, got `{s}`").into()),
    }
}
