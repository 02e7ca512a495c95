mod cli;
mod terminal;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use glyphcast_engine::device::{ComputeDevice, DeviceInit};
use glyphcast_engine::logging::init_logging;
use glyphcast_engine::mesh::{load_obj_file, parse_obj, Mesh};
use glyphcast_engine::render::{
    CpuBackend, GpuBackend, RenderBackend, RenderConfig, RenderLoop, TickOutcome,
};

use crate::cli::{BackendChoice, Cli};
use crate::terminal::TerminalPresenter;

const BUNDLED_CUBE: &str = include_str!("../assets/cube.obj");

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config());

    let config = cli.render_config();
    config.validate().context("invalid render options")?;

    let mesh = Arc::new(load_mesh(&cli)?);
    let backend = select_backend(cli.backend, &config, mesh)?;
    let mut render_loop = RenderLoop::new(config, backend)?;

    let stop = render_loop.stop_handle();
    let mut presenter = TerminalPresenter::new(std::io::stdout().lock());
    let mut presented = 0u64;

    loop {
        match render_loop.tick(Instant::now(), &mut presenter)? {
            TickOutcome::Presented { .. } => {
                presented += 1;
                if cli.frames.is_some_and(|limit| presented >= limit) {
                    stop.stop();
                }
            }
            TickOutcome::Stopped => break,
            TickOutcome::Skipped | TickOutcome::Dropped => {}
        }
        std::thread::sleep(render_loop.gate().remaining(Instant::now()));
    }

    presenter.finish()?;
    log::info!("stopped after {presented} frames");
    Ok(())
}

fn load_mesh(cli: &Cli) -> anyhow::Result<Mesh> {
    let mesh = match &cli.mesh {
        Some(path) => load_obj_file(path)
            .with_context(|| format!("loading mesh {}", path.display()))?,
        None => parse_obj(BUNDLED_CUBE).context("parsing bundled cube")?,
    };
    if mesh.is_degenerate() {
        bail!("mesh has no triangles");
    }
    log::info!(
        "mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn select_backend(
    choice: BackendChoice,
    config: &RenderConfig,
    mesh: Arc<Mesh>,
) -> anyhow::Result<Box<dyn RenderBackend>> {
    let cpu = |mesh: Arc<Mesh>| -> Box<dyn RenderBackend> {
        Box::new(CpuBackend::new(mesh, config.rasterizer()))
    };

    if choice == BackendChoice::Cpu {
        return Ok(cpu(mesh));
    }

    let gpu = ComputeDevice::request_blocking(DeviceInit::default())
        .and_then(|device| GpuBackend::new(&device, mesh.clone(), config.rasterizer()));

    match (gpu, choice) {
        (Ok(backend), _) => Ok(Box::new(backend)),
        (Err(e), BackendChoice::Auto) => {
            log::warn!("{e}; falling back to the cpu backend");
            Ok(cpu(mesh))
        }
        (Err(e), _) => Err(e).context("gpu backend requested"),
    }
}
