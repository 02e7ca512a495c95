use std::sync::Arc;

use crate::compute::ComputeEngine;
use crate::device::ComputeDevice;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::raster::{face_brightness, Frame, Rasterizer};
use crate::transform::{ScreenVertex, TransformPipeline, Viewport};

use super::Scene;

/// One way of turning a scene into glyphs.
///
/// Both implementations share the same transform conventions and rasterizer,
/// so for identical inputs they produce the same frame up to float noise.
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Computes screen vertices and per-triangle brightness for `viewport`.
    fn prepare(&mut self, scene: &Scene, viewport: Viewport) -> Result<()>;

    /// Results of the last successful [`RenderBackend::prepare`].
    fn screen_vertices(&self) -> &[Option<ScreenVertex>];
    fn brightness(&self) -> &[f32];

    fn mesh(&self) -> &Mesh;
    fn rasterizer(&self) -> &Rasterizer;

    /// Prepares and rasterizes into `frame`, which the caller has cleared.
    /// Returns the number of triangles that covered at least one cell.
    fn render(&mut self, scene: &Scene, frame: &mut Frame) -> Result<usize> {
        self.prepare(scene, Viewport::new(frame.width(), frame.height()))?;
        Ok(self.rasterizer().draw_mesh(
            frame,
            self.mesh().triangles(),
            self.screen_vertices(),
            self.brightness(),
        ))
    }
}

/// Host-only backend: one transform per vertex, one Lambert term per triangle.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    mesh: Arc<Mesh>,
    rasterizer: Rasterizer,
    screen: Vec<Option<ScreenVertex>>,
    brightness: Vec<f32>,
}

impl CpuBackend {
    pub fn new(mesh: Arc<Mesh>, rasterizer: Rasterizer) -> Self {
        Self {
            screen: Vec::with_capacity(mesh.vertex_count()),
            brightness: Vec::with_capacity(mesh.triangle_count()),
            mesh,
            rasterizer,
        }
    }
}

impl RenderBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn prepare(&mut self, scene: &Scene, viewport: Viewport) -> Result<()> {
        let light = scene.light_direction()?;
        let pipeline = TransformPipeline::new(&scene.pose, &scene.camera, &scene.projection)?;

        let view: Vec<_> = self
            .mesh
            .positions()
            .iter()
            .map(|&p| pipeline.to_view(p))
            .collect();

        self.screen.clear();
        self.screen
            .extend(view.iter().map(|&v| pipeline.view_to_screen(v, viewport)));

        self.brightness.clear();
        self.brightness.extend(
            self.mesh
                .triangles()
                .map(|[a, b, c]| face_brightness(view[a], view[b], view[c], light)),
        );
        Ok(())
    }

    fn screen_vertices(&self) -> &[Option<ScreenVertex>] {
        &self.screen
    }

    fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }
}

/// Compute-offload backend: matrices are built on the host once per frame,
/// vertex transform and lighting run on the device, rasterization stays on
/// the host.
#[derive(Debug)]
pub struct GpuBackend {
    engine: ComputeEngine,
    mesh: Arc<Mesh>,
    rasterizer: Rasterizer,
    screen: Vec<Option<ScreenVertex>>,
    brightness: Vec<f32>,
}

impl GpuBackend {
    /// Compiles the compute program and uploads `mesh`.
    pub fn new(device: &ComputeDevice, mesh: Arc<Mesh>, rasterizer: Rasterizer) -> Result<Self> {
        let mut engine = ComputeEngine::with_default_program(device)?;
        engine.attach_mesh(&mesh)?;
        Ok(Self {
            engine,
            mesh,
            rasterizer,
            screen: Vec::new(),
            brightness: Vec::new(),
        })
    }

    pub fn engine(&self) -> &ComputeEngine {
        &self.engine
    }
}

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn prepare(&mut self, scene: &Scene, viewport: Viewport) -> Result<()> {
        let light = scene.light_direction()?;
        let pipeline = TransformPipeline::new(&scene.pose, &scene.camera, &scene.projection)?;

        self.engine
            .update_uniforms(pipeline.model_view(), pipeline.projection(), viewport, light)?;
        let out = self.engine.run_and_read()?;

        self.screen = out.screen_vertices();
        self.brightness = out.triangle_brightness();
        Ok(())
    }

    fn screen_vertices(&self) -> &[Option<ScreenVertex>] {
        &self.screen
    }

    fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInit;
    use crate::error::RenderError;
    use crate::math::Vec3;
    use crate::render::RenderConfig;

    fn cube_scene(config: &RenderConfig) -> Scene {
        let mut scene = Scene::from_config(config);
        scene.pose.rotation = Vec3::new(25.0, 35.0, 10.0);
        scene
    }

    fn cpu_cube(config: &RenderConfig) -> CpuBackend {
        CpuBackend::new(Arc::new(Mesh::unit_cube()), config.rasterizer())
    }

    // ── host path ─────────────────────────────────────────────────────────

    #[test]
    fn cpu_renders_visible_cube() {
        let config = RenderConfig::default();
        let mut backend = cpu_cube(&config);
        let mut frame = Frame::new(config.width, config.height, config.background);

        let drawn = backend.render(&cube_scene(&config), &mut frame).unwrap();
        assert!(drawn > 0);
        assert!(frame.rows().flatten().any(|&c| c != ' '));
        assert_eq!(backend.screen_vertices().len(), 8);
        assert_eq!(backend.brightness().len(), 12);
    }

    #[test]
    fn cpu_drops_mesh_behind_camera() {
        let config = RenderConfig {
            position: Vec3::new(0.0, 0.0, 5.0),
            ..RenderConfig::default()
        };
        let mut backend = cpu_cube(&config);
        let mut frame = Frame::new(config.width, config.height, config.background);
        assert_eq!(backend.render(&cube_scene(&config), &mut frame).unwrap(), 0);
        assert!(backend.screen_vertices().iter().all(Option::is_none));
    }

    #[test]
    fn cpu_surfaces_degenerate_camera() {
        let config = RenderConfig::default();
        let mut backend = cpu_cube(&config);
        let mut scene = cube_scene(&config);
        scene.camera.look = Vec3::zero();
        let err = backend.prepare(&scene, config.viewport()).unwrap_err();
        assert!(matches!(err, RenderError::DegenerateCamera(_)));
    }

    #[test]
    fn cpu_front_face_is_fully_lit_when_facing_light() {
        let config = RenderConfig::default();
        let mut backend = cpu_cube(&config);
        backend
            .prepare(&Scene::from_config(&config), config.viewport())
            .unwrap();
        // Triangles 0 and 1 make up the +Z face.
        let b = backend.brightness();
        assert!((b[0] - 1.0).abs() < 1e-6);
        assert!((b[1] - 1.0).abs() < 1e-6);
        assert!(b[2..].iter().all(|&x| x < 1e-6));
    }

    // ── offload parity ────────────────────────────────────────────────────

    #[test]
    fn gpu_backend_builds_on_default_device() {
        let device = match ComputeDevice::request_blocking(DeviceInit::default()) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                return;
            }
        };
        let config = RenderConfig::default();
        let mut backend =
            GpuBackend::new(&device, Arc::new(Mesh::unit_cube()), config.rasterizer()).unwrap();
        let mut frame = Frame::new(config.width, config.height, config.background);
        assert!(backend.render(&cube_scene(&config), &mut frame).unwrap() > 0);
    }

    #[test]
    fn gpu_matches_cpu_on_unit_cube() {
        let device = match ComputeDevice::request_blocking(DeviceInit::default()) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                return;
            }
        };

        let config = RenderConfig::default();
        let mesh = Arc::new(Mesh::unit_cube());
        let scene = cube_scene(&config);

        let mut cpu = CpuBackend::new(mesh.clone(), config.rasterizer());
        let mut gpu = GpuBackend::new(&device, mesh, config.rasterizer()).unwrap();
        cpu.prepare(&scene, config.viewport()).unwrap();
        gpu.prepare(&scene, config.viewport()).unwrap();

        assert_eq!(cpu.screen_vertices().len(), gpu.screen_vertices().len());
        for (c, g) in cpu.screen_vertices().iter().zip(gpu.screen_vertices()) {
            let (c, g) = (c.unwrap(), g.unwrap());
            assert!((c.x - g.x).abs() < 1e-3, "x {} vs {}", c.x, g.x);
            assert!((c.y - g.y).abs() < 1e-3, "y {} vs {}", c.y, g.y);
            assert!((c.depth - g.depth).abs() < 1e-4, "depth {} vs {}", c.depth, g.depth);
        }

        assert_eq!(cpu.brightness().len(), gpu.brightness().len());
        for (c, g) in cpu.brightness().iter().zip(gpu.brightness()) {
            assert!((c - g).abs() < 1e-4, "brightness {c} vs {g}");
        }
    }
}
