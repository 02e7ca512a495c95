use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{RenderError, Result};
use crate::raster::Frame;
use crate::time::{FrameGate, FrameTime};

use super::{RenderBackend, RenderConfig, Scene};

/// Sink for completed frames.
///
/// Only ever sees fully rendered frames.
pub trait Presenter {
    fn present(&mut self, frame: &Frame) -> std::io::Result<()>;
}

/// Cloneable stop flag shared with whoever owns the loop's lifetime.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What one call to [`RenderLoop::tick`] did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TickOutcome {
    /// Too early; nothing happened.
    Skipped,
    /// A new frame was published and presented. `fps` is `None` until two
    /// ticks have fired.
    Presented { frame_index: u64, fps: Option<u32> },
    /// Rendering failed transiently; the previous frame stays published.
    Dropped,
    /// The loop has been stopped. Any frame rendered this tick was discarded.
    Stopped,
}

/// Per-tick orchestration: gate, animate, render, stamp, publish, present.
pub struct RenderLoop {
    config: RenderConfig,
    scene: Scene,
    backend: Box<dyn RenderBackend>,
    gate: FrameGate,
    /// Written by the backend; never exposed.
    scratch: Frame,
    /// Last completed frame.
    front: Frame,
    stop: StopHandle,
}

impl RenderLoop {
    pub fn new(config: RenderConfig, backend: Box<dyn RenderBackend>) -> Result<Self> {
        config.validate()?;
        log::info!(
            "render loop: {}x{} @ {} fps, {} backend",
            config.width,
            config.height,
            config.target_fps,
            backend.name()
        );
        Ok(Self {
            scene: Scene::from_config(&config),
            gate: FrameGate::new(config.target_fps),
            scratch: Frame::new(config.width, config.height, config.background),
            front: Frame::new(config.width, config.height, config.background),
            stop: StopHandle::default(),
            backend,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The most recently published frame.
    #[inline]
    pub fn front(&self) -> &Frame {
        &self.front
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Changes the grid size. Only the projection's aspect and the frame
    /// buffers change; the published frame is blanked.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let mut next = self.config.clone();
        next.width = width;
        next.height = height;
        next.validate()?;
        self.config = next;

        self.scene.projection.resize(width, height);
        self.scratch.resize(width, height);
        self.front.resize(width, height);
        log::debug!("render loop resized to {width}x{height}");
        Ok(())
    }

    /// Runs one tick if the gate is open.
    ///
    /// Transient failures (degenerate camera, readback failure) are logged
    /// and reported as [`TickOutcome::Dropped`]. Anything else is returned
    /// as an error.
    pub fn tick(&mut self, now: Instant, presenter: &mut dyn Presenter) -> Result<TickOutcome> {
        if self.stop.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }
        let Some(time) = self.gate.tick(now) else {
            return Ok(TickOutcome::Skipped);
        };

        self.advance(&time);

        self.scratch.clear();
        match self.backend.render(&self.scene, &mut self.scratch) {
            Ok(_) => {}
            Err(e @ (RenderError::DegenerateCamera(_) | RenderError::AsyncReadout(_))) => {
                log::warn!("frame {} dropped: {e}", time.frame_index);
                return Ok(TickOutcome::Dropped);
            }
            Err(e) => return Err(e),
        }

        let fps = time.measured_fps();
        if self.config.show_fps {
            let label = match fps {
                Some(n) => format!("FPS: {n}"),
                None => "FPS: -".to_string(),
            };
            self.scratch.stamp(0, 0, &label);
        }

        if self.stop.is_stopped() {
            log::debug!("frame {} discarded after stop", time.frame_index);
            return Ok(TickOutcome::Stopped);
        }

        std::mem::swap(&mut self.scratch, &mut self.front);
        presenter.present(&self.front).map_err(RenderError::Present)?;

        Ok(TickOutcome::Presented {
            frame_index: time.frame_index,
            fps,
        })
    }

    fn advance(&mut self, time: &FrameTime) {
        let step = self.config.motion.step(self.config.rotation_step, time.dt);
        self.scene.pose.rotate_by(step);
    }
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::math::Vec3;
    use crate::mesh::Mesh;
    use crate::raster::Rasterizer;
    use crate::render::CpuBackend;
    use crate::transform::{ScreenVertex, Viewport};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<String>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, frame: &Frame) -> std::io::Result<()> {
            self.frames.push(frame.to_text("\n"));
            Ok(())
        }
    }

    /// Fails every `prepare` after the first one.
    struct Flaky {
        inner: CpuBackend,
        calls: usize,
    }

    impl RenderBackend for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn prepare(&mut self, scene: &Scene, viewport: Viewport) -> Result<()> {
            self.calls += 1;
            if self.calls > 1 {
                return Err(RenderError::AsyncReadout("buffer lost".into()));
            }
            self.inner.prepare(scene, viewport)
        }

        fn screen_vertices(&self) -> &[Option<ScreenVertex>] {
            self.inner.screen_vertices()
        }

        fn brightness(&self) -> &[f32] {
            self.inner.brightness()
        }

        fn mesh(&self) -> &Mesh {
            self.inner.mesh()
        }

        fn rasterizer(&self) -> &Rasterizer {
            self.inner.rasterizer()
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 40,
            height: 20,
            target_fps: 10,
            ..RenderConfig::default()
        }
    }

    fn cube_backend(config: &RenderConfig) -> Box<dyn RenderBackend> {
        Box::new(CpuBackend::new(Arc::new(Mesh::unit_cube()), config.rasterizer()))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // ── gating ────────────────────────────────────────────────────────────

    #[test]
    fn ticks_inside_interval_are_skipped() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let mut out = Recorder::default();
        let t0 = Instant::now();

        assert!(matches!(rl.tick(t0, &mut out).unwrap(), TickOutcome::Presented { frame_index: 0, .. }));
        assert_eq!(rl.tick(t0 + ms(30), &mut out).unwrap(), TickOutcome::Skipped);
        assert!(matches!(rl.tick(t0 + ms(100), &mut out).unwrap(), TickOutcome::Presented { frame_index: 1, .. }));
        assert_eq!(out.frames.len(), 2);
    }

    #[test]
    fn pose_advances_once_per_fired_tick() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let mut out = Recorder::default();
        let t0 = Instant::now();

        rl.tick(t0, &mut out).unwrap();
        rl.tick(t0 + ms(10), &mut out).unwrap();
        let r = rl.scene().pose.rotation;
        assert!((r - Vec3::new(-0.4, -2.0, 0.0)).length() < 1e-6);
    }

    // ── publishing ────────────────────────────────────────────────────────

    #[test]
    fn fps_stamp_overwrites_top_left() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let mut out = Recorder::default();
        let t0 = Instant::now();

        let first = rl.tick(t0, &mut out).unwrap();
        assert_eq!(first, TickOutcome::Presented { frame_index: 0, fps: None });
        assert!(out.frames[0].starts_with("FPS: -"));
        assert!(rl.front().rows().flatten().any(|c| ";ox#%@".contains(*c)));

        // 125 ms after the first tick is a measured 8 fps, not the 10 fps target.
        let second = rl.tick(t0 + ms(125), &mut out).unwrap();
        assert_eq!(second, TickOutcome::Presented { frame_index: 1, fps: Some(8) });
        assert!(out.frames[1].starts_with("FPS: 8"));
        assert!(!out.frames[1].as_bytes()[6].is_ascii_digit());
    }

    #[test]
    fn no_stamp_when_disabled() {
        let config = RenderConfig {
            show_fps: false,
            ..small_config()
        };
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let mut out = Recorder::default();
        rl.tick(Instant::now(), &mut out).unwrap();
        assert!(!out.frames[0].contains("FPS"));
    }

    #[test]
    fn failed_frame_keeps_previous_publication() {
        let config = small_config();
        let backend = Flaky {
            inner: CpuBackend::new(Arc::new(Mesh::unit_cube()), config.rasterizer()),
            calls: 0,
        };
        let mut rl = RenderLoop::new(config, Box::new(backend)).unwrap();
        let mut out = Recorder::default();
        let t0 = Instant::now();

        rl.tick(t0, &mut out).unwrap();
        let first = rl.front().clone();

        assert_eq!(rl.tick(t0 + ms(100), &mut out).unwrap(), TickOutcome::Dropped);
        assert_eq!(rl.front(), &first);
        assert_eq!(out.frames.len(), 1);
    }

    #[test]
    fn stop_prevents_further_ticks() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let mut out = Recorder::default();
        let handle = rl.stop_handle();

        handle.stop();
        assert_eq!(rl.tick(Instant::now(), &mut out).unwrap(), TickOutcome::Stopped);
        assert!(out.frames.is_empty());
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_only_touches_aspect() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        let before = rl.scene().projection;

        rl.resize(64, 16).unwrap();
        let after = rl.scene().projection;
        assert_eq!(after.aspect, 64.0 / 16.0);
        assert_eq!(after.fov_degrees, before.fov_degrees);
        assert_eq!(after.near, before.near);
        assert_eq!(after.far, before.far);
        assert_eq!((rl.front().width(), rl.front().height()), (64, 16));
        assert_eq!(rl.config().width, 64);
    }

    #[test]
    fn resize_rejects_empty_grid() {
        let config = small_config();
        let mut rl = RenderLoop::new(config.clone(), cube_backend(&config)).unwrap();
        assert!(matches!(rl.resize(0, 10), Err(RenderError::InvalidConfig(_))));
        assert_eq!(rl.config().width, 40);
    }
}
