use crate::error::{RenderError, Result};
use crate::math::Vec3;
use crate::raster::{DepthMode, GlyphRamp, Rasterizer, ShadeParams};
use crate::transform::{Projection, Viewport};

/// How the per-tick rotation step relates to elapsed time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MotionPolicy {
    /// The full step is applied on every fired tick regardless of frame time.
    #[default]
    FixedStep,

    /// The step is scaled by `dt * reference_fps`, so the angular speed stays
    /// constant when ticks arrive late.
    TimeScaled { reference_fps: u32 },
}

impl MotionPolicy {
    /// Rotation delta (degrees) for a tick that took `dt` seconds.
    pub fn step(self, base: Vec3, dt: f32) -> Vec3 {
        match self {
            MotionPolicy::FixedStep => base,
            MotionPolicy::TimeScaled { reference_fps } => base * (dt * reference_fps as f32),
        }
    }
}

/// Every tunable of one render session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Grid size in cells.
    pub width: u32,
    pub height: u32,

    pub target_fps: u32,

    /// Vertical field of view.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,

    /// View-space direction towards the light. Normalized before use.
    pub light_direction: Vec3,

    pub shade: ShadeParams,
    pub background: char,
    pub depth_mode: DepthMode,

    /// Initial model position.
    pub position: Vec3,

    /// Euler degrees added to the pose per tick.
    pub rotation_step: Vec3,
    pub motion: MotionPolicy,

    /// Stamp `FPS: n` into the top-left cells.
    pub show_fps: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 50,
            target_fps: 60,
            fov_degrees: 70.0,
            near: 0.1,
            far: 100.0,
            light_direction: Vec3::new(0.0, 0.0, 1.0),
            shade: ShadeParams::default(),
            background: ' ',
            depth_mode: DepthMode::Barycentric,
            position: Vec3::new(0.0, 0.0, -5.0),
            rotation_step: Vec3::new(-0.4, -2.0, 0.0),
            motion: MotionPolicy::FixedStep,
            show_fps: true,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.target_fps == 0 {
            return Err(invalid("target fps must be positive"));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(invalid(format!(
                "clip planes need 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        if self.light_direction.try_normalize().is_none() {
            return Err(invalid("light direction must be non-zero"));
        }
        if let MotionPolicy::TimeScaled { reference_fps: 0 } = self.motion {
            return Err(invalid("time-scaled motion needs a positive reference fps"));
        }
        let ShadeParams {
            exposure,
            bias,
            gamma,
        } = self.shade;
        if !(exposure.is_finite() && bias.is_finite() && gamma.is_finite() && gamma > 0.0) {
            return Err(invalid("shade parameters must be finite with gamma > 0"));
        }
        Ok(())
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Projection for the configured grid, aspect `width / height`.
    pub fn projection(&self) -> Projection {
        Projection::for_viewport(self.fov_degrees, self.width, self.height, self.near, self.far)
    }

    /// Rasterizer with the default glyph ramp.
    pub fn rasterizer(&self) -> Rasterizer {
        Rasterizer::new(GlyphRamp::default(), self.shade, self.depth_mode)
    }
}

fn invalid(reason: impl Into<String>) -> RenderError {
    RenderError::InvalidConfig(reason.into())
}
