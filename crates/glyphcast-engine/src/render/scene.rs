use crate::error::{RenderError, Result};
use crate::math::Vec3;
use crate::transform::{Camera, Pose, Projection};

use super::RenderConfig;

/// Mutable per-session state read by a backend each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scene {
    pub pose: Pose,
    pub camera: Camera,
    pub projection: Projection,
    /// Direction towards the light in view space.
    pub light: Vec3,
}

impl Scene {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            pose: Pose::at(config.position),
            camera: Camera::default(),
            projection: config.projection(),
            light: config.light_direction,
        }
    }

    /// Unit light direction.
    pub fn light_direction(&self) -> Result<Vec3> {
        self.light
            .try_normalize()
            .ok_or_else(|| RenderError::InvalidConfig("light direction must be non-zero".into()))
    }
}
