//! Model / view / projection transforms and the screen mapping shared by
//! both backends.

mod camera;
mod pose;
mod projection;

pub use camera::Camera;
pub use pose::Pose;
pub use projection::Projection;

use crate::error::Result;
use crate::math::{Mat4, Vec3, Vec4};

/// Clip-space `w` at or below this is treated as behind the eye.
pub const W_EPSILON: f32 = 1e-6;

/// Character-grid dimensions in cells.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Per-frame projected vertex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    /// `ndc_z * 0.5 + 0.5`; smaller is nearer.
    pub depth: f32,
}

pub fn model_matrix(pose: &Pose) -> Mat4 {
    pose.model_matrix()
}

pub fn view_matrix(camera: &Camera) -> Result<Mat4> {
    camera.view_matrix()
}

pub fn projection_matrix(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Projection {
        fov_degrees,
        aspect,
        near,
        far,
    }
    .matrix()
}

/// Perspective divide plus viewport mapping (Y flipped, rows grow downward).
///
/// Returns `None` for vertices at or behind the eye and for non-finite results.
pub fn clip_to_screen(clip: Vec4, viewport: Viewport) -> Option<ScreenVertex> {
    if clip.w <= W_EPSILON {
        return None;
    }
    let ndc = clip.project();
    let v = ScreenVertex {
        x: (ndc.x + 1.0) * viewport.width as f32 * 0.5,
        y: (1.0 - ndc.y) * viewport.height as f32 * 0.5,
        depth: ndc.z * 0.5 + 0.5,
    };
    (v.x.is_finite() && v.y.is_finite() && v.depth.is_finite()).then_some(v)
}

/// Matrices for one frame, composed once and applied per vertex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformPipeline {
    model_view: Mat4,
    projection: Mat4,
}

impl TransformPipeline {
    pub fn new(pose: &Pose, camera: &Camera, projection: &Projection) -> Result<Self> {
        Ok(Self {
            model_view: camera.view_matrix()? * pose.model_matrix(),
            projection: projection.matrix(),
        })
    }

    #[inline]
    pub fn model_view(&self) -> Mat4 {
        self.model_view
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn to_view(&self, p: Vec3) -> Vec4 {
        self.model_view.transform_point(p)
    }

    #[inline]
    pub fn view_to_screen(&self, view: Vec4, viewport: Viewport) -> Option<ScreenVertex> {
        clip_to_screen(self.projection.transform(view), viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> TransformPipeline {
        let pose = Pose::at(Vec3::new(0.0, 0.0, -5.0));
        let proj = Projection::for_viewport(70.0, 120, 50, 0.1, 100.0);
        TransformPipeline::new(&pose, &Camera::default(), &proj).unwrap()
    }

    #[test]
    fn centre_projects_to_grid_centre() {
        let p = pipeline();
        let vp = Viewport::new(120, 50);
        let s = p.view_to_screen(p.to_view(Vec3::zero()), vp).unwrap();
        assert!((s.x - 60.0).abs() < 1e-4);
        assert!((s.y - 25.0).abs() < 1e-4);
        assert!(s.depth > 0.0 && s.depth < 1.0);
    }

    #[test]
    fn up_is_towards_row_zero() {
        let p = pipeline();
        let vp = Viewport::new(120, 50);
        let s = p.view_to_screen(p.to_view(Vec3::new(0.0, 1.0, 0.0)), vp).unwrap();
        assert!(s.y < 25.0);
    }

    #[test]
    fn nearer_points_have_smaller_depth() {
        let p = pipeline();
        let vp = Viewport::new(120, 50);
        let near = p.view_to_screen(p.to_view(Vec3::new(0.0, 0.0, 1.0)), vp).unwrap();
        let far = p.view_to_screen(p.to_view(Vec3::new(0.0, 0.0, -1.0)), vp).unwrap();
        assert!(near.depth < far.depth);
    }

    #[test]
    fn points_behind_eye_are_dropped() {
        let p = pipeline();
        let vp = Viewport::new(120, 50);
        assert!(p.view_to_screen(p.to_view(Vec3::new(0.0, 0.0, 10.0)), vp).is_none());
        assert!(clip_to_screen(Vec4::new(1.0, 1.0, 1.0, 0.0), vp).is_none());
    }

    #[test]
    fn free_functions_match_methods() {
        let proj = Projection::for_viewport(60.0, 80, 40, 0.5, 50.0);
        assert_eq!(
            projection_matrix(60.0, 2.0, 0.5, 50.0),
            proj.matrix()
        );
        let pose = Pose::default();
        assert_eq!(model_matrix(&pose), Mat4::IDENTITY);
        assert_eq!(view_matrix(&Camera::default()).unwrap(), Mat4::IDENTITY);
    }
}
