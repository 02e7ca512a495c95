use crate::math::Mat4;

/// Perspective parameters.
///
/// Constant for a given viewport; [`Projection::resize`] only touches the
/// aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn for_viewport(fov_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect: width as f32 / height as f32,
            near,
            far,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    /// Right-handed perspective; clip `w = -z_view`, NDC depth in `[-1, 1]`.
    pub fn matrix(&self) -> Mat4 {
        let f = 1.0 / (self.fov_degrees.to_radians() * 0.5).tan();
        let (n, fa) = (self.near, self.far);
        Mat4::from_rows([
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (fa + n) / (n - fa), 2.0 * fa * n / (n - fa)],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn proj() -> Projection {
        Projection::for_viewport(70.0, 120, 50, 0.1, 100.0)
    }

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(proj().aspect, 120.0 / 50.0);
    }

    #[test]
    fn near_and_far_map_to_ndc_bounds() {
        let m = proj().matrix();
        let near = m.transform_point(Vec3::new(0.0, 0.0, -0.1)).project();
        let far = m.transform_point(Vec3::new(0.0, 0.0, -100.0)).project();
        assert!((near.z + 1.0).abs() < 1e-4, "{near:?}");
        assert!((far.z - 1.0).abs() < 1e-4, "{far:?}");
    }

    #[test]
    fn fov_edge_maps_to_ndc_one() {
        let p = proj();
        let half = (p.fov_degrees.to_radians() * 0.5).tan();
        let top = p.matrix().transform_point(Vec3::new(0.0, 10.0 * half, -10.0)).project();
        assert!((top.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resize_only_changes_aspect() {
        let mut p = proj();
        let before = p;
        p.resize(80, 40);
        assert_eq!(p.aspect, 2.0);
        assert_eq!(p.fov_degrees, before.fov_degrees);
        assert_eq!(p.near, before.near);
        assert_eq!(p.far, before.far);
        assert_ne!(p.matrix(), before.matrix());
    }
}
