use crate::error::{RenderError, Result};
use crate::math::{cross, dot, Mat4, Vec3};

/// Viewer placement.
///
/// `look` is the direction the camera faces (not a target point). The basis
/// is rebuilt on every [`Camera::view_matrix`] call, so edits take effect on
/// the next frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub look: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::zero(),
            look: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl Camera {
    /// Right-handed look-at inverse transform.
    ///
    /// Rows are the camera axes; the last column holds `-dot(axis, eye)`.
    pub fn view_matrix(&self) -> Result<Mat4> {
        let z_axis = (-self.look)
            .try_normalize()
            .ok_or(RenderError::DegenerateCamera("look direction has zero length"))?;
        let x_axis = cross(self.up, z_axis)
            .try_normalize()
            .ok_or(RenderError::DegenerateCamera("up is zero or parallel to look"))?;
        let y_axis = cross(z_axis, x_axis);

        Ok(Mat4::from_rows([
            [x_axis.x, x_axis.y, x_axis.z, -dot(x_axis, self.eye)],
            [y_axis.x, y_axis.y, y_axis.z, -dot(y_axis, self.eye)],
            [z_axis.x, z_axis.y, z_axis.z, -dot(z_axis, self.eye)],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }
}
