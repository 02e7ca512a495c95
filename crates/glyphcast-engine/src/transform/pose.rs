use crate::math::{Mat4, Vec3};

/// Placement of the rendered entity.
///
/// Updated in place once per animation tick by the render loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Euler angles in degrees, applied Z then Y then X.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::splat(1.0),
        }
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// `Translate · Scale · Rz · Ry · Rx`.
    ///
    /// The vertex sees X rotation first, then Y, then Z, then scale, then
    /// translation. Reordering changes the image.
    pub fn model_matrix(&self) -> Mat4 {
        let rx = Mat4::rotation_x(self.rotation.x.to_radians());
        let ry = Mat4::rotation_y(self.rotation.y.to_radians());
        let rz = Mat4::rotation_z(self.rotation.z.to_radians());
        Mat4::translation(self.position) * Mat4::scale(self.scale) * rz * ry * rx
    }

    /// Adds `delta` degrees to the rotation, keeping each angle in `(-360, 360)`.
    pub fn rotate_by(&mut self, delta: Vec3) {
        self.rotation = Vec3::new(
            (self.rotation.x + delta.x) % 360.0,
            (self.rotation.y + delta.y) % 360.0,
            (self.rotation.z + delta.z) % 360.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn yaw_ninety_maps_x_to_negative_z() {
        let pose = Pose {
            rotation: Vec3::new(0.0, 90.0, 0.0),
            ..Pose::default()
        };
        let p = pose.model_matrix().transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(p.xyz(), Vec3::new(0.0, 0.0, -1.0)), "{p:?}");
    }

    #[test]
    fn x_rotation_applies_before_z() {
        // Rx(90) sends +Y to +Z; Rz(90) leaves +Z alone.
        let pose = Pose {
            rotation: Vec3::new(90.0, 0.0, 90.0),
            ..Pose::default()
        };
        let p = pose.model_matrix().transform_point(Vec3::new(0.0, 1.0, 0.0));
        assert!(close(p.xyz(), Vec3::new(0.0, 0.0, 1.0)), "{p:?}");
    }

    #[test]
    fn scale_applies_after_rotation_and_translation_last() {
        let pose = Pose {
            position: Vec3::new(0.0, 0.0, -10.0),
            rotation: Vec3::new(0.0, 0.0, 90.0),
            scale: Vec3::new(2.0, 3.0, 1.0),
        };
        // Rz(90): (1,0,0) -> (0,1,0); scale -> (0,3,0); translate -> (0,3,-10)
        let p = pose.model_matrix().transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(p.xyz(), Vec3::new(0.0, 3.0, -10.0)), "{p:?}");
    }

    #[test]
    fn rotate_by_wraps() {
        let mut pose = Pose::default();
        pose.rotate_by(Vec3::new(-0.4, -2.0, 0.0));
        assert!(close(pose.rotation, Vec3::new(-0.4, -2.0, 0.0)));
        pose.rotation = Vec3::new(359.0, 0.0, 0.0);
        pose.rotate_by(Vec3::new(2.0, 0.0, 0.0));
        assert!((pose.rotation.x - 1.0).abs() < 1e-4);
    }
}
