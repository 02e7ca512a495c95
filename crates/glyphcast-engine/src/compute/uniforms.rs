use bytemuck::{Pod, Zeroable};

use crate::math::{Mat4, Vec3};
use crate::transform::Viewport;

/// `mat4x4<f32>` uniform (64 bytes, column-major).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct MatrixUniform {
    pub cols: [f32; 16],
}

impl From<Mat4> for MatrixUniform {
    fn from(m: Mat4) -> Self {
        Self {
            cols: m.to_cols_array(),
        }
    }
}

/// `vec2<u32>` viewport padded to a 16-byte uniform slot.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ViewportUniform {
    pub size: [u32; 2],
    pub _pad: [u32; 2],
}

impl From<Viewport> for ViewportUniform {
    fn from(v: Viewport) -> Self {
        Self {
            size: [v.width.max(1), v.height.max(1)],
            _pad: [0; 2],
        }
    }
}

/// Light direction as `vec4<f32>` (`w = 0`).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct LightUniform {
    pub dir: [f32; 4],
}

impl From<Vec3> for LightUniform {
    fn from(l: Vec3) -> Self {
        Self {
            dir: [l.x, l.y, l.z, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_binding_layout() {
        assert_eq!(std::mem::size_of::<MatrixUniform>(), 64);
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
        assert_eq!(std::mem::size_of::<LightUniform>(), 16);
    }

    #[test]
    fn matrix_uniform_is_column_major() {
        let u = MatrixUniform::from(Mat4::translation(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(&u.cols[12..15], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn zero_viewport_is_clamped() {
        let u = ViewportUniform::from(Viewport::new(0, 7));
        assert_eq!(u.size, [1, 7]);
    }
}
