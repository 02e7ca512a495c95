//! Small fixed-size vector/matrix value types.
//!
//! Convention:
//! - matrices are stored row-major and multiply column vectors (`m * v`)
//! - points are promoted to homogeneous `Vec4` with `w = 1` before any multiply
//! - GPU uploads use [`Mat4::to_cols_array`] (WGSL matrices are column-major)

mod mat4;
mod vec3;
mod vec4;

pub use mat4::Mat4;
pub use vec3::{cross, dot, Vec3};
pub use vec4::Vec4;

/// Lengths below this are treated as zero by `try_normalize`.
pub const NORMALIZE_EPSILON: f32 = 1e-8;
