//! Triangle meshes and their loaders.
//!
//! - [`parse_obj`] / [`load_obj_file`] turn Wavefront-OBJ text into a [`Mesh`]
//! - [`GpuMesh`] packs a mesh into device storage buffers for the compute path

mod gpu;
mod obj;

pub use gpu::{aligned_size, pack_indices, pack_positions, GpuMesh};
pub use obj::{load_obj_file, parse_obj};

use crate::math::Vec3;

/// Triangle-only mesh: vertex positions plus 0-based index triples.
///
/// Immutable once loaded. `indices.len()` is always a multiple of three and
/// every index is `< positions.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    pub(crate) fn from_parts(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 3 == 0);
        Self { positions, indices }
    }

    /// Axis-aligned cube of side 1 centred on the origin, 12 outward-facing
    /// counter-clockwise triangles.
    pub fn unit_cube() -> Self {
        let h = 0.5;
        let positions = vec![
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2,  0, 2, 3, // +z
            5, 4, 7,  5, 7, 6, // -z
            1, 5, 6,  1, 6, 2, // +x
            4, 0, 3,  4, 3, 7, // -x
            3, 2, 6,  3, 6, 7, // +y
            4, 5, 1,  4, 1, 0, // -y
        ];
        Self::from_parts(positions, indices)
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [usize; 3] {
        let i = 3 * t;
        [
            self.indices[i] as usize,
            self.indices[i + 1] as usize,
            self.indices[i + 2] as usize,
        ]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.triangle_count()).map(|t| self.triangle(t))
    }

    /// True when there is nothing to draw (no vertices or no complete triangle).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }
}
