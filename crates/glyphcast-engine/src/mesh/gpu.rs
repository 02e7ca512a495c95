use super::Mesh;

/// Rounds a byte size up to wgpu's copy alignment.
///
/// Never returns less than one `vec4<f32>` so storage bindings stay valid for
/// empty meshes.
#[inline]
pub fn aligned_size(bytes: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    let padded = bytes.div_ceil(align) * align;
    padded.max(MIN_STORAGE_BYTES)
}

const MIN_STORAGE_BYTES: u64 = 16;

/// Positions as tightly packed `vec4<f32>` with `w = 1`.
pub fn pack_positions(mesh: &Mesh) -> Vec<[f32; 4]> {
    mesh.positions()
        .iter()
        .map(|p| [p.x, p.y, p.z, 1.0])
        .collect()
}

/// Indices as a `u32` array (already 0-based).
pub fn pack_indices(mesh: &Mesh) -> Vec<u32> {
    mesh.indices().to_vec()
}

/// Device-resident copy of a [`Mesh`].
///
/// Replaced wholesale when the mesh changes; never patched in place.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl GpuMesh {
    /// Allocates storage buffers and queues the upload.
    ///
    /// The copy executes with the next queue submission.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, mesh: &Mesh) -> Self {
        let positions = pack_positions(mesh);
        let indices = pack_indices(mesh);

        let vertex_buffer = create_storage(
            device,
            queue,
            "glyphcast mesh vertices(vec4)",
            bytemuck::cast_slice(&positions),
        );
        let index_buffer = create_storage(
            device,
            queue,
            "glyphcast mesh indices(u32)",
            bytemuck::cast_slice(&indices),
        );

        Self {
            vertex_buffer,
            index_buffer,
            vertex_count: positions.len() as u32,
            index_count: indices.len() as u32,
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vertex_count == 0 || self.index_count < 3
    }
}

fn create_storage(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    contents: &[u8],
) -> wgpu::Buffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: aligned_size(contents.len() as u64),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if !contents.is_empty() {
        queue.write_buffer(&buffer, 0, contents);
    }
    buffer
}
