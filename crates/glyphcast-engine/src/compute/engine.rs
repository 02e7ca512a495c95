use std::num::NonZeroU64;
use std::sync::mpsc;

use crate::device::ComputeDevice;
use crate::error::{RenderError, Result};
use crate::math::{Mat4, Vec3};
use crate::mesh::{aligned_size, GpuMesh, Mesh};
use crate::transform::{ScreenVertex, Viewport};

use super::stage::{EngineStage, StageTracker};
use super::uniforms::{LightUniform, MatrixUniform, ViewportUniform};

/// Must match `@workgroup_size` in the shader.
pub const WORKGROUP_SIZE: u32 = 256;

/// Bytes per `vec4<f32>` output element.
const VEC4_BYTES: u64 = 16;

/// The shipped compute program (`vert_transform` + `tri_lighting`).
pub const DEFAULT_PROGRAM: &str = include_str!("shaders/mvp_light.wgsl");

/// Host copy of one dispatch's results.
///
/// `screen` holds `(x, y, depth, visible)` per vertex; `brightness` holds
/// `(b, 0, 0, 0)` per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeOutput {
    pub screen: Vec<f32>,
    pub brightness: Vec<f32>,
}

impl ComputeOutput {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.screen.len() / 4
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.brightness.len() / 4
    }

    /// Screen position of vertex `i`, `None` when it was behind the eye.
    pub fn screen_vertex(&self, i: usize) -> Option<ScreenVertex> {
        let s = self.screen.get(4 * i..4 * i + 4)?;
        (s[3] > 0.5).then_some(ScreenVertex {
            x: s[0],
            y: s[1],
            depth: s[2],
        })
    }

    pub fn screen_vertices(&self) -> Vec<Option<ScreenVertex>> {
        (0..self.vertex_count()).map(|i| self.screen_vertex(i)).collect()
    }

    /// Brightness of every triangle (stride-4 first lanes).
    pub fn triangle_brightness(&self) -> Vec<f32> {
        self.brightness.iter().step_by(4).copied().collect()
    }
}

/// Buffers and bindings sized for one attached mesh.
struct MeshBindings {
    mesh: GpuMesh,
    out_screen: wgpu::Buffer,
    // Bound for pass 2; never read back.
    _out_view: wgpu::Buffer,
    tri_bright: wgpu::Buffer,
    staging_screen: wgpu::Buffer,
    staging_bright: wgpu::Buffer,
    screen_bytes: u64,
    bright_bytes: u64,
    bind_group: wgpu::BindGroup,
}

/// GPU-resident vertex transform and per-triangle lighting.
///
/// Stages: `Initialized → MeshAttached → Dispatched → Read`. Only one
/// dispatch may be outstanding; [`ComputeEngine::read`] or
/// [`ComputeEngine::discard`] must consume it before the next dispatch or
/// mesh attach. The program is compiled once in [`ComputeEngine::new`].
pub struct ComputeEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,

    vertex_pipeline: wgpu::ComputePipeline,
    triangle_pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,

    model_view_ubo: wgpu::Buffer,
    projection_ubo: wgpu::Buffer,
    viewport_ubo: wgpu::Buffer,
    light_ubo: wgpu::Buffer,

    bindings: Option<MeshBindings>,
    pending: Option<wgpu::SubmissionIndex>,
    stages: StageTracker,
}

impl std::fmt::Debug for ComputeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeEngine")
            .field("stage", &self.stages.stage())
            .field("vertex_count", &self.bindings.as_ref().map(|b| b.mesh.vertex_count))
            .finish_non_exhaustive()
    }
}

impl ComputeEngine {
    /// Compiles both entry points against one shared binding layout and
    /// allocates the fixed-size uniform buffers.
    ///
    /// A program that fails validation, or a layout the device cannot
    /// support, is reported as [`RenderError::InvalidProgram`].
    pub fn new(gpu: &ComputeDevice, program_source: &str) -> Result<Self> {
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glyphcast mvp+light shader"),
            source: wgpu::ShaderSource::Wgsl(program_source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glyphcast mvp+light bgl"),
            entries: &[
                uniform_entry(0, 64),  // model-view
                uniform_entry(1, 64),  // projection
                uniform_entry(2, 16),  // viewport
                uniform_entry(3, 16),  // light
                storage_entry(4, true, VEC4_BYTES),  // vertices in
                storage_entry(5, false, VEC4_BYTES), // screen out
                storage_entry(6, false, VEC4_BYTES), // view out
                storage_entry(7, true, 4),           // indices
                storage_entry(8, false, VEC4_BYTES), // triangle brightness
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glyphcast mvp+light pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |entry: &str, label: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let vertex_pipeline = make_pipeline("vert_transform", "glyphcast vert_transform pipeline");
        let triangle_pipeline = make_pipeline("tri_lighting", "glyphcast tri_lighting pipeline");

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(RenderError::InvalidProgram(err.to_string()));
        }

        let model_view_ubo = uniform_buffer(&device, "glyphcast uModelView", 64);
        let projection_ubo = uniform_buffer(&device, "glyphcast uProj", 64);
        let viewport_ubo = uniform_buffer(&device, "glyphcast uViewport", 16);
        let light_ubo = uniform_buffer(&device, "glyphcast uLight", 16);

        log::debug!("compute engine initialized (workgroup size {WORKGROUP_SIZE})");

        Ok(Self {
            device,
            queue,
            vertex_pipeline,
            triangle_pipeline,
            bind_group_layout,
            model_view_ubo,
            projection_ubo,
            viewport_ubo,
            light_ubo,
            bindings: None,
            pending: None,
            stages: StageTracker::new(),
        })
    }

    /// [`ComputeEngine::new`] with [`DEFAULT_PROGRAM`].
    pub fn with_default_program(gpu: &ComputeDevice) -> Result<Self> {
        Self::new(gpu, DEFAULT_PROGRAM)
    }

    #[inline]
    pub fn stage(&self) -> EngineStage {
        self.stages.stage()
    }

    /// Uploads `mesh`, allocates per-mesh output and staging buffers, and
    /// rebuilds the bind group. Previous mesh buffers are dropped wholesale.
    pub fn attach_mesh(&mut self, mesh: &Mesh) -> Result<()> {
        self.stages.attach()?;

        let gpu_mesh = GpuMesh::upload(&self.device, &self.queue, mesh);
        let screen_bytes = u64::from(gpu_mesh.vertex_count) * VEC4_BYTES;
        let bright_bytes = u64::from(gpu_mesh.triangle_count()) * VEC4_BYTES;

        let storage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST;
        let readback = wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST;

        let out_screen = self.buffer("glyphcast outScreen(vec4)", screen_bytes, storage);
        let out_view = self.buffer("glyphcast outView(vec4)", screen_bytes, storage);
        let tri_bright = self.buffer("glyphcast triBright(vec4)", bright_bytes, storage);
        let staging_screen = self.buffer("glyphcast staging outScreen", screen_bytes, readback);
        let staging_bright = self.buffer("glyphcast staging triBright", bright_bytes, readback);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyphcast mvp+light bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                entry(0, &self.model_view_ubo),
                entry(1, &self.projection_ubo),
                entry(2, &self.viewport_ubo),
                entry(3, &self.light_ubo),
                entry(4, &gpu_mesh.vertex_buffer),
                entry(5, &out_screen),
                entry(6, &out_view),
                entry(7, &gpu_mesh.index_buffer),
                entry(8, &tri_bright),
            ],
        });

        log::debug!(
            "compute mesh attached: {} vertices, {} triangles",
            gpu_mesh.vertex_count,
            gpu_mesh.triangle_count()
        );

        self.bindings = Some(MeshBindings {
            mesh: gpu_mesh,
            out_screen,
            _out_view: out_view,
            tri_bright,
            staging_screen,
            staging_bright,
            screen_bytes,
            bright_bytes,
            bind_group,
        });
        Ok(())
    }

    /// Writes all four uniforms for the next dispatch.
    pub fn update_uniforms(
        &mut self,
        model_view: Mat4,
        projection: Mat4,
        viewport: Viewport,
        light_direction: Vec3,
    ) -> Result<()> {
        self.stages.write_uniforms()?;

        let q = &self.queue;
        q.write_buffer(&self.model_view_ubo, 0, bytemuck::bytes_of(&MatrixUniform::from(model_view)));
        q.write_buffer(&self.projection_ubo, 0, bytemuck::bytes_of(&MatrixUniform::from(projection)));
        q.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&ViewportUniform::from(viewport)));
        q.write_buffer(&self.light_ubo, 0, bytemuck::bytes_of(&LightUniform::from(light_direction)));
        Ok(())
    }

    /// Records both passes plus the staging copies and submits them.
    ///
    /// Degenerate meshes submit nothing.
    pub fn dispatch(&mut self) -> Result<()> {
        self.stages.dispatch()?;
        let Some(b) = self.bindings.as_ref() else {
            return Err(RenderError::InvalidStage {
                operation: "dispatch",
                stage: "missing mesh bindings",
            });
        };
        if b.mesh.is_degenerate() {
            return Ok(());
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glyphcast mvp+light encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("glyphcast mvp+light pass"),
                timestamp_writes: None,
            });
            pass.set_bind_group(0, &b.bind_group, &[]);

            pass.set_pipeline(&self.vertex_pipeline);
            pass.dispatch_workgroups(b.mesh.vertex_count.div_ceil(WORKGROUP_SIZE), 1, 1);

            pass.set_pipeline(&self.triangle_pipeline);
            pass.dispatch_workgroups(b.mesh.triangle_count().div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        encoder.copy_buffer_to_buffer(&b.out_screen, 0, &b.staging_screen, 0, b.screen_bytes);
        encoder.copy_buffer_to_buffer(&b.tri_bright, 0, &b.staging_bright, 0, b.bright_bytes);

        self.pending = Some(self.queue.submit(Some(encoder.finish())));
        Ok(())
    }

    /// Waits for the outstanding dispatch and copies results to the host.
    ///
    /// This is the only blocking point of the engine. The dispatch counts as
    /// consumed even when the readback fails.
    pub fn read(&mut self) -> Result<ComputeOutput> {
        self.stages.require_dispatched("read")?;
        let submission = self.pending.take();
        let result = self.read_staging(submission);
        self.stages.complete();
        result
    }

    /// Lets the outstanding dispatch finish and drops its results.
    pub fn discard(&mut self) -> Result<()> {
        self.stages.require_dispatched("discard")?;
        if let Some(submission) = self.pending.take() {
            if let Err(e) = self
                .device
                .poll(wait_for(submission))
            {
                log::warn!("device poll failed while discarding compute results: {e}");
            }
        }
        self.stages.complete();
        Ok(())
    }

    /// [`ComputeEngine::dispatch`] followed by [`ComputeEngine::read`].
    pub fn run_and_read(&mut self) -> Result<ComputeOutput> {
        self.dispatch()?;
        self.read()
    }

    fn read_staging(&self, submission: Option<wgpu::SubmissionIndex>) -> Result<ComputeOutput> {
        let (Some(b), Some(submission)) = (self.bindings.as_ref(), submission) else {
            // Degenerate meshes never submit.
            return Ok(ComputeOutput::default());
        };

        let screen_slice = b.staging_screen.slice(..b.screen_bytes);
        let bright_slice = b.staging_bright.slice(..b.bright_bytes);

        let (tx, rx) = mpsc::channel();
        let tx_bright = tx.clone();
        screen_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send((0usize, r));
        });
        bright_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx_bright.send((1usize, r));
        });

        let poll = self.device.poll(wait_for(submission));

        // A completed wait has already run both map callbacks.
        let mut mapped = [false; 2];
        let mut failure: Option<String> = poll.err().map(|e| e.to_string());
        for _ in 0..2 {
            match rx.try_recv() {
                Ok((which, Ok(()))) => mapped[which] = true,
                Ok((_, Err(e))) => {
                    failure.get_or_insert_with(|| e.to_string());
                }
                Err(_) => {
                    failure.get_or_insert_with(|| "map callback did not run".to_string());
                }
            }
        }

        if let Some(reason) = failure {
            if mapped[0] {
                b.staging_screen.unmap();
            }
            if mapped[1] {
                b.staging_bright.unmap();
            }
            return Err(RenderError::AsyncReadout(reason));
        }

        let screen = {
            let view = screen_slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&view).to_vec()
        };
        let brightness = {
            let view = bright_slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&view).to_vec()
        };
        b.staging_screen.unmap();
        b.staging_bright.unmap();

        Ok(ComputeOutput { screen, brightness })
    }

    fn buffer(&self, label: &str, bytes: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: aligned_size(bytes),
            usage,
            mapped_at_creation: false,
        })
    }
}

fn wait_for(submission: wgpu::SubmissionIndex) -> wgpu::PollType {
    wgpu::PollType::Wait {
        submission_index: Some(submission),
        timeout: None,
    }
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

fn entry(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInit;
    use crate::transform::{Camera, Pose, Projection, TransformPipeline};

    fn device_or_skip() -> Option<ComputeDevice> {
        match ComputeDevice::request_blocking(DeviceInit::default()) {
            Ok(d) => Some(d),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    fn uniforms(engine: &mut ComputeEngine) {
        let pose = Pose::at(Vec3::new(0.0, 0.0, -4.0));
        let proj = Projection::for_viewport(70.0, 80, 40, 0.1, 100.0);
        let t = TransformPipeline::new(&pose, &Camera::default(), &proj).unwrap();
        engine
            .update_uniforms(t.model_view(), t.projection(), Viewport::new(80, 40), Vec3::new(0.0, 0.0, 1.0))
            .unwrap();
    }

    // ── output decoding ───────────────────────────────────────────────────

    #[test]
    fn output_decodes_stride_four() {
        let out = ComputeOutput {
            screen: vec![1.0, 2.0, 0.5, 1.0, 9.0, 9.0, 9.0, 0.0],
            brightness: vec![0.25, 0.0, 0.0, 0.0],
        };
        assert_eq!(out.vertex_count(), 2);
        assert_eq!(out.triangle_count(), 1);
        assert_eq!(out.screen_vertex(0), Some(ScreenVertex { x: 1.0, y: 2.0, depth: 0.5 }));
        assert_eq!(out.screen_vertex(1), None);
        assert_eq!(out.screen_vertex(2), None);
        assert_eq!(out.triangle_brightness(), vec![0.25]);
    }

    // ── device-backed ─────────────────────────────────────────────────────

    #[test]
    fn run_and_read_returns_stride_four_arrays() {
        let Some(gpu) = device_or_skip() else { return };
        let mut engine = ComputeEngine::with_default_program(&gpu).unwrap();
        let cube = Mesh::unit_cube();
        engine.attach_mesh(&cube).unwrap();
        uniforms(&mut engine);
        let out = engine.run_and_read().unwrap();
        assert_eq!(out.screen.len(), 4 * cube.vertex_count());
        assert_eq!(out.brightness.len(), 4 * cube.triangle_count());
        assert_eq!(engine.stage(), EngineStage::Read);
    }

    #[test]
    fn second_dispatch_is_rejected_until_read() {
        let Some(gpu) = device_or_skip() else { return };
        let mut engine = ComputeEngine::with_default_program(&gpu).unwrap();
        engine.attach_mesh(&Mesh::unit_cube()).unwrap();
        uniforms(&mut engine);
        engine.dispatch().unwrap();
        assert!(matches!(engine.dispatch(), Err(RenderError::InvalidStage { .. })));
        assert!(matches!(engine.attach_mesh(&Mesh::unit_cube()), Err(RenderError::InvalidStage { .. })));
        engine.discard().unwrap();
        engine.attach_mesh(&Mesh::unit_cube()).unwrap();
    }

    #[test]
    fn unparsable_program_is_an_error() {
        let Some(gpu) = device_or_skip() else { return };
        let err = ComputeEngine::new(&gpu, "this is not wgsl").unwrap_err();
        assert!(matches!(err, RenderError::InvalidProgram(_)), "{err}");
    }

    #[test]
    fn program_without_entry_points_is_an_error() {
        let Some(gpu) = device_or_skip() else { return };
        let src = "@compute @workgroup_size(1) fn main() {}";
        let err = ComputeEngine::new(&gpu, src).unwrap_err();
        assert!(matches!(err, RenderError::InvalidProgram(_)), "{err}");
    }

    #[test]
    fn empty_mesh_short_circuits() {
        let Some(gpu) = device_or_skip() else { return };
        let mut engine = ComputeEngine::with_default_program(&gpu).unwrap();
        engine.attach_mesh(&Mesh::default()).unwrap();
        uniforms(&mut engine);
        let out = engine.run_and_read().unwrap();
        assert!(out.screen.is_empty());
        assert!(out.brightness.is_empty());
    }
}
