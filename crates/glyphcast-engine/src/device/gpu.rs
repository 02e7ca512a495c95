use crate::error::{RenderError, Result};

use super::DeviceInit;

/// Owns the wgpu objects used by the compute offload path.
///
/// Unlike a windowed context there is no surface: results are read back to
/// the host and rasterized there.
pub struct ComputeDevice {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl ComputeDevice {
    /// Acquires an adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn request(init: DeviceInit) -> Result<Self> {
        let DeviceInit {
            power_preference,
            force_fallback_adapter,
            backends,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .map_err(|e| RenderError::DeviceUnavailable(format!("no suitable adapter: {e}")))?;

        let mut shortfall = Vec::new();
        required_limits.check_limits_with_fail_fn(&adapter.limits(), false, |name, want, have| {
            shortfall.push(format!("{name} needs {want}, adapter allows {have}"));
        });
        if !shortfall.is_empty() {
            return Err(RenderError::DeviceUnavailable(format!(
                "adapter `{}` is below the compute limits: {}",
                adapter.get_info().name,
                shortfall.join("; ")
            )));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("glyphcast compute device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::DeviceUnavailable(format!("device request failed: {e}")))?;

        let info = adapter.get_info();
        log::info!(
            "compute device: {} ({:?}, {:?})",
            info.name,
            info.device_type,
            info.backend
        );

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Blocking wrapper around [`ComputeDevice::request`].
    pub fn request_blocking(init: DeviceInit) -> Result<Self> {
        pollster::block_on(Self::request(init))
    }

    /// Returns adapter details for diagnostics.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
