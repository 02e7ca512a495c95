/// Initialization parameters for the compute device.
///
/// Keep this structure small. Add flags only when a concrete backend
/// requirement exists.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Adapter preference passed to wgpu.
    pub power_preference: wgpu::PowerPreference,

    /// Accept only a software/fallback adapter.
    ///
    /// Useful for deterministic CI runs on machines without a GPU.
    pub force_fallback_adapter: bool,

    /// Backends wgpu may pick from.
    pub backends: wgpu::Backends,

    /// Limits requested from the adapter/device.
    ///
    /// Must allow [`STORAGE_BUFFERS_PER_STAGE`] storage buffers in the
    /// compute stage; see [`DeviceInit::compute_limits`].
    pub required_limits: wgpu::Limits,
}

/// Storage bindings in the compute layout: vertices, screen out, view out,
/// indices, triangle brightness.
pub const STORAGE_BUFFERS_PER_STAGE: u32 = 5;

impl DeviceInit {
    /// Downlevel limits raised to what the compute layout binds.
    pub fn compute_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_storage_buffers_per_shader_stage: STORAGE_BUFFERS_PER_STAGE,
            ..wgpu::Limits::downlevel_defaults()
        }
    }
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            backends: wgpu::Backends::all(),
            required_limits: Self::compute_limits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_cover_compute_layout() {
        let limits = DeviceInit::default().required_limits;
        assert!(limits.max_storage_buffers_per_shader_stage >= STORAGE_BUFFERS_PER_STAGE);
        assert!(limits.max_uniform_buffers_per_shader_stage >= 4);
        assert!(limits.max_bindings_per_bind_group >= 9);
    }

    #[test]
    fn default_limits_stay_within_webgpu_defaults() {
        let limits = DeviceInit::default().required_limits;
        assert!(limits.check_limits(&wgpu::Limits::default()));
    }
}
