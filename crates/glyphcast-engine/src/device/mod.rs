//! Compute device acquisition.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - mapping acquisition failures to `RenderError::DeviceUnavailable`

mod gpu;
mod init;

pub use gpu::ComputeDevice;
pub use init::{DeviceInit, STORAGE_BUFFERS_PER_STAGE};
