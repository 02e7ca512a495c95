//! Glyphcast engine crate.
//!
//! Renders a single triangle mesh into a character grid. Two backends share
//! one set of transform conventions: a host-only path and a wgpu compute path
//! that offloads vertex transform and lighting, then rasterizes on the host.

pub mod compute;
pub mod device;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod raster;
pub mod render;
pub mod time;
pub mod transform;

mod error;

pub use error::{RenderError, Result};
