//! Rasterizer / compositor.
//!
//! Triangles arrive as screen-space vertices plus one brightness value each
//! and are painted into a [`Frame`] with a nearest-wins depth test.

mod frame;
mod light;
mod rasterizer;
mod shade;

pub use frame::{Frame, DEPTH_FAR};
pub use light::face_brightness;
pub use rasterizer::{DepthMode, Rasterizer};
pub use shade::{GlyphRamp, ShadeParams};
