//! Frame orchestration.
//!
//! A [`RenderLoop`] owns the scene state, advances the pose once per fired
//! tick, renders through a [`RenderBackend`] into a private scratch frame, and
//! only hands finished frames to a [`Presenter`].

mod backend;
mod config;
mod render_loop;
mod scene;

pub use backend::{CpuBackend, GpuBackend, RenderBackend};
pub use config::{MotionPolicy, RenderConfig};
pub use render_loop::{Presenter, RenderLoop, StopHandle, TickOutcome};
pub use scene::Scene;
