//! Compute offload engine.
//!
//! Runs the per-vertex transform and the per-triangle Lambert term on the GPU
//! in two dispatches, then reads the results back for host rasterization.

mod engine;
mod stage;
mod uniforms;

pub use engine::{ComputeEngine, ComputeOutput, DEFAULT_PROGRAM, WORKGROUP_SIZE};
pub use stage::EngineStage;
