//! Time subsystem.
//!
//! Frame pacing without coupling to a runtime. Every entry point takes the
//! current `Instant` so the gate can be driven by a synthetic clock in tests.

mod frame_gate;

pub use frame_gate::{FrameGate, FrameTime};
