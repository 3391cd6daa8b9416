//! GPU side of the showcase.
//!
//! - `context` owns the wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` builds the mesh pipeline and the two blur pipelines.
//! - `uniforms` lays out the per-layer scene block and the blur block.
//! - `state` keeps the offscreen targets and the mesh cache, and turns a
//!   [`Frame`](crate::showcase::Frame) into pixels.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
