//! GPU path: wgpu context, ping-pong texture simulation and overlay rendering.

mod backend;
mod context;
mod overlay;
mod simulation;

pub use backend::{GpuBackend, OverlayTarget, SurfaceRecovery, OFFSCREEN_FORMAT};
pub use context::{create_gpu_context_blocking, GpuContext};
pub use overlay::{OverlayRenderer, SurfaceUniforms, DIFFERENCE_BLEND};
pub use simulation::{check_state_format, GpuWaveSimulation, SimUniforms, STATE_FORMAT};
