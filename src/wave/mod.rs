//! Ripple wave field: storage, ping-pong buffering and the CPU step kernel.

mod buffers;
mod field;
mod step;

pub use buffers::WaveBuffers;
pub use field::{texel_uv, Texel, WaveField};
pub use step::{falloff, simulate, smoothstep, step_texel};
