//! Ripplefx library - Cursor-driven water ripple overlay

pub mod backend;
pub mod cli;
pub mod driver;
pub mod error;
pub mod gpu;
pub mod params;
pub mod pointer;
pub mod recording;
pub mod surface;
pub mod wave;

pub use backend::{CpuBackend, WaveBackend};
pub use driver::FrameDriver;
pub use error::{Result, RippleError};
pub use gpu::GpuBackend;
pub use pointer::{PointerPort, PointerState};
