//! Backend-agnostic ripple simulation interface.
//!
//! The CPU backend runs the step kernel on a rayon pool and shades into an
//! in-memory overlay; the GPU backend keeps both buffers in textures and
//! draws straight into a window surface or an offscreen target.

use std::borrow::Cow;

use image::RgbaImage;

use crate::error::Result;
use crate::pointer::PointerState;

mod cpu;

pub use cpu::CpuBackend;

/// Operations the frame driver performs each frame, in this order:
/// `simulate`, `swap`, `render`.
pub trait WaveBackend {
    /// Write one simulation step from the read buffer into the write buffer
    fn simulate(&mut self, pointer: PointerState);

    /// Make the buffer written by `simulate` the read buffer
    fn swap(&mut self);

    /// Draw the overlay from the read buffer
    ///
    /// # Errors
    /// `OverlayUnavailable` when the render target is gone for good
    fn render(&mut self) -> Result<()>;

    /// Heights of the read buffer, row-major, row 0 at the top.
    /// CPU backend borrows, GPU backend reads back into an owned Vec.
    ///
    /// # Errors
    /// `GpuUnavailable` if the readback fails
    fn heights(&self) -> Result<Cow<'_, [f32]>>;

    /// Grid size in texels
    fn resolution(&self) -> (u32, u32);

    /// Return both buffers to rest without reallocating
    fn reset(&mut self);

    /// Composited image of the last rendered frame
    fn capture(&mut self) -> Result<RgbaImage>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
