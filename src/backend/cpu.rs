//! CPU backend: ping-pong `WaveField`s and the CPU surface renderer.

use std::borrow::Cow;

use image::RgbaImage;

use super::WaveBackend;
use crate::error::Result;
use crate::params::{SimulationParameters, SurfaceParameters};
use crate::pointer::PointerState;
use crate::surface::{composite, OverlayFrame, SurfaceRenderer};
use crate::wave::{simulate, WaveBuffers, WaveField};

pub struct CpuBackend {
    buffers: WaveBuffers,
    params: SimulationParameters,
    renderer: SurfaceRenderer,
    overlay: OverlayFrame,
    heights: Vec<f32>,
    /// Size of images produced by `capture`
    capture_size: (u32, u32),
}

impl CpuBackend {
    /// Allocate zeroed buffers for `params.resolution`
    ///
    /// # Errors
    /// `InvalidParameter` if `params` fails validation
    pub fn new(params: SimulationParameters, surface: SurfaceParameters) -> Result<Self> {
        params.validate()?;
        let (width, height) = params.resolution;
        log::debug!("CPU backend: {}x{} grid", width, height);
        Ok(Self {
            buffers: WaveBuffers::new(width, height),
            params,
            renderer: SurfaceRenderer::new(surface),
            overlay: OverlayFrame::new(width, height),
            heights: vec![0.0; params.texel_count()],
            capture_size: (width, height),
        })
    }

    /// Stretch captured frames to `width` x `height`
    pub fn with_capture_size(mut self, width: u32, height: u32) -> Self {
        self.capture_size = (width, height);
        self
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn buffers(&self) -> &WaveBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut WaveBuffers {
        &mut self.buffers
    }

    pub fn field(&self) -> &WaveField {
        self.buffers.current()
    }

    /// Overlay produced by the last `render`
    pub fn overlay(&self) -> &OverlayFrame {
        &self.overlay
    }
}

impl WaveBackend for CpuBackend {
    fn simulate(&mut self, pointer: PointerState) {
        let (read, write) = self.buffers.read_write();
        simulate(read, write, &pointer, &self.params);
    }

    fn swap(&mut self) {
        self.buffers.swap();
    }

    fn render(&mut self) -> Result<()> {
        let field = self.buffers.current();
        self.renderer.render(field, &mut self.overlay);
        for (out, texel) in self.heights.iter_mut().zip(field.texels()) {
            *out = texel.height;
        }
        Ok(())
    }

    fn heights(&self) -> Result<Cow<'_, [f32]>> {
        Ok(Cow::Borrowed(&self.heights))
    }

    fn resolution(&self) -> (u32, u32) {
        self.params.resolution
    }

    fn reset(&mut self) {
        self.buffers.clear();
        self.heights.fill(0.0);
        self.overlay = OverlayFrame::new(self.params.resolution.0, self.params.resolution.1);
    }

    fn capture(&mut self) -> Result<RgbaImage> {
        let (width, height) = self.capture_size;
        Ok(composite(&self.overlay, width, height))
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
