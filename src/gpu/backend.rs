//! GPU backend: texture simulation plus overlay drawn into a window or an
//! offscreen target.

use std::borrow::Cow;
use std::sync::Arc;

use image::RgbaImage;
use winit::window::Window;

use super::overlay::OverlayRenderer;
use super::simulation::GpuWaveSimulation;
use super::GpuContext;
use crate::backend::WaveBackend;
use crate::error::{Result, RippleError};
use crate::params::{SimulationParameters, SurfaceParameters};
use crate::pointer::PointerState;

/// Format of the offscreen capture target
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Where the overlay is drawn
pub enum OverlayTarget {
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
    },
}

/// What a frame does when the window surface cannot hand out a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    /// Drop this frame and try again next tick
    Skip,
    /// Reconfigure the surface, then continue next tick
    Reconfigure,
    /// Stop the effect
    Fatal,
}

impl SurfaceRecovery {
    pub fn for_error(error: &wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Timeout => Self::Skip,
            wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => Self::Reconfigure,
            _ => Self::Fatal,
        }
    }
}

pub struct GpuBackend {
    context: GpuContext,
    simulation: GpuWaveSimulation,
    overlay: OverlayRenderer,
    target: OverlayTarget,
}

impl GpuBackend {
    /// Create a backend presenting to `window`
    ///
    /// # Errors
    /// `InvalidParameter` for invalid `params`; `GpuUnavailable` if the
    /// surface, adapter or device cannot be created
    pub async fn for_window(
        window: Arc<Window>,
        params: SimulationParameters,
        surface_params: SurfaceParameters,
    ) -> Result<Self> {
        params.validate()?;
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance
            .create_surface(window)
            .map_err(|e| RippleError::GpuUnavailable(format!("failed to create surface: {}", e)))?;

        let context = GpuContext::from_instance(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(context.adapter());
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RippleError::GpuUnavailable("surface has no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(context.device(), &config);

        let simulation = GpuWaveSimulation::new(&context, params)?;
        let overlay = OverlayRenderer::new(&context, &simulation, &surface_params, format);

        Ok(Self {
            context,
            simulation,
            overlay,
            target: OverlayTarget::Window { surface, config },
        })
    }

    /// Create a backend drawing into a `width` x `height` texture
    pub async fn offscreen(
        width: u32,
        height: u32,
        params: SimulationParameters,
        surface_params: SurfaceParameters,
    ) -> Result<Self> {
        params.validate()?;
        let context = GpuContext::new().await?;
        Self::offscreen_with_context(context, width, height, params, surface_params)
    }

    pub fn offscreen_with_context(
        context: GpuContext,
        width: u32,
        height: u32,
        params: SimulationParameters,
        surface_params: SurfaceParameters,
    ) -> Result<Self> {
        let simulation = GpuWaveSimulation::new(&context, params)?;

        let texture = context.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Overlay Target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let overlay = OverlayRenderer::new(&context, &simulation, &surface_params, OFFSCREEN_FORMAT);

        Ok(Self {
            context,
            simulation,
            overlay,
            target: OverlayTarget::Offscreen { texture, view },
        })
    }

    /// Reconfigure the window surface. The simulation grid keeps its size and
    /// is stretched over the new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let OverlayTarget::Window { surface, config } = &mut self.target {
            config.width = width;
            config.height = height;
            surface.configure(self.context.device(), config);
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn simulation(&self) -> &GpuWaveSimulation {
        &self.simulation
    }

    fn draw_into(&self, view: &wgpu::TextureView) {
        let mut encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ripple Render Encoder"),
            });
        self.overlay
            .draw(&mut encoder, view, self.simulation.read_index());
        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));
    }
}

impl WaveBackend for GpuBackend {
    fn simulate(&mut self, pointer: PointerState) {
        self.simulation.step(&self.context, &pointer);
    }

    fn swap(&mut self) {
        self.simulation.swap();
    }

    fn render(&mut self) -> Result<()> {
        match &self.target {
            OverlayTarget::Window { surface, config } => {
                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(e) => match SurfaceRecovery::for_error(&e) {
                        SurfaceRecovery::Skip => {
                            log::debug!("Surface {}, skipping frame", e);
                            return Ok(());
                        }
                        SurfaceRecovery::Reconfigure => {
                            log::debug!("Surface {}, reconfiguring", e);
                            surface.configure(self.context.device(), config);
                            return Ok(());
                        }
                        SurfaceRecovery::Fatal => {
                            return Err(RippleError::OverlayUnavailable(e.to_string()))
                        }
                    },
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.draw_into(&view);
                frame.present();
            }
            OverlayTarget::Offscreen { view, .. } => {
                self.draw_into(view);
            }
        }
        Ok(())
    }

    fn heights(&self) -> Result<Cow<'_, [f32]>> {
        let texels = self.simulation.read_texels(&self.context)?;
        Ok(Cow::Owned(texels.iter().map(|t| t.height).collect()))
    }

    fn resolution(&self) -> (u32, u32) {
        self.simulation.params().resolution
    }

    fn reset(&mut self) {
        self.simulation.clear(&self.context);
    }

    fn capture(&mut self) -> Result<RgbaImage> {
        match &self.target {
            OverlayTarget::Offscreen { texture, .. } => {
                let bytes = self.context.read_texture(texture, 4)?;
                RgbaImage::from_raw(texture.width(), texture.height(), bytes).ok_or_else(|| {
                    RippleError::GpuUnavailable("readback size mismatch".to_string())
                })
            }
            OverlayTarget::Window { .. } => Err(RippleError::CaptureUnsupported),
        }
    }

    fn name(&self) -> &'static str {
        "gpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_gpu_context_blocking;
    use crate::surface::backdrop_color;
    use glam::Vec2;

    fn offscreen(width: u32, height: u32, params: SimulationParameters) -> Option<GpuBackend> {
        match create_gpu_context_blocking() {
            Ok(context) => Some(
                GpuBackend::offscreen_with_context(
                    context,
                    width,
                    height,
                    params,
                    SurfaceParameters::default(),
                )
                .unwrap(),
            ),
            Err(e) => {
                eprintln!("GPU backend test skipped: {}", e);
                None
            }
        }
    }

    #[test]
    fn test_surface_recovery_policy() {
        use wgpu::SurfaceError;

        assert_eq!(SurfaceRecovery::for_error(&SurfaceError::Timeout), SurfaceRecovery::Skip);
        assert_eq!(
            SurfaceRecovery::for_error(&SurfaceError::Outdated),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            SurfaceRecovery::for_error(&SurfaceError::Lost),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            SurfaceRecovery::for_error(&SurfaceError::OutOfMemory),
            SurfaceRecovery::Fatal
        );
    }

    #[test]
    fn test_offscreen_rejects_degenerate_grid() {
        let Ok(context) = create_gpu_context_blocking() else {
            eprintln!("GPU validation test skipped: no adapter");
            return;
        };
        let params = SimulationParameters {
            resolution: (0, 4),
            ..Default::default()
        };
        let result =
            GpuBackend::offscreen_with_context(context, 16, 16, params, SurfaceParameters::default());
        assert!(matches!(result, Err(RippleError::InvalidParameter(_))));
    }

    #[test]
    fn test_flat_overlay_shows_backdrop_only() {
        let params = SimulationParameters {
            resolution: (32, 32),
            ..Default::default()
        };
        let Some(mut gpu) = offscreen(16, 16, params) else {
            return;
        };
        gpu.render().unwrap();
        let image = gpu.capture().unwrap();
        assert_eq!(image.dimensions(), (16, 16));

        // Pixel (2, 5) sits at u = 2.5/16, v = 1 - 5.5/16, clear of stripe edges.
        // The target is sRGB, so the linear backdrop is encoded on write.
        let [r, ..] = backdrop_color(2.5 / 16.0, 1.0 - 5.5 / 16.0);
        let expected = (linear_to_srgb(r) * 255.0).round() as i32;
        assert!((image.get_pixel(2, 5).0[0] as i32 - expected).abs() <= 2);
    }

    #[test]
    fn test_disturbance_changes_heights_and_image() {
        let params = SimulationParameters {
            resolution: (64, 64),
            disturbance_radius: 0.1,
            ..Default::default()
        };
        let Some(mut gpu) = offscreen(64, 64, params) else {
            return;
        };
        gpu.render().unwrap();
        let before = gpu.capture().unwrap();

        for _ in 0..5 {
            gpu.simulate(PointerState::at(Vec2::new(0.5, 0.5)));
            gpu.swap();
        }
        gpu.render().unwrap();
        let after = gpu.capture().unwrap();

        let heights = gpu.heights().unwrap();
        assert_eq!(heights.len(), 64 * 64);
        assert!(heights.iter().any(|h| *h < -0.1));
        assert_ne!(before, after);

        gpu.reset();
        assert!(gpu.heights().unwrap().iter().all(|h| *h == 0.0));
    }

    fn linear_to_srgb(c: f32) -> f32 {
        if c <= 0.003_130_8 {
            c * 12.92
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }
}
