//! GPU context management and texture readback.

use std::sync::Arc;

use super::simulation::{check_state_format, STATE_FORMAT};
use crate::error::{Result, RippleError};

/// wgpu device and queue shared by the simulation and overlay passes
pub struct GpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter: wgpu::Adapter,
}

impl GpuContext {
    /// Create a headless context
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self::from_instance(&instance, None).await
    }

    /// Create a context able to present to `surface`
    ///
    /// # Errors
    /// `GpuUnavailable` if no adapter or device can be created, or if the
    /// adapter cannot render into the wave state format
    pub async fn from_instance(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RippleError::GpuUnavailable("no compatible adapter".to_string()))?;

        let info = adapter.get_info();
        log::info!("GPU adapter selected: {} ({:?})", info.name, info.backend);
        check_state_format(&adapter.get_texture_format_features(STATE_FORMAT))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ripple Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RippleError::GpuUnavailable(format!("failed to create device: {}", e)))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Copy a 2D texture back to the CPU, stripping row padding.
    ///
    /// The texture needs `COPY_SRC` usage.
    pub fn read_texture(
        &self,
        texture: &wgpu::Texture,
        bytes_per_texel: u32,
    ) -> Result<Vec<u8>> {
        let width = texture.width();
        let height = texture.height();
        let unpadded_bytes_per_row = width * bytes_per_texel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(receiver)
            .map_err(|_| RippleError::GpuUnavailable("readback cancelled".to_string()))?
            .map_err(|e| RippleError::GpuUnavailable(format!("readback failed: {}", e)))?;

        let data = slice.get_mapped_range();
        let mut out = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in data.chunks(padded_bytes_per_row as usize) {
            out.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        buffer.unmap();

        Ok(out)
    }
}

/// Blocking wrapper for creating a headless context
pub fn create_gpu_context_blocking() -> Result<GpuContext> {
    pollster::block_on(GpuContext::new())
}
