//! GPU wave simulation with ping-pong `Rg32Float` textures.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::GpuContext;
use crate::error::{Result, RippleError};
use crate::params::{SimulationParameters, HEIGHT_LIMIT};
use crate::pointer::PointerState;
use crate::wave::Texel;

/// Texel format of both state textures (r = height, g = velocity)
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

/// Usages the state textures are created with
const STATE_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// Fail with `GpuUnavailable` unless the adapter can render into and sample
/// `STATE_FORMAT`. Downlevel adapters (GL, software rasterizers) can't.
pub fn check_state_format(features: &wgpu::TextureFormatFeatures) -> Result<()> {
    if features.allowed_usages.contains(STATE_USAGES) {
        Ok(())
    } else {
        Err(RippleError::GpuUnavailable(format!(
            "adapter cannot render to {:?} (allowed usages {:?})",
            STATE_FORMAT, features.allowed_usages
        )))
    }
}

/// Uniform buffer for the simulation shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SimUniforms {
    pub pointer: [f32; 2],
    pub resolution: [f32; 2],
    pub pointer_active: f32,
    pub damping: f32,
    pub stiffness: f32,
    pub disturbance_radius: f32,
    pub disturbance_strength: f32,
    pub height_limit: f32,
    pub _padding: [f32; 2], // Pad to 48 bytes
}

impl SimUniforms {
    pub fn new(params: &SimulationParameters, pointer: &PointerState) -> Self {
        Self {
            pointer: pointer.position.to_array(),
            resolution: [params.resolution.0 as f32, params.resolution.1 as f32],
            pointer_active: if pointer.active { 1.0 } else { 0.0 },
            damping: params.damping,
            stiffness: params.stiffness,
            disturbance_radius: params.disturbance_radius,
            disturbance_strength: params.disturbance_strength,
            height_limit: HEIGHT_LIMIT,
            _padding: [0.0; 2],
        }
    }
}

/// Two state textures and the pass that advances one into the other
pub struct GpuWaveSimulation {
    params: SimulationParameters,
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    /// `bind_groups[i]` reads `textures[i]`
    bind_groups: [wgpu::BindGroup; 2],
    uniform_buffer: wgpu::Buffer,
    pipeline: wgpu::RenderPipeline,
    read: usize,
}

impl GpuWaveSimulation {
    /// Allocate both textures and clear them to zero
    ///
    /// # Errors
    /// `InvalidParameter` if `params` fails validation, `GpuUnavailable` if
    /// the adapter cannot use `STATE_FORMAT` as a render target
    pub fn new(context: &GpuContext, params: SimulationParameters) -> Result<Self> {
        params.validate()?;
        check_state_format(
            &context
                .adapter()
                .get_texture_format_features(STATE_FORMAT),
        )?;

        let device = context.device();
        let (width, height) = params.resolution;

        let make_texture = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: STATE_FORMAT,
                usage: STATE_USAGES,
                view_formats: &[],
            })
        };
        let textures = [make_texture("Wave State A"), make_texture("Wave State B")];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Wave Simulation Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/simulation.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wave Simulation Uniforms"),
            contents: bytemuck::cast_slice(&[SimUniforms::new(&params, &PointerState::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Wave Simulation Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                state_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let make_bind_group = |view: &wgpu::TextureView, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                ],
            })
        };
        let bind_groups = [
            make_bind_group(&views[0], "Wave Simulation Read A"),
            make_bind_group(&views[1], "Wave Simulation Read B"),
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Wave Simulation Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Wave Simulation Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: STATE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let simulation = Self {
            params,
            textures,
            views,
            bind_groups,
            uniform_buffer,
            pipeline,
            read: 0,
        };
        simulation.clear(context);
        Ok(simulation)
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Index of the texture holding the latest completed step
    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn write_index(&self) -> usize {
        1 - self.read
    }

    /// Texture holding the latest completed step
    pub fn current_texture(&self) -> &wgpu::Texture {
        &self.textures[self.read]
    }

    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }

    /// Encode and submit one step from the read texture into the write texture
    pub fn step(&self, context: &GpuContext, pointer: &PointerState) {
        let uniforms = SimUniforms::new(&self.params, pointer);
        context
            .queue()
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wave Simulation Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wave Simulation Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.views[self.write_index()],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.read], &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        context.queue().submit(std::iter::once(encoder.finish()));
    }

    /// Flip read and write textures
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    /// Zero both textures
    pub fn clear(&self, context: &GpuContext) {
        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Wave Clear Encoder"),
            });
        for view in &self.views {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Wave Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        context.queue().submit(std::iter::once(encoder.finish()));
    }

    /// Upload a field into the read texture (tests, seeding)
    pub fn upload(&self, context: &GpuContext, texels: &[Texel]) {
        let (width, height) = self.params.resolution;
        context.queue().write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.textures[self.read],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * std::mem::size_of::<Texel>() as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Read the current texture back as texels
    pub fn read_texels(&self, context: &GpuContext) -> Result<Vec<Texel>> {
        let bytes = context.read_texture(
            self.current_texture(),
            std::mem::size_of::<Texel>() as u32,
        )?;
        Ok(bytes
            .chunks_exact(std::mem::size_of::<Texel>())
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }
}

/// Non-filterable float texture binding used for both state reads
pub(crate) fn state_texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}
