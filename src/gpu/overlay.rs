//! GPU surface renderer: backdrop plus difference-blended ripple overlay.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::simulation::{state_texture_entry, GpuWaveSimulation};
use super::GpuContext;
use crate::params::SurfaceParameters;

/// Uniform buffer for the overlay shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub light_dir: [f32; 4],
    pub view_dir: [f32; 4],
    pub resolution: [f32; 2],
    pub normal_scale: f32,
    pub shininess: f32,
    pub edge_low: f32,
    pub edge_high: f32,
    pub alpha_boost: f32,
    pub _padding: f32, // Pad to 64 bytes
}

impl SurfaceUniforms {
    pub fn new(params: &SurfaceParameters, resolution: (u32, u32)) -> Self {
        Self {
            light_dir: params.light().extend(0.0).to_array(),
            view_dir: params.view().extend(0.0).to_array(),
            resolution: [resolution.0 as f32, resolution.1 as f32],
            normal_scale: params.normal_scale,
            shininess: params.shininess,
            edge_low: params.edge_band.0,
            edge_high: params.edge_band.1,
            alpha_boost: params.alpha_boost,
            _padding: 0.0,
        }
    }
}

/// Difference against white for premultiplied output: `src·(1 - dst) + dst·(1 - srcα)`.
/// Destination alpha is left untouched.
pub const DIFFERENCE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::OneMinusDst,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Pipelines drawing the backdrop and the overlay into a color target
pub struct OverlayRenderer {
    backdrop_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    /// `bind_groups[i]` samples simulation texture `i`
    bind_groups: [wgpu::BindGroup; 2],
    _uniform_buffer: wgpu::Buffer,
}

impl OverlayRenderer {
    pub fn new(
        context: &GpuContext,
        simulation: &GpuWaveSimulation,
        surface: &SurfaceParameters,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let device = context.device();

        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ripple Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/overlay.wgsl").into()),
        });

        let backdrop_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Backdrop Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/backdrop.wgsl").into()),
        });

        let uniforms = SurfaceUniforms::new(surface, simulation.params().resolution);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ripple Overlay Uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ripple Overlay Bind Group Layout"),
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

        let make_bind_group = |index: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Ripple Overlay Bind Group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(simulation.view(index)),
                    },
                ],
            })
        };
        let bind_groups = [make_bind_group(0), make_bind_group(1)];

        let overlay_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ripple Overlay Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let backdrop_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Backdrop Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let overlay_pipeline = fullscreen_pipeline(
            device,
            "Ripple Overlay Pipeline",
            &overlay_layout,
            &overlay_shader,
            target_format,
            Some(DIFFERENCE_BLEND),
        );
        let backdrop_pipeline = fullscreen_pipeline(
            device,
            "Backdrop Pipeline",
            &backdrop_layout,
            &backdrop_shader,
            target_format,
            None,
        );

        Self {
            backdrop_pipeline,
            overlay_pipeline,
            bind_groups,
            _uniform_buffer: uniform_buffer,
        }
    }

    /// Draw the backdrop, then the overlay sampled from simulation texture `read_index`
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView, read_index: usize) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Ripple Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Backdrop first
        pass.set_pipeline(&self.backdrop_pipeline);
        pass.draw(0..3, 0..1);

        // Ripples on top
        pass.set_pipeline(&self.overlay_pipeline);
        pass.set_bind_group(0, &self.bind_groups[read_index], &[]);
        pass.draw(0..3, 0..1);
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
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
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 64);
    }

    #[test]
    fn test_uniforms_normalize_directions() {
        let uniforms = SurfaceUniforms::new(&SurfaceParameters::default(), (512, 256));
        let [x, y, z, w] = uniforms.light_dir;
        assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-6);
        assert_eq!(w, 0.0);
        assert_eq!(uniforms.view_dir, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(uniforms.resolution, [512.0, 256.0]);
    }
}
