//! The instanced particle field.
//!
//! A [`ParticleSystem`] owns the CPU attributes for every instance and,
//! once attached to a device, the GPU buffers and pipeline that draw them.
//! All per-particle motion happens in the vertex shader; the CPU only
//! advances a scalar clock and republishes a handful of uniforms per frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::attributes::{
    template_triangle, InstanceAttributes, InstanceRaw, TemplateVertex, INSTANCE_STRIDE,
    TEMPLATE_VERTEX_COUNT,
};
use crate::error::ConfigError;
use crate::renderer::DEPTH_FORMAT;
use crate::shader::PARTICLE_SHADER;

/// Fixed clock increment applied on every update, regardless of the frame
/// delta. The field drifts at a rate tied to refresh rate, not wall time;
/// the published uniform is `sin(clock)`, so the drift sways back and forth
/// instead of growing without bound.
pub const PARTICLE_TIME_STEP: f32 = 0.005;

/// Lifecycle of a GPU-backed scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// CPU data exists; no GPU resources yet.
    Constructed,
    /// GPU resources live, updates take effect.
    Active,
    /// GPU resources released. Terminal.
    Disposed,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ParticleUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    /// Animation time in x, rest unused. Padded to a full vec4.
    time: [f32; 4],
}

#[derive(Debug)]
struct ParticleGpu {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Instanced particle field entity.
#[derive(Debug)]
pub struct ParticleSystem {
    attributes: InstanceAttributes,
    template: [TemplateVertex; 3],
    count: u32,
    clock: f32,
    state: EntityState,
    gpu: Option<ParticleGpu>,
}

impl ParticleSystem {
    /// Build the CPU side of a field: `count` instances spread through a
    /// cube of edge `spread`, drawn as triangles of half-extent `size`.
    pub fn new(
        count: u32,
        spread: f32,
        size: f32,
        palette: [Vec4; 2],
    ) -> Result<Self, ConfigError> {
        let attributes = InstanceAttributes::generate(count, spread, palette)?;
        Ok(Self::from_attributes(attributes, size))
    }

    /// Like [`ParticleSystem::new`] with a fixed seed, for reproducible
    /// fields.
    pub fn new_seeded(
        count: u32,
        spread: f32,
        size: f32,
        palette: [Vec4; 2],
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let attributes = InstanceAttributes::generate_seeded(count, spread, palette, seed)?;
        Ok(Self::from_attributes(attributes, size))
    }

    fn from_attributes(attributes: InstanceAttributes, size: f32) -> Self {
        let count = attributes.len();
        Self {
            attributes,
            template: template_triangle(size),
            count,
            clock: 0.0,
            state: EntityState::Constructed,
            gpu: None,
        }
    }

    #[inline]
    pub fn state(&self) -> EntityState {
        self.state
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn attributes(&self) -> &InstanceAttributes {
        &self.attributes
    }

    /// Accumulated animation clock in seconds of fixed steps.
    #[inline]
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// The time value published to the shader.
    #[inline]
    pub fn time_uniform(&self) -> f32 {
        self.clock.sin()
    }

    /// Number of live GPU buffers.
    pub fn buffer_count(&self) -> u32 {
        if self.gpu.is_some() {
            3
        } else {
            0
        }
    }

    /// Advance the animation clock by one fixed step.
    ///
    /// The frame delta is accepted for signature symmetry but ignored; see
    /// [`PARTICLE_TIME_STEP`]. Only an [`EntityState::Active`] system
    /// advances.
    pub fn update(&mut self, _dt: f32) {
        if self.state == EntityState::Active {
            self.clock += PARTICLE_TIME_STEP;
        }
    }

    /// Create the GPU resources on `device` and become active.
    ///
    /// Valid only once, from [`EntityState::Constructed`]; a disposed
    /// system stays disposed.
    pub fn attach(&mut self, device: &wgpu::Device, surface_format: wgpu::TextureFormat) {
        if self.state != EntityState::Constructed {
            log::debug!("particle attach skipped in state {:?}", self.state);
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Template Buffer"),
            contents: bytemuck::cast_slice(&self.template),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instances = self.attributes.to_instances();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = ParticleUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            time: [0.0; 4],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Particle Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<TemplateVertex>()
                            as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: INSTANCE_STRIDE as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                            wgpu::VertexAttribute {
                                offset: 12,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32,
                            },
                            wgpu::VertexAttribute {
                                offset: 16,
                                shader_location: 3,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 32,
                                shader_location: 4,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 48,
                                shader_location: 5,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                        ],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        self.gpu = Some(ParticleGpu {
            pipeline,
            vertex_buffer,
            instance_buffer,
            uniform_buffer,
            bind_group,
        });
        self.state = EntityState::Active;
        log::debug!("particle field active with {} instances", self.count);
    }

    /// Publish this frame's matrices and clock to the uniform buffer.
    pub fn upload_uniforms(&self, queue: &wgpu::Queue, view_proj: Mat4, model: Mat4) {
        let gpu = match &self.gpu {
            Some(gpu) => gpu,
            None => return,
        };
        let uniforms = ParticleUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            time: [self.time_uniform(), 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Record the field's draw into an open render pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let gpu = match &self.gpu {
            Some(gpu) => gpu,
            None => return,
        };
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
        pass.draw(0..TEMPLATE_VERTEX_COUNT, 0..self.count);
    }

    /// Destroy the GPU buffers and end the entity's life. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.vertex_buffer.destroy();
            gpu.instance_buffer.destroy();
            gpu.uniform_buffer.destroy();
            log::debug!("particle field disposed");
        }
        self.state = EntityState::Disposed;
    }

    #[cfg(test)]
    fn force_active(&mut self) {
        self.state = EntityState::Active;
    }
}

/// Size assertions kept close to the layouts they protect.
const _: () = assert!(std::mem::size_of::<ParticleUniforms>() == 144);
const _: () = assert!(std::mem::size_of::<InstanceRaw>() == 64);

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [Vec4; 2] = [
        Vec4::new(1.0, 0.5, 0.0, 1.0),
        Vec4::new(0.0, 0.5, 1.0, 1.0),
    ];

    fn system(count: u32) -> ParticleSystem {
        ParticleSystem::new_seeded(count, 10.0, 0.35, PALETTE, 99).unwrap()
    }

    #[test]
    fn test_new_starts_constructed() {
        let sys = system(100);
        assert_eq!(sys.state(), EntityState::Constructed);
        assert_eq!(sys.count(), 100);
        assert_eq!(sys.clock(), 0.0);
        assert_eq!(sys.buffer_count(), 0);
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = ParticleSystem::new_seeded(0, 10.0, 0.35, PALETTE, 1).unwrap_err();
        assert_eq!(err, ConfigError::InvalidInstanceCount(0));
    }

    #[test]
    fn test_update_before_attach_is_noop() {
        let mut sys = system(10);
        sys.update(0.016);
        assert_eq!(sys.clock(), 0.0);
    }

    #[test]
    fn test_update_ignores_frame_delta() {
        let mut sys = system(10);
        sys.force_active();

        sys.update(0.001);
        sys.update(1.0);
        sys.update(f32::MAX);
        let expected = 3.0 * PARTICLE_TIME_STEP;
        assert!((sys.clock() - expected).abs() < 1e-7);
    }

    #[test]
    fn test_time_uniform_is_sine_of_clock() {
        let mut sys = system(10);
        sys.force_active();
        for _ in 0..200 {
            sys.update(0.016);
        }
        assert!((sys.time_uniform() - sys.clock().sin()).abs() < 1e-7);
        assert!(sys.time_uniform().abs() <= 1.0);
    }

    #[test]
    fn test_dispose_is_terminal_and_idempotent() {
        let mut sys = system(10);
        sys.dispose();
        assert_eq!(sys.state(), EntityState::Disposed);

        sys.dispose();
        assert_eq!(sys.state(), EntityState::Disposed);

        // No further mutation and no reallocation after disposal.
        sys.update(0.016);
        assert_eq!(sys.clock(), 0.0);
        assert_eq!(sys.buffer_count(), 0);
    }
}
