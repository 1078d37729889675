//! The lit portrait model.
//!
//! A [`PortraitModel`] starts empty and fills in as assets arrive: the mesh
//! and the environment map each land whenever their loads finish, in any
//! order. Until the mesh arrives nothing is drawn; until the environment
//! arrives a black placeholder map keeps the bind group valid and the
//! reflection term at zero. Arrivals are staged on the CPU and applied to
//! the GPU at the next frame boundary via [`PortraitModel::sync`].

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::environment::{EnvironmentImage, EnvironmentMap};
use crate::error::AssetError;
use crate::lights::LightRig;
use crate::particles::EntityState;
use crate::renderer::DEPTH_FORMAT;
use crate::shader::PORTRAIT_SHADER;

/// Indexed triangle mesh in the crate's in-memory format.
///
/// Parsing model files is the asset source's job; this is only the shape
/// the renderer consumes.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Check the mesh is drawable: non-empty, matching attribute lengths,
    /// and indices in range.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.positions.is_empty() {
            return Err(AssetError::Source("mesh has no vertices".into()));
        }
        if self.positions.len() != self.normals.len() {
            return Err(AssetError::Source(format!(
                "mesh has {} positions but {} normals",
                self.positions.len(),
                self.normals.len()
            )));
        }
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(AssetError::Source(format!(
                "mesh index count {} is not a positive multiple of 3",
                self.indices.len()
            )));
        }
        let max = self.positions.len() as u32;
        if self.indices.iter().any(|&i| i >= max) {
            return Err(AssetError::Source("mesh index out of range".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleave positions and normals for the vertex buffer.
    pub fn interleave(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(&position, &normal)| ModelVertex { position, normal })
            .collect()
    }
}

/// Vertex layout of the portrait pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PortraitUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    /// rgb = base color, w = roughness.
    base_color: [f32; 4],
    /// x = highest mip level, y = environment weight.
    env: [f32; 4],
}

struct MeshGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ModelGpu {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    env_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    env_bind_group: wgpu::BindGroup,
    env: EnvironmentMap,
    mesh: Option<MeshGpu>,
}

/// Lit portrait entity.
pub struct PortraitModel {
    mesh: Option<MeshData>,
    mesh_dirty: bool,
    pending_env: Option<EnvironmentImage>,
    env_weight: f32,
    roughness: f32,
    state: EntityState,
    gpu: Option<ModelGpu>,
}

impl PortraitModel {
    /// Create an empty portrait with the given surface roughness.
    pub fn new(roughness: f32) -> Self {
        Self {
            mesh: None,
            mesh_dirty: false,
            pending_env: None,
            env_weight: 0.0,
            roughness: roughness.clamp(0.0, 1.0),
            state: EntityState::Constructed,
            gpu: None,
        }
    }

    #[inline]
    pub fn state(&self) -> EntityState {
        self.state
    }

    #[inline]
    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    /// Whether mesh geometry has been accepted.
    #[inline]
    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Whether a real environment map has been accepted (staged or
    /// uploaded).
    #[inline]
    pub fn has_environment(&self) -> bool {
        self.pending_env.is_some() || self.env_weight > 0.0
    }

    /// Number of live GPU buffers.
    pub fn buffer_count(&self) -> u32 {
        match &self.gpu {
            Some(gpu) => 2 + if gpu.mesh.is_some() { 2 } else { 0 },
            None => 0,
        }
    }

    /// Accept mesh geometry. Takes effect at the next frame boundary.
    ///
    /// A late arrival on a disposed portrait is dropped, since the loader
    /// thread may still deliver after teardown.
    pub fn set_mesh(&mut self, mesh: MeshData) -> Result<(), AssetError> {
        if self.state == EntityState::Disposed {
            log::debug!("mesh arrived after dispose, dropped");
            return Ok(());
        }
        mesh.validate()?;
        log::debug!(
            "portrait mesh staged: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.mesh = Some(mesh);
        self.mesh_dirty = true;
        Ok(())
    }

    /// Accept an environment map. Takes effect at the next frame boundary.
    pub fn set_environment(&mut self, env: EnvironmentImage) {
        if self.state == EntityState::Disposed {
            log::debug!("environment arrived after dispose, dropped");
            return;
        }
        log::debug!(
            "portrait environment staged: {:?}, {} mips",
            env.dimensions(),
            env.mip_count()
        );
        self.pending_env = Some(env);
    }

    /// Create the GPU resources on `device` and become active.
    ///
    /// Valid only once, from [`EntityState::Constructed`].
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) {
        if self.state != EntityState::Constructed {
            log::debug!("portrait attach skipped in state {:?}", self.state);
            return;
        }

        let uniforms = PortraitUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
            base_color: [1.0, 1.0, 1.0, self.roughness],
            env: [0.0; 4],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portrait Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Portrait Lights Buffer"),
            size: std::mem::size_of::<crate::lights::LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Portrait Uniform Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Portrait Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        let env_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Portrait Environment Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Equirectangular maps wrap horizontally and clamp at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Portrait Environment Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let env = EnvironmentImage::solid([0, 0, 0, 255]).upload(device, queue);
        let env_bind_group = create_env_bind_group(device, &env_layout, &env, &sampler);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Portrait Shader"),
            source: wgpu::ShaderSource::Wgsl(PORTRAIT_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Portrait Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &env_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Portrait Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
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

        self.gpu = Some(ModelGpu {
            pipeline,
            uniform_buffer,
            lights_buffer,
            uniform_bind_group,
            env_layout,
            sampler,
            env_bind_group,
            env,
            mesh: None,
        });
        self.state = EntityState::Active;
        log::debug!("portrait model active");
    }

    /// Apply staged asset arrivals to the GPU.
    ///
    /// Called once per frame before drawing. Does nothing until attached.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let gpu = match &mut self.gpu {
            Some(gpu) => gpu,
            None => return,
        };

        if self.mesh_dirty {
            if let Some(mesh) = &self.mesh {
                let vertices = mesh.interleave();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Portrait Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Portrait Index Buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                if let Some(old) = gpu.mesh.take() {
                    old.vertex_buffer.destroy();
                    old.index_buffer.destroy();
                }
                gpu.mesh = Some(MeshGpu {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                });
            }
            self.mesh_dirty = false;
        }

        if let Some(image) = self.pending_env.take() {
            let env = image.upload(device, queue);
            gpu.env.destroy();
            gpu.env_bind_group = create_env_bind_group(device, &gpu.env_layout, &env, &gpu.sampler);
            gpu.env = env;
            self.env_weight = 1.0;
        }
    }

    /// Publish this frame's matrices and material parameters.
    pub fn upload_uniforms(
        &self,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        model: Mat4,
        camera_pos: Vec3,
        base_color: Vec3,
    ) {
        let gpu = match &self.gpu {
            Some(gpu) => gpu,
            None => return,
        };
        let max_mip = (gpu.env.mip_count - 1) as f32;
        let uniforms = PortraitUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_pos: [camera_pos.x, camera_pos.y, camera_pos.z, 1.0],
            base_color: [base_color.x, base_color.y, base_color.z, self.roughness],
            env: [max_mip, self.env_weight, 0.0, 0.0],
        };
        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Publish the light rig.
    pub fn upload_lights(&self, queue: &wgpu::Queue, rig: &LightRig) {
        if let Some(gpu) = &self.gpu {
            queue.write_buffer(
                &gpu.lights_buffer,
                0,
                bytemuck::cast_slice(&[rig.to_uniform()]),
            );
        }
    }

    /// Record the portrait's draw into an open render pass.
    ///
    /// Draws nothing while the mesh is missing.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let gpu = match &self.gpu {
            Some(gpu) => gpu,
            None => return,
        };
        let mesh = match &gpu.mesh {
            Some(mesh) => mesh,
            None => return,
        };
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.uniform_bind_group, &[]);
        pass.set_bind_group(1, &gpu.env_bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    /// Destroy the GPU resources and end the entity's life. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            if let Some(mesh) = gpu.mesh {
                mesh.vertex_buffer.destroy();
                mesh.index_buffer.destroy();
            }
            gpu.uniform_buffer.destroy();
            gpu.lights_buffer.destroy();
            gpu.env.destroy();
            log::debug!("portrait model disposed");
        }
        self.state = EntityState::Disposed;
    }
}

fn create_env_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    env: &EnvironmentMap,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Portrait Environment Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&env.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

const _: () = assert!(std::mem::size_of::<PortraitUniforms>() == 176);
const _: () = assert!(std::mem::size_of::<ModelVertex>() == 24);

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> MeshData {
        MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_validate_accepts_triangle() {
        assert!(triangle_mesh().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_meshes() {
        let empty = MeshData::default();
        assert!(empty.validate().is_err());

        let mut mismatched = triangle_mesh();
        mismatched.normals.pop();
        assert!(mismatched.validate().is_err());

        let mut ragged = triangle_mesh();
        ragged.indices = vec![0, 1];
        assert!(ragged.validate().is_err());

        let mut out_of_range = triangle_mesh();
        out_of_range.indices = vec![0, 1, 9];
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_interleave_pairs_attributes() {
        let mesh = triangle_mesh();
        let vertices = mesh.interleave();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_new_portrait_is_empty() {
        let model = PortraitModel::new(0.4);
        assert_eq!(model.state(), EntityState::Constructed);
        assert!(!model.has_mesh());
        assert!(!model.has_environment());
        assert_eq!(model.buffer_count(), 0);
        assert!((model.roughness() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_roughness_is_clamped() {
        assert_eq!(PortraitModel::new(7.0).roughness(), 1.0);
        assert_eq!(PortraitModel::new(-1.0).roughness(), 0.0);
    }

    #[test]
    fn test_set_mesh_validates() {
        let mut model = PortraitModel::new(0.5);
        assert!(model.set_mesh(MeshData::default()).is_err());
        assert!(!model.has_mesh());

        assert!(model.set_mesh(triangle_mesh()).is_ok());
        assert!(model.has_mesh());
    }

    #[test]
    fn test_set_environment_stages_map() {
        let mut model = PortraitModel::new(0.5);
        model.set_environment(EnvironmentImage::solid([255, 255, 255, 255]));
        assert!(model.has_environment());
    }

    #[test]
    fn test_dispose_without_gpu_is_safe() {
        let mut model = PortraitModel::new(0.5);
        model.dispose();
        model.dispose();
        assert_eq!(model.state(), EntityState::Disposed);
        assert_eq!(model.buffer_count(), 0);
    }

    #[test]
    fn test_assets_after_dispose_are_dropped() {
        let mut model = PortraitModel::new(0.5);
        model.dispose();

        assert!(model.set_mesh(triangle_mesh()).is_ok());
        assert!(!model.has_mesh());

        model.set_environment(EnvironmentImage::solid([9, 9, 9, 255]));
        assert!(!model.has_environment());
    }
}
