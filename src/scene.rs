//! Scene composition.
//!
//! A [`Scene`] owns the camera, light rig, and whichever entities its
//! config asked for: a particle field, a portrait model, or both. It is
//! built entirely on the CPU; [`Scene::attach`] later creates the GPU
//! resources. That split keeps scene behavior testable without a device.

use glam::{Mat4, Quat, Vec3};

use crate::assets::{AssetEvent, AssetPayload};
use crate::camera::Camera;
use crate::error::ConfigError;
use crate::lights::LightRig;
use crate::model::PortraitModel;
use crate::particles::ParticleSystem;
use crate::renderer::Renderer;
use crate::theme::Theme;

/// Particle field parameters.
#[derive(Debug, Clone)]
pub struct ParticleFieldConfig {
    /// Number of instances. Must be positive.
    pub count: u32,
    /// Edge length of the cube offsets are drawn from.
    pub spread: f32,
    /// Half-extent of the template triangle.
    pub size: f32,
    /// Fixed seed for reproducible fields.
    pub seed: Option<u64>,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            count: 800,
            spread: 10.0,
            size: 0.35,
            seed: None,
        }
    }
}

/// Portrait model parameters.
#[derive(Debug, Clone)]
pub struct PortraitConfig {
    /// Asset path of the mesh, resolved by the host's asset source.
    pub mesh_path: String,
    /// Asset path of the equirectangular environment map, if any.
    pub environment_path: Option<String>,
    /// Surface roughness in `[0, 1]`.
    pub roughness: f32,
}

/// Full scene description.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub particles: Option<ParticleFieldConfig>,
    pub portrait: Option<PortraitConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(0.0, 0.0, 12.0),
            camera_target: Vec3::ZERO,
            fov_y: 50.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            particles: None,
            portrait: None,
        }
    }
}

/// The assembled scene.
pub struct Scene {
    camera: Camera,
    lights: LightRig,
    clear_color: wgpu::Color,
    /// Theme primary color, used as the portrait base color.
    accent: Vec3,
    rotation: Quat,
    particles: Option<ParticleSystem>,
    portrait: Option<PortraitModel>,
    viewport: (u32, u32),
}

impl Scene {
    /// Build the CPU side of a scene.
    pub fn new(config: &SceneConfig, theme: &Theme) -> Result<Self, ConfigError> {
        let particles = match &config.particles {
            Some(pf) => {
                let palette = theme.particle_palette();
                let system = match pf.seed {
                    Some(seed) => {
                        ParticleSystem::new_seeded(pf.count, pf.spread, pf.size, palette, seed)?
                    }
                    None => ParticleSystem::new(pf.count, pf.spread, pf.size, palette)?,
                };
                Some(system)
            }
            None => None,
        };

        let portrait = config
            .portrait
            .as_ref()
            .map(|pc| PortraitModel::new(pc.roughness));

        Ok(Self {
            camera: Camera::new(
                config.camera_position,
                config.camera_target,
                config.fov_y,
                config.near,
                config.far,
            ),
            lights: LightRig::for_theme(theme),
            clear_color: theme.clear_color(),
            accent: theme.primary,
            rotation: Quat::IDENTITY,
            particles,
            portrait,
            viewport: (0, 0),
        })
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    #[inline]
    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Set the model rotation consumed by both entities this frame.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    #[inline]
    pub fn particles(&self) -> Option<&ParticleSystem> {
        self.particles.as_ref()
    }

    #[inline]
    pub fn portrait(&self) -> Option<&PortraitModel> {
        self.portrait.as_ref()
    }

    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Propagate a viewport size to the camera. Zero sizes are ignored by
    /// the camera but remembered for pointer normalization.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
    }

    /// Swap in a new theme.
    ///
    /// Only colors and light levels change: entity geometry, instance
    /// attributes, camera state, and the animation clock are untouched.
    pub fn apply_theme(&mut self, theme: &Theme) {
        self.lights = LightRig::for_theme(theme);
        self.clear_color = theme.clear_color();
        self.accent = theme.primary;
        log::debug!("theme applied: {:?}", theme.id);
    }

    /// Feed an asset arrival to the portrait.
    ///
    /// Rejected payloads are logged and dropped; the scene keeps rendering
    /// whatever it already has.
    pub fn apply_asset(&mut self, event: AssetEvent) {
        let portrait = match &mut self.portrait {
            Some(portrait) => portrait,
            None => {
                log::warn!("asset '{}' arrived for a scene without a portrait", event.path);
                return;
            }
        };
        match event.payload {
            AssetPayload::Mesh(mesh) => {
                if let Err(e) = portrait.set_mesh(mesh) {
                    log::warn!("mesh '{}' rejected: {}", event.path, e);
                }
            }
            AssetPayload::Environment(env) => portrait.set_environment(env),
        }
    }

    /// Advance animation state by one frame.
    pub fn update(&mut self, dt: f32) {
        if let Some(particles) = &mut self.particles {
            particles.update(dt);
        }
    }

    /// Create GPU resources for every entity.
    pub fn attach(&mut self, renderer: &Renderer) {
        let device = renderer.device();
        let format = renderer.surface_format();
        if let Some(particles) = &mut self.particles {
            particles.attach(device, format);
        }
        if let Some(portrait) = &mut self.portrait {
            portrait.attach(device, renderer.queue(), format);
        }
    }

    /// Render one frame.
    ///
    /// Uploads this frame's uniforms, then draws the portrait (opaque)
    /// before the particles (blended) inside one pass.
    pub fn render(&mut self, renderer: &Renderer) -> Result<(), wgpu::SurfaceError> {
        let device = renderer.device();
        let queue = renderer.queue();

        if let Some(portrait) = &mut self.portrait {
            portrait.sync(device, queue);
        }

        let view_proj = self.camera.view_projection();
        let model = Mat4::from_quat(self.rotation);

        if let Some(particles) = &self.particles {
            particles.upload_uniforms(queue, view_proj, model);
        }
        if let Some(portrait) = &self.portrait {
            portrait.upload_uniforms(queue, view_proj, model, self.camera.position, self.accent);
            portrait.upload_lights(queue, &self.lights);
        }

        let output = renderer.acquire()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: renderer.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(portrait) = &self.portrait {
                portrait.draw(&mut pass);
            }
            if let Some(particles) = &self.particles {
                particles.draw(&mut pass);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Release every entity's GPU resources. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(particles) = &mut self.particles {
            particles.dispose();
        }
        if let Some(portrait) = &mut self.portrait {
            portrait.dispose();
        }
    }

    /// Total live GPU buffers across all entities.
    pub fn buffer_count(&self) -> u32 {
        self.particles.as_ref().map_or(0, |p| p.buffer_count())
            + self.portrait.as_ref().map_or(0, |m| m.buffer_count())
    }
}
