//! Host-facing scene views.
//!
//! [`SceneView`] ties a [`Scene`] to a window: it owns the GPU surface, the
//! animation loop, the pointer spring and the background asset loader, and
//! exposes the handful of signal methods a host forwards from its event
//! loop. Two presets cover the shipped scenes:
//!
//! ```ignore
//! use vitrine::{SceneView, Theme};
//!
//! let mut view = SceneView::backdrop(Theme::dark());
//! view.mount(window.clone())?;
//!
//! // In the event loop:
//! //   RedrawRequested       -> view.frame()
//! //   Resized(size)         -> view.on_container_resized(size.width, size.height)
//! //   CursorMoved(position) -> view.on_pointer_moved(x, y)
//! //   Occluded(hidden)      -> view.on_visibility_changed(!hidden)
//! ```
//!
//! A view mounts once. [`SceneView::unmount`] tears everything down in
//! order (loop, spring, loader, scene buffers, surface) and is safe to call
//! at any time; dropping the view does the same.

use std::sync::Arc;

use glam::Vec3;
use winit::window::Window;

use crate::assets::{AssetLoader, AssetRequest, AssetSource};
use crate::error::ViewError;
use crate::input::PointerSpring;
use crate::render_loop::{LoopDirective, RenderLoop};
use crate::renderer::Renderer;
use crate::scene::{ParticleFieldConfig, PortraitConfig, Scene, SceneConfig};
use crate::theme::Theme;

/// A mountable scene with its loop, input and loading plumbing.
pub struct SceneView {
    theme: Theme,
    config: SceneConfig,
    pointer_rotation: bool,
    source: Option<Box<dyn AssetSource>>,

    looper: RenderLoop,
    spring: PointerSpring,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Option<Scene>,
    loader: Option<AssetLoader>,
    /// A one-shot render was requested while the loop is idle.
    static_render_pending: bool,
}

impl SceneView {
    /// An ambient particle backdrop.
    ///
    /// Keeps animating while the window is covered, so reveals never show a
    /// stale frame. Pointer input is ignored.
    pub fn backdrop(theme: Theme) -> Self {
        let config = SceneConfig {
            particles: Some(ParticleFieldConfig::default()),
            ..SceneConfig::default()
        };
        Self::with_config(theme, config, false, false)
    }

    /// A lit portrait model that leans toward the pointer.
    ///
    /// Pauses animation while the window is covered. The mesh at
    /// `mesh_path` is fetched through the asset source supplied via
    /// [`with_asset_source`](Self::with_asset_source).
    pub fn portrait(theme: Theme, mesh_path: impl Into<String>) -> Self {
        let config = SceneConfig {
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            fov_y: 35.0_f32.to_radians(),
            portrait: Some(PortraitConfig {
                mesh_path: mesh_path.into(),
                environment_path: None,
                roughness: 0.35,
            }),
            ..SceneConfig::default()
        };
        Self::with_config(theme, config, true, true)
    }

    /// Build a view from an explicit scene configuration.
    pub fn with_config(
        theme: Theme,
        config: SceneConfig,
        gate_on_visibility: bool,
        pointer_rotation: bool,
    ) -> Self {
        Self {
            theme,
            config,
            pointer_rotation,
            source: None,
            looper: RenderLoop::new(gate_on_visibility),
            spring: PointerSpring::new(),
            window: None,
            renderer: None,
            scene: None,
            loader: None,
            static_render_pending: false,
        }
    }

    /// Supply the source assets are loaded from.
    pub fn with_asset_source(mut self, source: impl AssetSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Override the particle count. Adds a default field to a scene that
    /// had none.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.config
            .particles
            .get_or_insert_with(ParticleFieldConfig::default)
            .count = count;
        self
    }

    /// Seed the particle field for a reproducible layout.
    pub fn with_field_seed(mut self, seed: u64) -> Self {
        self.config
            .particles
            .get_or_insert_with(ParticleFieldConfig::default)
            .seed = Some(seed);
        self
    }

    /// Override the edge length of the cube particles scatter in.
    pub fn with_spread(mut self, spread: f32) -> Self {
        self.config
            .particles
            .get_or_insert_with(ParticleFieldConfig::default)
            .spread = spread;
        self
    }

    /// Add an environment reflection map to a portrait scene. Ignored for
    /// scenes without a portrait.
    pub fn with_environment(mut self, path: impl Into<String>) -> Self {
        match &mut self.config.portrait {
            Some(portrait) => portrait.environment_path = Some(path.into()),
            None => log::warn!("environment path set on a scene without a portrait"),
        }
        self
    }

    /// Override the portrait surface roughness. Ignored for scenes without
    /// a portrait.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        match &mut self.config.portrait {
            Some(portrait) => portrait.roughness = roughness,
            None => log::warn!("roughness set on a scene without a portrait"),
        }
        self
    }

    /// Place the camera.
    pub fn with_camera_position(mut self, position: Vec3) -> Self {
        self.config.camera_position = position;
        self
    }

    /// Enable or disable pointer-driven rotation.
    pub fn with_pointer_rotation(mut self, enabled: bool) -> Self {
        self.pointer_rotation = enabled;
        self
    }

    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[inline]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.looper.is_running()
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.looper.fps()
    }

    /// Device pixel ratio of the mounted window, or 1.0 before mount.
    pub fn pixel_ratio(&self) -> f64 {
        self.renderer.as_ref().map_or(1.0, |r| r.pixel_ratio())
    }

    #[inline]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Bring the view up on a window.
    ///
    /// Builds the scene, acquires the GPU surface, uploads static buffers,
    /// kicks off asset loading and starts the animation loop. On failure
    /// everything created so far is torn down before the error is
    /// returned. Mounting an already mounted view is a no-op.
    pub fn mount(&mut self, window: Arc<Window>) -> Result<(), ViewError> {
        if self.is_mounted() {
            log::debug!("view already mounted");
            return Ok(());
        }
        log::info!("mounting scene view");
        let result = self.mount_inner(window);
        if let Err(error) = &result {
            log::error!("mount failed: {error}");
            self.unmount();
        }
        result
    }

    fn mount_inner(&mut self, window: Arc<Window>) -> Result<(), ViewError> {
        let mut scene = Scene::new(&self.config, &self.theme)?;
        let renderer = pollster::block_on(Renderer::new(window.clone()))?;
        let (width, height) = renderer.size();
        scene.set_viewport(width, height);
        scene.attach(&renderer);

        if let Some(portrait) = &self.config.portrait {
            if let Some(source) = self.source.take() {
                let mut requests = vec![AssetRequest::Mesh(portrait.mesh_path.clone())];
                if let Some(env) = &portrait.environment_path {
                    requests.push(AssetRequest::Environment(env.clone()));
                }
                self.loader = Some(AssetLoader::spawn(source, requests));
            } else {
                log::warn!("portrait scene has no asset source, mesh will not load");
            }
        }

        self.scene = Some(scene);
        self.renderer = Some(renderer);
        self.window = Some(window);

        let directive = self.looper.start();
        self.apply_directive(directive);
        Ok(())
    }

    /// Tear the view down. Idempotent.
    ///
    /// Stops the loop first so any already queued frame callback becomes a
    /// no-op, then releases the loader channel, destroys scene buffers and
    /// drops the surface.
    pub fn unmount(&mut self) {
        if self.is_mounted() {
            log::info!("unmounting scene view");
        }
        self.looper.stop();
        self.spring.stop();
        self.loader = None;
        if let Some(scene) = &mut self.scene {
            scene.dispose();
        }
        self.scene = None;
        self.renderer = None;
        self.window = None;
        self.static_render_pending = false;
    }

    /// Drive one frame. Call on every redraw event.
    ///
    /// Drains asset arrivals, then either advances and renders an animation
    /// tick (re-requesting a redraw while the loop runs) or renders the
    /// single pending static frame. Does nothing when neither applies.
    pub fn frame(&mut self) {
        let mut asset_arrived = false;
        if let (Some(loader), Some(scene)) = (&mut self.loader, &mut self.scene) {
            while let Some(event) = loader.poll() {
                scene.apply_asset(event);
                asset_arrived = true;
            }
        }
        // A gated view still shows newly arrived assets.
        if asset_arrived && !self.looper.is_running() {
            self.schedule_static_render();
        }

        if let Some(delta) = self.looper.tick() {
            if self.pointer_rotation {
                let rotation = self.spring.step(delta);
                if let Some(scene) = &mut self.scene {
                    scene.set_rotation(rotation);
                }
            }
            if let Some(scene) = &mut self.scene {
                scene.update(delta);
            }
            self.static_render_pending = false;
            self.render_frame();
            if self.looper.arm() {
                self.request_redraw();
            }
        } else if self.static_render_pending {
            self.static_render_pending = false;
            self.render_frame();
        }
    }

    /// The drawable area changed size.
    pub fn on_container_resized(&mut self, width: u32, height: u32) {
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(width, height);
        }
        if let Some(scene) = &mut self.scene {
            scene.set_viewport(width, height);
        }
        let directive = self.looper.refresh();
        self.apply_directive(directive);
    }

    /// Swap the color theme. Cheap: only uniforms and the clear color
    /// change, no buffers are rebuilt.
    pub fn on_theme_changed(&mut self, theme: Theme) {
        self.theme = theme;
        if let Some(scene) = &mut self.scene {
            scene.apply_theme(&self.theme);
        }
        let directive = self.looper.refresh();
        self.apply_directive(directive);
    }

    /// The reduced-motion preference changed.
    pub fn on_motion_preference_changed(&mut self, reduced: bool) {
        let directive = self.looper.set_reduced_motion(reduced);
        if !self.looper.is_running() {
            self.spring.stop();
        }
        self.apply_directive(directive);
    }

    /// The window was covered or revealed.
    pub fn on_visibility_changed(&mut self, visible: bool) {
        let directive = self.looper.set_visible(visible);
        if !self.looper.is_running() {
            self.spring.stop();
        }
        self.apply_directive(directive);
    }

    /// Feed a pointer position in physical window coordinates.
    ///
    /// Ignored unless pointer rotation is enabled and the loop is running,
    /// so a paused scene never banks motion to replay later.
    pub fn on_pointer_moved(&mut self, x: f32, y: f32) {
        if !self.pointer_rotation || !self.looper.is_running() {
            return;
        }
        if let Some(scene) = &self.scene {
            let (width, height) = scene.viewport();
            self.spring.set_pointer(x, y, width as f32, height as f32);
        }
    }

    fn apply_directive(&mut self, directive: LoopDirective) {
        match directive {
            LoopDirective::None => {}
            LoopDirective::Animate => self.request_redraw(),
            LoopDirective::RenderOnce => self.schedule_static_render(),
        }
    }

    fn schedule_static_render(&mut self) {
        if self.renderer.is_some() {
            self.static_render_pending = true;
            self.request_redraw();
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn render_frame(&mut self) {
        let result = match (&mut self.scene, &self.renderer) {
            (Some(scene), Some(renderer)) => scene.render(renderer),
            _ => return,
        };
        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                if let Some(renderer) = &mut self.renderer {
                    renderer.reconfigure();
                }
                self.schedule_static_render();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, unmounting view");
                self.unmount();
            }
            Err(error) => log::warn!("frame skipped: {error:?}"),
        }
    }
}

impl Drop for SceneView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backdrop_preset_defaults() {
        let view = SceneView::backdrop(Theme::dark());
        let particles = view.config().particles.as_ref().unwrap();
        assert_eq!(particles.count, 800);
        assert!(view.config().portrait.is_none());
        assert!(!view.is_mounted());
        assert!(!view.is_animating());
    }

    #[test]
    fn test_portrait_preset_defaults() {
        let view = SceneView::portrait(Theme::dark(), "assets/bust.bin");
        let portrait = view.config().portrait.as_ref().unwrap();
        assert_eq!(portrait.mesh_path, "assets/bust.bin");
        assert!(portrait.environment_path.is_none());
        assert!(view.config().particles.is_none());
    }

    #[test]
    fn test_builders_update_config() {
        let view = SceneView::backdrop(Theme::light())
            .with_particle_count(2000)
            .with_field_seed(7)
            .with_spread(25.0)
            .with_camera_position(Vec3::new(0.0, 1.0, 20.0));
        let particles = view.config().particles.as_ref().unwrap();
        assert_eq!(particles.count, 2000);
        assert_eq!(particles.seed, Some(7));
        assert_eq!(particles.spread, 25.0);
        assert_eq!(view.config().camera_position.z, 20.0);
    }

    #[test]
    fn test_particle_builder_adds_field_to_portrait() {
        let view = SceneView::portrait(Theme::dark(), "assets/bust.bin").with_particle_count(100);
        assert!(view.config().particles.is_some());
        assert!(view.config().portrait.is_some());
    }

    #[test]
    fn test_environment_builder_requires_portrait() {
        let view = SceneView::backdrop(Theme::dark()).with_environment("assets/studio.png");
        assert!(view.config().portrait.is_none());

        let view = SceneView::portrait(Theme::dark(), "assets/bust.bin")
            .with_environment("assets/studio.png")
            .with_roughness(0.8);
        let portrait = view.config().portrait.as_ref().unwrap();
        assert_eq!(portrait.environment_path.as_deref(), Some("assets/studio.png"));
        assert_eq!(portrait.roughness, 0.8);
    }

    #[test]
    fn test_signals_before_mount_are_safe() {
        let mut view = SceneView::portrait(Theme::dark(), "assets/bust.bin");
        view.on_container_resized(640, 480);
        view.on_theme_changed(Theme::light());
        view.on_motion_preference_changed(true);
        view.on_visibility_changed(false);
        view.on_pointer_moved(10.0, 10.0);
        view.frame();
        assert!(!view.is_mounted());
        assert!(!view.is_animating());
        assert_eq!(view.theme().id, crate::theme::ThemeId::Light);
    }

    #[test]
    fn test_unmount_before_mount_is_safe() {
        let mut view = SceneView::backdrop(Theme::dark());
        view.unmount();
        view.unmount();
        assert!(!view.is_mounted());
    }
}
