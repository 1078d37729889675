//! # Vitrine - Ambient 3D Scene Widgets
//!
//! Small animated 3D scenes for application chrome: a drifting particle
//! backdrop and a lit portrait viewer, rendered with wgpu inside a window
//! the host owns.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vitrine::prelude::*;
//!
//! let mut view = SceneView::backdrop(Theme::dark())
//!     .with_particle_count(1200);
//! view.mount(window.clone())?;
//! ```
//!
//! The host keeps its own event loop and forwards signals:
//!
//! | Event | Call |
//! |-------|------|
//! | `RedrawRequested` | [`SceneView::frame`] |
//! | `Resized` | [`SceneView::on_container_resized`] |
//! | `CursorMoved` | [`SceneView::on_pointer_moved`] |
//! | `Occluded` | [`SceneView::on_visibility_changed`] |
//! | theme switch | [`SceneView::on_theme_changed`] |
//! | motion preference | [`SceneView::on_motion_preference_changed`] |
//!
//! ## Core Concepts
//!
//! ### Views
//!
//! A [`SceneView`] owns everything one scene needs: the GPU surface, the
//! animation loop, pointer smoothing and background asset loading. It
//! mounts onto a window once and tears down deterministically on
//! [`SceneView::unmount`] or on drop. All GPU buffers are destroyed
//! eagerly at unmount rather than waiting for garbage collection of
//! handles.
//!
//! ### Scenes
//!
//! A [`Scene`](scene::Scene) composes up to two entities. The particle
//! field scatters instanced triangles through a cube and cycles each one
//! along a per-instance path with its own tumble, all driven by a single
//! time value. The portrait draws an indexed mesh with ambient plus
//! directional lighting and an optional equirectangular reflection map,
//! and leans toward the pointer on a critically damped spring.
//!
//! ### Animation gating
//!
//! Continuous animation runs only while the host allows it. A
//! reduced-motion preference always pauses it; covering the window pauses
//! views that opt into visibility gating. A paused view still renders a
//! single static frame on resize, theme change or asset arrival, so the
//! screen never goes stale.
//!
//! ### Assets
//!
//! Meshes and environment maps load through an [`AssetSource`] on a named
//! background thread and apply at the next frame boundary. A failed load
//! is logged and skipped; the scene keeps rendering whatever it has.
//!
//! ### Themes
//!
//! A [`Theme`] carries the palette and light intensities for one visual
//! mode. Switching themes rewrites uniforms and the clear color; no
//! buffer or pipeline is rebuilt, so it is cheap enough to do on every
//! system theme flip.

pub mod assets;
pub mod attributes;
pub mod camera;
pub mod environment;
pub mod error;
pub mod input;
pub mod lights;
pub mod model;
pub mod particles;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod theme;
pub mod time;
pub mod view;

pub use assets::{AssetEvent, AssetLoader, AssetPayload, AssetRequest, AssetSource};
pub use bytemuck;
pub use error::{AssetError, ConfigError, GpuError, ViewError};
pub use glam::{Quat, Vec2, Vec3, Vec4};
pub use model::MeshData;
pub use scene::{ParticleFieldConfig, PortraitConfig, Scene, SceneConfig};
pub use theme::{Theme, ThemeId};
pub use view::SceneView;

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use vitrine::prelude::*;
/// ```
///
/// This imports:
/// - [`SceneView`] - the mountable view and its builders
/// - [`Theme`], [`ThemeId`] - visual modes
/// - [`SceneConfig`] and the per-entity configs
/// - [`AssetSource`], [`MeshData`] - asset loading
/// - [`ViewError`] - the mount error type
/// - [`Vec2`], [`Vec3`], [`Vec4`] - glam vector types
pub mod prelude {
    pub use crate::assets::{AssetRequest, AssetSource};
    pub use crate::error::ViewError;
    pub use crate::model::MeshData;
    pub use crate::render_loop::{LoopDirective, LoopState};
    pub use crate::scene::{ParticleFieldConfig, PortraitConfig, SceneConfig};
    pub use crate::theme::{Theme, ThemeId};
    pub use crate::view::SceneView;
    pub use crate::{Vec2, Vec3, Vec4};
}
