//! Lit portrait viewer demo
//!
//! Run with: cargo run --example portrait
//!
//! The mesh and environment map are generated in memory, so the demo
//! needs no files on disk. Move the pointer to make the model lean
//! toward it; T toggles the theme, Escape quits. Covering the window
//! pauses the animation.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use vitrine::prelude::*;
use vitrine::AssetError;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Serves a generated sphere mesh and a gradient environment map,
/// standing in for files a real host would ship.
struct ProceduralAssets;

impl AssetSource for ProceduralAssets {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        if path != "studio.png" {
            return Err(AssetError::Source(format!("unknown asset: {path}")));
        }
        // Bright band overhead fading toward the floor, slightly blue.
        let mut image = RgbaImage::new(64, 32);
        for (_, y, pixel) in image.enumerate_pixels_mut() {
            let t = 1.0 - y as f32 / 31.0;
            let value = 40.0 + 215.0 * t * t;
            *pixel = Rgba([
                value as u8,
                value as u8,
                (value * 1.05).min(255.0) as u8,
                255,
            ]);
        }
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(AssetError::Decode)?;
        Ok(bytes)
    }

    fn load_mesh(&self, path: &str) -> Result<MeshData, AssetError> {
        if path != "bust.mesh" {
            return Err(AssetError::Source(format!("unknown asset: {path}")));
        }
        Ok(uv_sphere(48, 24, 1.0))
    }
}

/// UV sphere with outward normals and counter-clockwise winding.
fn uv_sphere(segments: u32, rings: u32, radius: f32) -> MeshData {
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        for segment in 0..=segments {
            let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
            let normal = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            mesh.positions.push([
                normal[0] * radius,
                normal[1] * radius,
                normal[2] * radius,
            ]);
            mesh.normals.push(normal);
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    mesh
}

struct App {
    window: Option<Arc<Window>>,
    view: SceneView,
}

impl App {
    fn new() -> Self {
        let view = SceneView::portrait(Theme::dark(), "bust.mesh")
            .with_environment("studio.png")
            .with_roughness(0.4)
            .with_asset_source(ProceduralAssets);
        Self { window: None, view }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("vitrine - portrait")
                .with_inner_size(winit::dpi::LogicalSize::new(900, 900));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            self.window = Some(window.clone());
            self.view.mount(window).unwrap();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.view.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.view.on_container_resized(size.width, size.height);
            }
            WindowEvent::Occluded(hidden) => {
                self.view.on_visibility_changed(!hidden);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.view.on_pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match code {
                KeyCode::KeyT => {
                    let next = match self.view.theme().id {
                        ThemeId::Dark => Theme::light(),
                        ThemeId::Light => Theme::dark(),
                    };
                    self.view.on_theme_changed(next);
                }
                KeyCode::Escape => {
                    self.view.unmount();
                    event_loop.exit();
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.view.frame();
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new().unwrap();
    let mut app = App::new();
    event_loop.run_app(&mut app).unwrap();
}
