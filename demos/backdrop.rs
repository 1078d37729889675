//! Drifting particle backdrop demo
//!
//! Run with: cargo run --example backdrop
//!
//! Keys: T toggles the theme, M toggles a simulated reduced-motion
//! preference, Escape quits. Covering the window does not pause a
//! backdrop, so it is still moving when revealed.

use std::sync::Arc;

use vitrine::{SceneView, Theme, ThemeId};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

struct App {
    window: Option<Arc<Window>>,
    view: SceneView,
    reduced_motion: bool,
    shown_fps: u32,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            view: SceneView::backdrop(Theme::dark()).with_particle_count(1200),
            reduced_motion: false,
            shown_fps: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("vitrine - backdrop")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

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
                KeyCode::KeyM => {
                    self.reduced_motion = !self.reduced_motion;
                    self.view.on_motion_preference_changed(self.reduced_motion);
                }
                KeyCode::Escape => {
                    self.view.unmount();
                    event_loop.exit();
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.view.frame();
                let fps = self.view.fps().round() as u32;
                if fps != self.shown_fps {
                    self.shown_fps = fps;
                    if let Some(window) = &self.window {
                        window.set_title(&format!("vitrine - backdrop ({fps} fps)"));
                    }
                }
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
