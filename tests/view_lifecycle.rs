//! Headless lifecycle tests.
//!
//! Drive the CPU side of a scene the way a mounted view would, without a
//! window or GPU device: assets arrive over the loader channel, host
//! signals gate the animation loop, the pointer spring shapes rotation
//! and teardown is terminal.

use std::thread;
use std::time::Duration;

use glam::EulerRot;
use vitrine::input::PointerSpring;
use vitrine::particles::EntityState;
use vitrine::render_loop::{LoopDirective, RenderLoop};
use vitrine::{
    AssetError, AssetEvent, AssetLoader, AssetPayload, AssetRequest, AssetSource, MeshData,
    ParticleFieldConfig, PortraitConfig, Quat, Scene, SceneConfig, SceneView, Theme,
};

// ============================================================================
// Helpers
// ============================================================================

struct StubSource;

impl AssetSource for StubSource {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        if !path.ends_with(".png") {
            return Err(AssetError::Source(format!("unknown path {}", path)));
        }
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([90, 90, 120, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .map_err(AssetError::Decode)?;
        Ok(bytes)
    }

    fn load_mesh(&self, _path: &str) -> Result<MeshData, AssetError> {
        Ok(triangle_mesh())
    }
}

fn triangle_mesh() -> MeshData {
    MeshData {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        indices: vec![0, 1, 2],
    }
}

fn portrait_scene() -> Scene {
    let config = SceneConfig {
        portrait: Some(PortraitConfig {
            mesh_path: "bust.mesh".into(),
            environment_path: Some("studio.png".into()),
            roughness: 0.5,
        }),
        ..SceneConfig::default()
    };
    Scene::new(&config, &Theme::dark()).unwrap()
}

fn wait_for_event(loader: &mut AssetLoader) -> AssetEvent {
    for _ in 0..400 {
        if let Some(event) = loader.poll() {
            return event;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("no asset event within timeout");
}

// ============================================================================
// Asset flow
// ============================================================================

#[test]
fn test_assets_flow_from_loader_into_scene() {
    let mut scene = portrait_scene();
    let mut loader = AssetLoader::spawn(
        Box::new(StubSource),
        vec![
            AssetRequest::Mesh("bust.mesh".into()),
            AssetRequest::Environment("studio.png".into()),
        ],
    );

    scene.apply_asset(wait_for_event(&mut loader));
    scene.apply_asset(wait_for_event(&mut loader));

    let portrait = scene.portrait().unwrap();
    assert!(portrait.has_mesh());
    assert!(portrait.has_environment());
}

#[test]
fn test_invalid_mesh_is_rejected_quietly() {
    let mut scene = portrait_scene();
    let bad = MeshData {
        positions: vec![[0.0; 3]; 3],
        normals: vec![[0.0, 0.0, 1.0]; 2],
        indices: vec![0, 1, 2],
    };
    scene.apply_asset(AssetEvent {
        path: "bust.mesh".into(),
        payload: AssetPayload::Mesh(bad),
    });

    assert!(!scene.portrait().unwrap().has_mesh());
}

// ============================================================================
// Loop gating against scene updates
// ============================================================================

#[test]
fn test_hidden_view_stops_ticking_scene() {
    let mut scene = Scene::new(
        &SceneConfig {
            particles: Some(ParticleFieldConfig {
                seed: Some(11),
                ..ParticleFieldConfig::default()
            }),
            ..SceneConfig::default()
        },
        &Theme::dark(),
    )
    .unwrap();

    let mut looper = RenderLoop::new(true);
    looper.set_fixed_delta(Some(1.0 / 60.0));
    looper.start();

    for _ in 0..3 {
        let dt = looper.tick().expect("running loop should tick");
        scene.update(dt);
        assert!(looper.arm());
    }

    assert_eq!(looper.set_visible(false), LoopDirective::RenderOnce);
    assert_eq!(looper.tick(), None);

    assert_eq!(looper.set_visible(true), LoopDirective::Animate);
    assert!(looper.tick().is_some());
}

#[test]
fn test_reduced_motion_overrides_visibility() {
    let mut looper = RenderLoop::new(true);
    looper.start();

    looper.set_visible(false);
    assert_eq!(looper.set_reduced_motion(true), LoopDirective::None);

    // Showing the window is not enough while motion is reduced.
    assert_eq!(looper.set_visible(true), LoopDirective::None);
    assert!(!looper.is_running());

    assert_eq!(looper.set_reduced_motion(false), LoopDirective::Animate);
    assert!(looper.is_running());
}

// ============================================================================
// Pointer rotation
// ============================================================================

#[test]
fn test_pointer_at_right_edge_yaws_scene() {
    let mut scene = portrait_scene();
    let mut spring = PointerSpring::new();
    spring.set_pointer(800.0, 300.0, 800.0, 600.0);

    let mut rotation = Quat::IDENTITY;
    for _ in 0..600 {
        rotation = spring.step(1.0 / 60.0);
    }
    scene.set_rotation(rotation);

    assert!(spring.is_settled());
    let expected = Quat::from_euler(EulerRot::YXZ, 0.5 * 0.6, 0.0, 0.0);
    assert!(scene.rotation().dot(expected).abs() > 0.9999);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_dispose_is_terminal_for_late_assets() {
    let mut scene = portrait_scene();
    scene.dispose();
    assert_eq!(scene.portrait().unwrap().state(), EntityState::Disposed);

    // A loader thread may still deliver after teardown.
    scene.apply_asset(AssetEvent {
        path: "bust.mesh".into(),
        payload: AssetPayload::Mesh(triangle_mesh()),
    });
    assert!(!scene.portrait().unwrap().has_mesh());

    scene.dispose();
    assert_eq!(scene.portrait().unwrap().state(), EntityState::Disposed);
}

#[test]
fn test_unmounted_view_survives_signal_storm() {
    let mut view = SceneView::portrait(Theme::dark(), "bust.mesh")
        .with_environment("studio.png")
        .with_asset_source(StubSource);

    view.on_container_resized(1920, 1080);
    view.on_theme_changed(Theme::light());
    view.on_pointer_moved(5.0, 5.0);
    view.on_visibility_changed(false);
    view.on_motion_preference_changed(true);
    view.frame();
    view.unmount();

    assert!(!view.is_mounted());
    assert!(!view.is_animating());
}
