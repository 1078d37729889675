//! WGSL validation for the built-in shaders.
//!
//! Parses and validates both shader modules with naga, the same frontend
//! wgpu uses, so a malformed shader fails here instead of at pipeline
//! creation inside a host.

use vitrine::shader::{PARTICLE_SHADER, PORTRAIT_SHADER};

/// Validates WGSL code using naga.
fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn entry_points(module: &naga::Module) -> Vec<&str> {
    module
        .entry_points
        .iter()
        .map(|ep| ep.name.as_str())
        .collect()
}

#[test]
fn test_particle_shader_validates() {
    let module = validate_wgsl(PARTICLE_SHADER).expect("particle shader should be valid");
    let entries = entry_points(&module);
    assert!(entries.contains(&"vs_main"));
    assert!(entries.contains(&"fs_main"));
}

#[test]
fn test_portrait_shader_validates() {
    let module = validate_wgsl(PORTRAIT_SHADER).expect("portrait shader should be valid");
    let entries = entry_points(&module);
    assert!(entries.contains(&"vs_main"));
    assert!(entries.contains(&"fs_main"));
}

#[test]
fn test_particle_shader_interpolates_per_instance() {
    assert!(PARTICLE_SHADER.contains("fract"));
    assert!(PARTICLE_SHADER.contains("orientation_start"));
    assert!(PARTICLE_SHADER.contains("orientation_end"));
    assert!(PARTICLE_SHADER.contains("time_offset"));
}

#[test]
fn test_portrait_shader_samples_environment_by_roughness() {
    assert!(PORTRAIT_SHADER.contains("textureSampleLevel"));
    assert!(PORTRAIT_SHADER.contains("atan2"));
    assert!(PORTRAIT_SHADER.contains("reflect"));
}
