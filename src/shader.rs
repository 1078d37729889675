//! WGSL programs for the particle field and the portrait model.
//!
//! Shaders are plain string constants compiled at pipeline creation. The
//! animation math that runs per vertex also exists here as small CPU
//! functions so its behavior can be pinned down in tests without a GPU.

use glam::{Quat, Vec3};

/// Instanced particle shader.
///
/// Each instance animates along a looping life cycle: position slides from
/// the instance offset toward the template vertex while the orientation
/// blends between the two instance quaternions. Fragment alpha fades with
/// depth and pulses with the life phase.
pub const PARTICLE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    time: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) offset: vec3<f32>,
    @location(2) time_offset: f32,
    @location(3) color: vec4<f32>,
    @location(4) orientation_start: vec4<f32>,
    @location(5) orientation_end: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) life: f32,
}

// Rotate v by the unit quaternion stored in q (xyz = vector part, w = scalar).
fn rotate_by(q: vec4<f32>, v: vec3<f32>) -> vec3<f32> {
    return v + 2.0 * cross(q.xyz, cross(q.xyz, v) + q.w * v);
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let life = fract(uniforms.time.x + in.time_offset);
    let q = normalize(mix(in.orientation_start, in.orientation_end, life));
    let local = mix(in.offset, in.position, life);
    let world = rotate_by(q, local);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * uniforms.model * vec4<f32>(world, 1.0);
    out.color = in.color;
    out.life = life;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let fade = clamp(in.clip_position.z, 0.2, 1.0);
    let alpha = fade * sin(in.life * 100.0);
    return vec4<f32>(in.color.rgb, in.color.a * alpha);
}
"#;

/// Lit portrait shader.
///
/// Ambient plus one directional light, with an equirectangular environment
/// reflection sampled at a mip level chosen by surface roughness.
pub const PORTRAIT_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // rgb = base color, w = roughness
    base_color: vec4<f32>,
    // x = highest mip level, y = environment weight
    env: vec4<f32>,
}

struct Lights {
    // rgb = color, w = intensity
    ambient: vec4<f32>,
    // xyz = direction the light travels, normalized
    sun_dir: vec4<f32>,
    // rgb = color, w = intensity
    sun_color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
@group(0) @binding(1)
var<uniform> lights: Lights;

@group(1) @binding(0)
var env_map: texture_2d<f32>;
@group(1) @binding(1)
var env_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = uniforms.model * vec4<f32>(in.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normalize((uniforms.model * vec4<f32>(in.normal, 0.0)).xyz);
    return out;
}

const PI: f32 = 3.14159265358979;
const TAU: f32 = 6.28318530717959;

fn equirect_uv(dir: vec3<f32>) -> vec2<f32> {
    let u = atan2(dir.z, dir.x) / TAU + 0.5;
    let v = acos(clamp(dir.y, -1.0, 1.0)) / PI;
    return vec2<f32>(u, v);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let view = normalize(uniforms.camera_pos.xyz - in.world_pos);

    let ambient = lights.ambient.rgb * lights.ambient.w;
    let diffuse = max(dot(n, -lights.sun_dir.xyz), 0.0) * lights.sun_color.rgb * lights.sun_color.w;

    let roughness = uniforms.base_color.w;
    let level = roughness * uniforms.env.x;
    let reflected = reflect(-view, n);
    let reflection = textureSampleLevel(env_map, env_sampler, equirect_uv(reflected), level).rgb;

    let lit = uniforms.base_color.rgb * (ambient + diffuse);
    let color = lit + reflection * uniforms.env.y * (1.0 - roughness);
    return vec4<f32>(color, 1.0);
}
"#;

/// CPU mirror of the shader's life phase: `fract(time + time_offset)`.
///
/// Matches WGSL `fract`, which is `x - floor(x)` and therefore lands in
/// `[0, 1)` for negative inputs too.
#[inline]
pub fn life_progress(time: f32, time_offset: f32) -> f32 {
    let x = time + time_offset;
    x - x.floor()
}

/// CPU mirror of the shader's orientation blend: componentwise lerp
/// followed by normalization.
///
/// Deliberately does not shortest-path the interpolation, matching the
/// shader's `normalize(mix(a, b, t))` exactly.
#[inline]
pub fn nlerp(a: Quat, b: Quat, t: f32) -> Quat {
    Quat::from_xyzw(
        a.x + (b.x - a.x) * t,
        a.y + (b.y - a.y) * t,
        a.z + (b.z - a.z) * t,
        a.w + (b.w - a.w) * t,
    )
    .normalize()
}

/// CPU mirror of the shader's quaternion rotation.
#[inline]
pub fn rotate_by(q: Quat, v: Vec3) -> Vec3 {
    let qv = Vec3::new(q.x, q.y, q.z);
    v + 2.0 * qv.cross(qv.cross(v) + q.w * v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::EulerRot;

    #[test]
    fn test_life_progress_wraps_into_unit_range() {
        assert_eq!(life_progress(0.0, 0.25), 0.25);
        assert!((life_progress(1.75, 0.5) - 0.25).abs() < 1e-6);
        assert!((life_progress(3.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_life_progress_handles_negative_time() {
        // The uniform is sin(clock) and goes negative every half cycle.
        let p = life_progress(-0.25, 0.0);
        assert!((0.0..1.0).contains(&p));
        assert!((p - 0.75).abs() < 1e-6);

        for i in 0..100 {
            let t = -10.0 + i as f32 * 0.37;
            let p = life_progress(t, 0.61);
            assert!((0.0..1.0).contains(&p), "life({}) = {}", t, p);
        }
    }

    #[test]
    fn test_nlerp_endpoints() {
        let a = Quat::from_euler(EulerRot::YXZ, 0.3, 0.1, 0.0);
        let b = Quat::from_euler(EulerRot::YXZ, -1.2, 0.8, 0.4);

        let at_start = nlerp(a, b, 0.0);
        let at_end = nlerp(a, b, 1.0);
        assert!(at_start.abs_diff_eq(a, 1e-5));
        assert!(at_end.abs_diff_eq(b, 1e-5));
    }

    #[test]
    fn test_nlerp_output_is_unit_length() {
        let a = Quat::from_euler(EulerRot::YXZ, 0.9, -0.4, 0.0);
        let b = Quat::from_euler(EulerRot::YXZ, -0.3, 1.1, 0.7);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let q = nlerp(a, b, t);
            assert!((q.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_nlerp_does_not_flip_hemisphere() {
        // Straight componentwise blend: blending a quaternion toward its
        // negation passes near zero rather than taking the short path.
        let a = Quat::from_xyzw(0.0, 0.0, 0.0, 1.0);
        let b = Quat::from_xyzw(0.0, 0.0, 0.0, -1.0);
        let q = nlerp(a, b, 0.25);
        assert!(q.w > 0.0);
        let q = nlerp(a, b, 0.75);
        assert!(q.w < 0.0);
    }

    #[test]
    fn test_rotate_by_matches_glam() {
        let q = Quat::from_euler(EulerRot::YXZ, 0.7, -0.2, 0.5);
        let v = Vec3::new(1.0, 2.0, -3.0);
        let ours = rotate_by(q, v);
        let glams = q * v;
        assert!(ours.abs_diff_eq(glams, 1e-4), "{} vs {}", ours, glams);
    }

    #[test]
    fn test_rotate_by_identity_is_noop() {
        let v = Vec3::new(0.5, -1.5, 2.5);
        assert!(rotate_by(Quat::IDENTITY, v).abs_diff_eq(v, 1e-6));
    }
}
