//! Per-instance attribute generation for the particle field.
//!
//! Every particle instance is described by five randomized attributes fixed
//! at construction time: a spatial offset inside a cube, a phase offset into
//! the shared animation cycle, a palette color, and a pair of unit
//! quaternions the vertex shader interpolates between. Attributes are kept
//! in structure-of-arrays form on the CPU so they can be inspected and
//! regenerated cheaply, and packed into an interleaved buffer only at
//! upload time.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;

/// Vertices in the shared template triangle.
pub const TEMPLATE_VERTEX_COUNT: u32 = 3;

/// A vertex of the template triangle all instances share.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TemplateVertex {
    pub position: [f32; 3],
}

/// Template triangle with half-extent `size`, centered on the origin in the
/// XY plane.
pub fn template_triangle(size: f32) -> [TemplateVertex; 3] {
    [
        TemplateVertex {
            position: [-size, -size, 0.0],
        },
        TemplateVertex {
            position: [size, -size, 0.0],
        },
        TemplateVertex {
            position: [0.0, size, 0.0],
        },
    ]
}

/// One particle instance as laid out in the GPU instance buffer.
///
/// Interleaved, tightly packed: 16 floats, 64 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceRaw {
    pub offset: [f32; 3],
    pub time_offset: f32,
    pub color: [f32; 4],
    pub orientation_start: [f32; 4],
    pub orientation_end: [f32; 4],
}

/// Stride of one packed instance in bytes.
pub const INSTANCE_STRIDE: u64 = std::mem::size_of::<InstanceRaw>() as u64;

/// Randomized per-instance attributes in structure-of-arrays form.
#[derive(Debug, Clone)]
pub struct InstanceAttributes {
    offsets: Vec<Vec3>,
    time_offsets: Vec<f32>,
    colors: Vec<Vec4>,
    orientations_start: Vec<Quat>,
    orientations_end: Vec<Quat>,
}

impl InstanceAttributes {
    /// Generate attributes for `count` instances with a nondeterministic
    /// seed.
    ///
    /// `spread` is the edge length of the cube offsets are drawn from,
    /// centered on the origin. `palette` colors alternate across instances.
    ///
    /// Returns an error when `count` is zero.
    pub fn generate(count: u32, spread: f32, palette: [Vec4; 2]) -> Result<Self, ConfigError> {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0);
        Self::generate_seeded(count, spread, palette, seed)
    }

    /// Generate attributes with an explicit seed for reproducible fields.
    pub fn generate_seeded(
        count: u32,
        spread: f32,
        palette: [Vec4; 2],
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidInstanceCount(count));
        }

        let n = count as usize;
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut offsets = Vec::with_capacity(n);
        let mut time_offsets = Vec::with_capacity(n);
        let mut colors = Vec::with_capacity(n);
        let mut orientations_start = Vec::with_capacity(n);
        let mut orientations_end = Vec::with_capacity(n);

        for i in 0..n {
            offsets.push(random_in_cube(&mut rng, spread));
            time_offsets.push(rng.gen::<f32>());
            colors.push(palette[i % 2]);
            orientations_start.push(random_unit_quat(&mut rng));
            orientations_end.push(random_unit_quat(&mut rng));
        }

        Ok(Self {
            offsets,
            time_offsets,
            colors,
            orientations_start,
            orientations_end,
        })
    }

    /// Number of instances.
    #[inline]
    pub fn len(&self) -> u32 {
        self.offsets.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[inline]
    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    #[inline]
    pub fn time_offsets(&self) -> &[f32] {
        &self.time_offsets
    }

    #[inline]
    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    #[inline]
    pub fn orientations_start(&self) -> &[Quat] {
        &self.orientations_start
    }

    #[inline]
    pub fn orientations_end(&self) -> &[Quat] {
        &self.orientations_end
    }

    /// Pack the attributes into the interleaved layout the instance buffer
    /// uses.
    pub fn to_instances(&self) -> Vec<InstanceRaw> {
        (0..self.offsets.len())
            .map(|i| InstanceRaw {
                offset: self.offsets[i].to_array(),
                time_offset: self.time_offsets[i],
                color: self.colors[i].to_array(),
                orientation_start: quat_to_array(self.orientations_start[i]),
                orientation_end: quat_to_array(self.orientations_end[i]),
            })
            .collect()
    }
}

#[inline]
fn quat_to_array(q: Quat) -> [f32; 4] {
    [q.x, q.y, q.z, q.w]
}

/// Uniform point inside an axis-aligned cube of edge length `size` centered
/// on the origin.
fn random_in_cube(rng: &mut SmallRng, size: f32) -> Vec3 {
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * size,
        (rng.gen::<f32>() - 0.5) * size,
        (rng.gen::<f32>() - 0.5) * size,
    )
}

/// Uniformly distributed random unit quaternion (Shoemake's method).
fn random_unit_quat(rng: &mut SmallRng) -> Quat {
    let u1 = rng.gen::<f32>();
    let u2 = rng.gen::<f32>() * std::f32::consts::TAU;
    let u3 = rng.gen::<f32>() * std::f32::consts::TAU;

    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();

    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos())
}
