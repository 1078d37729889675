//! Light rig for the portrait scene.
//!
//! One ambient term plus one directional sun. Colors and intensities come
//! from the active [`Theme`](crate::theme::Theme); the sun direction is
//! fixed.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::theme::Theme;

/// Direction the sun light travels, before normalization.
const SUN_DIRECTION: Vec3 = Vec3::new(-0.4, -0.8, -0.45);

/// Uniform fill light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Parallel light with a fixed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Normalized direction the light travels.
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// The full light set for a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
}

impl LightRig {
    /// Build the rig for a theme.
    ///
    /// Both lights are white; the theme contributes only intensities, so
    /// the portrait base color keeps its hue in either mode.
    pub fn for_theme(theme: &Theme) -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::splat(1.0),
                intensity: theme.ambient_intensity,
            },
            sun: DirectionalLight {
                direction: SUN_DIRECTION.normalize(),
                color: Vec3::splat(1.0),
                intensity: theme.sun_intensity,
            },
        }
    }

    /// Pack the rig into the shader's uniform layout.
    pub fn to_uniform(&self) -> LightsUniform {
        LightsUniform {
            ambient: [
                self.ambient.color.x,
                self.ambient.color.y,
                self.ambient.color.z,
                self.ambient.intensity,
            ],
            sun_dir: [
                self.sun.direction.x,
                self.sun.direction.y,
                self.sun.direction.z,
                0.0,
            ],
            sun_color: [
                self.sun.color.x,
                self.sun.color.y,
                self.sun.color.z,
                self.sun.intensity,
            ],
        }
    }
}

/// GPU-side layout of the light rig. Each field packs a color or direction
/// in xyz with the scalar term in w.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_direction_is_normalized() {
        let rig = LightRig::for_theme(&Theme::dark());
        assert!((rig.sun.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rig_tracks_theme_intensities() {
        let dark = LightRig::for_theme(&Theme::dark());
        let light = LightRig::for_theme(&Theme::light());
        assert_eq!(dark.ambient.intensity, Theme::dark().ambient_intensity);
        assert_eq!(light.ambient.intensity, Theme::light().ambient_intensity);
        assert_ne!(dark.ambient.intensity, light.ambient.intensity);
        assert_ne!(dark.sun.intensity, light.sun.intensity);
    }

    #[test]
    fn test_theme_change_keeps_sun_direction() {
        let dark = LightRig::for_theme(&Theme::dark());
        let light = LightRig::for_theme(&Theme::light());
        assert_eq!(dark.sun.direction, light.sun.direction);
    }

    #[test]
    fn test_uniform_packs_intensity_in_w() {
        let rig = LightRig::for_theme(&Theme::dark());
        let u = rig.to_uniform();
        assert_eq!(u.ambient[3], rig.ambient.intensity);
        assert_eq!(u.sun_color[3], rig.sun.intensity);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 48);
    }
}
