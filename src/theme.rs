//! Color themes for scene views.
//!
//! A [`Theme`] bundles the palette and lighting intensities a scene derives
//! its look from. Switching themes at runtime only replaces colors and light
//! levels; geometry, camera state, and instance attributes are untouched.

use glam::{Vec3, Vec4};

/// Identifies which of the two built-in themes is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeId {
    Light,
    Dark,
}

/// Palette and lighting parameters for a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub id: ThemeId,
    /// Primary accent color (first particle color, portrait tint).
    pub primary: Vec3,
    /// Secondary accent color (alternating particle color).
    pub secondary: Vec3,
    /// Clear color behind all geometry.
    pub background: Vec3,
    /// Ambient light intensity multiplier.
    pub ambient_intensity: f32,
    /// Directional light intensity multiplier.
    pub sun_intensity: f32,
}

impl Theme {
    /// Dark theme: muted violet and teal accents on a near-black field.
    pub fn dark() -> Self {
        Self {
            id: ThemeId::Dark,
            primary: Vec3::new(0.55, 0.45, 0.95),
            secondary: Vec3::new(0.25, 0.75, 0.80),
            background: Vec3::new(0.015, 0.015, 0.030),
            ambient_intensity: 0.35,
            sun_intensity: 1.0,
        }
    }

    /// Light theme: deeper accents so particles stay visible on a pale field.
    pub fn light() -> Self {
        Self {
            id: ThemeId::Light,
            primary: Vec3::new(0.30, 0.20, 0.70),
            secondary: Vec3::new(0.10, 0.45, 0.50),
            background: Vec3::new(0.92, 0.92, 0.95),
            ambient_intensity: 0.55,
            sun_intensity: 0.85,
        }
    }

    /// Two-color palette cycled across particle instances.
    pub fn particle_palette(&self) -> [Vec4; 2] {
        [self.primary.extend(1.0), self.secondary.extend(1.0)]
    }

    /// Background as a wgpu clear color.
    pub fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.background.x as f64,
            g: self.background.y as f64,
            b: self.background.z as f64,
            a: 1.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
