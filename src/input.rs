//! Pointer input smoothing for the portrait view.
//!
//! Raw pointer positions are normalized into a viewport-relative range and
//! fed to a critically damped spring. The scene consumes the spring value as
//! a small model rotation each animation frame, so the portrait leans toward
//! the pointer instead of snapping to it.

use glam::{EulerRot, Quat, Vec2};

/// Spring stiffness in 1/s^2.
const STIFFNESS: f32 = 170.0;
/// Damping coefficient in 1/s.
const DAMPING: f32 = 26.0;
/// Particle mass the spring acts on.
const MASS: f32 = 1.0;
/// Velocity magnitude below which the spring may come to rest.
const REST_SPEED: f32 = 0.005;
/// Distance to target below which the spring may come to rest.
const REST_DELTA: f32 = 0.005;
/// Largest integration step in seconds. Longer frame deltas are split.
const MAX_STEP: f32 = 1.0 / 120.0;

/// Radians of model rotation per unit of normalized pointer travel.
const ROTATION_SCALE: f32 = 0.6;

/// Critically damped 2D spring integrated with semi-implicit Euler.
#[derive(Debug, Clone)]
pub struct Spring {
    value: Vec2,
    velocity: Vec2,
    target: Option<Vec2>,
}

impl Spring {
    pub fn new() -> Self {
        Self {
            value: Vec2::ZERO,
            velocity: Vec2::ZERO,
            target: None,
        }
    }

    /// Retarget the spring. Motion continues from the current value and
    /// velocity.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = Some(target);
    }

    /// Current spring value.
    #[inline]
    pub fn value(&self) -> Vec2 {
        self.value
    }

    /// Whether the spring has nothing left to do.
    pub fn is_settled(&self) -> bool {
        match self.target {
            Some(target) => {
                self.velocity.length() < REST_SPEED && (target - self.value).length() < REST_DELTA
            }
            None => true,
        }
    }

    /// Advance the spring by `dt` seconds and return the new value.
    ///
    /// Large deltas are split into fixed substeps so a long frame hitch
    /// cannot destabilize the integration.
    pub fn step(&mut self, dt: f32) -> Vec2 {
        let target = match self.target {
            Some(t) => t,
            None => return self.value,
        };

        let mut remaining = dt.max(0.0);
        while remaining > 0.0 {
            let h = remaining.min(MAX_STEP);
            remaining -= h;

            let displacement = self.value - target;
            let accel = (-STIFFNESS * displacement - DAMPING * self.velocity) / MASS;
            self.velocity += accel * h;
            self.value += self.velocity * h;
        }

        if self.is_settled() {
            self.value = target;
            self.velocity = Vec2::ZERO;
        }
        self.value
    }

    /// Halt the spring in place: velocity is zeroed and the target cleared.
    ///
    /// The current value is kept so a stopped spring does not jump.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.target = None;
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer-driven rotation for the portrait model.
///
/// Pointer positions are normalized to `[-0.5, 0.5]` on each axis relative
/// to the viewport center, then smoothed by a [`Spring`]. The smoothed value
/// maps to a yaw/pitch rotation.
#[derive(Debug, Clone, Default)]
pub struct PointerSpring {
    spring: Spring,
}

impl PointerSpring {
    pub fn new() -> Self {
        Self {
            spring: Spring::new(),
        }
    }

    /// Feed a raw pointer position in viewport pixels.
    ///
    /// Positions outside the viewport clamp to the edge. Zero-sized
    /// viewports are ignored.
    pub fn set_pointer(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let normalized = Vec2::new(
            (x / width - 0.5).clamp(-0.5, 0.5),
            (y / height - 0.5).clamp(-0.5, 0.5),
        );
        self.spring.set_target(normalized);
    }

    /// Advance the spring and return the rotation for this frame.
    pub fn step(&mut self, dt: f32) -> Quat {
        let v = self.spring.step(dt);
        Self::rotation_for(v)
    }

    /// Rotation for the current spring value without advancing it.
    pub fn rotation(&self) -> Quat {
        Self::rotation_for(self.spring.value())
    }

    /// Whether the spring still has motion or an unreached target.
    pub fn is_settled(&self) -> bool {
        self.spring.is_settled()
    }

    /// Halt the spring, keeping the current lean.
    pub fn stop(&mut self) {
        self.spring.stop();
    }

    fn rotation_for(v: Vec2) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            v.x * ROTATION_SCALE,
            v.y * ROTATION_SCALE,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_spring_converges_to_target() {
        let mut spring = Spring::new();
        spring.set_target(Vec2::new(0.3, -0.2));

        for _ in 0..600 {
            spring.step(DT);
        }
        assert!(spring.is_settled());
        assert!((spring.value() - Vec2::new(0.3, -0.2)).length() < 1e-3);
    }

    #[test]
    fn test_spring_barely_overshoots() {
        let mut spring = Spring::new();
        let target = 0.5;
        spring.set_target(Vec2::new(target, 0.0));

        let mut max_x: f32 = 0.0;
        for _ in 0..600 {
            max_x = max_x.max(spring.step(DT).x);
        }
        assert!(max_x < target * 1.05, "overshoot to {}", max_x);
    }

    #[test]
    fn test_spring_without_target_holds_still() {
        let mut spring = Spring::new();
        assert!(spring.is_settled());
        assert_eq!(spring.step(DT), Vec2::ZERO);
    }

    #[test]
    fn test_stop_freezes_current_value() {
        let mut spring = Spring::new();
        spring.set_target(Vec2::new(1.0, 1.0));
        for _ in 0..5 {
            spring.step(DT);
        }
        let mid = spring.value();
        assert!(mid.length() > 0.0);

        spring.stop();
        assert!(spring.is_settled());
        for _ in 0..10 {
            assert_eq!(spring.step(DT), mid);
        }
    }

    #[test]
    fn test_large_delta_stays_stable() {
        let mut spring = Spring::new();
        spring.set_target(Vec2::new(0.4, 0.4));
        // One two-second hitch must not blow up the integration.
        let v = spring.step(2.0);
        assert!(v.is_finite());
        assert!((v - Vec2::new(0.4, 0.4)).length() < 1e-2);
    }

    #[test]
    fn test_pointer_normalization() {
        let mut pointer = PointerSpring::new();

        pointer.set_pointer(400.0, 300.0, 800.0, 600.0);
        assert_eq!(pointer.spring.target, Some(Vec2::ZERO));

        pointer.set_pointer(0.0, 0.0, 800.0, 600.0);
        assert_eq!(pointer.spring.target, Some(Vec2::new(-0.5, -0.5)));

        pointer.set_pointer(800.0, 600.0, 800.0, 600.0);
        assert_eq!(pointer.spring.target, Some(Vec2::new(0.5, 0.5)));

        // Outside the viewport clamps to the edge.
        pointer.set_pointer(2000.0, -50.0, 800.0, 600.0);
        assert_eq!(pointer.spring.target, Some(Vec2::new(0.5, -0.5)));
    }

    #[test]
    fn test_zero_viewport_is_ignored() {
        let mut pointer = PointerSpring::new();
        pointer.set_pointer(10.0, 10.0, 0.0, 600.0);
        assert_eq!(pointer.spring.target, None);
    }

    #[test]
    fn test_rotation_is_identity_at_center() {
        let mut pointer = PointerSpring::new();
        pointer.set_pointer(400.0, 300.0, 800.0, 600.0);
        let q = pointer.step(DT);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn test_rotation_leans_toward_pointer() {
        let mut pointer = PointerSpring::new();
        pointer.set_pointer(800.0, 300.0, 800.0, 600.0);
        for _ in 0..600 {
            pointer.step(DT);
        }
        let (yaw, pitch, _roll) = pointer.rotation().to_euler(EulerRot::YXZ);
        assert!((yaw - 0.5 * ROTATION_SCALE).abs() < 1e-2);
        assert!(pitch.abs() < 1e-3);
    }
}
