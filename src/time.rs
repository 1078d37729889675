//! Frame timing for the animation loop.
//!
//! A [`FrameClock`] measures the wall-clock delta between animation frames
//! and keeps a running FPS estimate. The animation loop resets the clock when
//! it starts so the first frame after a long idle period does not report a
//! huge delta.
//!
//! # Example
//!
//! ```ignore
//! use vitrine::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per animation frame:
//! let dt = clock.tick();
//! println!("Delta: {:.4}s, FPS: {:.1}", dt, clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Per-frame timing for the animation loop.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created or last reset.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
}

impl FrameClock {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
        }
    }

    /// Advance the clock by one frame and return the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Total wall-clock time in seconds since the last reset.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Time since last frame in seconds (delta time).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since the last reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set a fixed delta for deterministic ticks.
    ///
    /// Pass `None` to return to real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Reset the clock to its initial state.
    ///
    /// The fixed delta, if any, is kept.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_frame = now;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
