//! Animation loop gating.
//!
//! [`RenderLoop`] decides whether continuous animation may run. It owns no
//! GPU state and schedules nothing itself; callers translate the returned
//! [`LoopDirective`] into redraw requests. This keeps the whole state
//! machine testable without a window.
//!
//! Two host signals gate the loop: a reduced-motion preference, which always
//! blocks animation, and visibility, which blocks only loops built with
//! `gate_on_visibility`. Whenever animation is blocked the loop still asks
//! for a single static render so the last state stays on screen. A blocked
//! loop stays engaged: when the blocking signal lifts, animation resumes on
//! its own.

use crate::time::FrameClock;

/// Whether the loop is animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// What the caller should do after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDirective {
    /// Nothing to schedule.
    None,
    /// Schedule continuous frames.
    Animate,
    /// Render a single static frame.
    RenderOnce,
}

/// Gated animation loop driver.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    /// True between `start` and `stop`: the host wants animation whenever
    /// the gates allow it.
    engaged: bool,
    /// Set when a frame has been scheduled and not yet consumed.
    tick_pending: bool,
    reduced_motion: bool,
    visible: bool,
    gate_on_visibility: bool,
    clock: FrameClock,
}

impl RenderLoop {
    /// Create an idle loop.
    ///
    /// `gate_on_visibility` decides whether the visibility signal stops
    /// animation. A backdrop keeps drifting while covered; a portrait
    /// pauses.
    pub fn new(gate_on_visibility: bool) -> Self {
        Self {
            state: LoopState::Idle,
            engaged: false,
            tick_pending: false,
            reduced_motion: false,
            visible: true,
            gate_on_visibility,
            clock: FrameClock::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// Force a fixed tick delta, for deterministic tests.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.clock.set_fixed_delta(delta);
    }

    fn eligible(&self) -> bool {
        !self.reduced_motion && (self.visible || !self.gate_on_visibility)
    }

    fn spin_up(&mut self) -> LoopDirective {
        log::debug!("animation loop started");
        self.state = LoopState::Running;
        self.tick_pending = true;
        self.clock.reset();
        LoopDirective::Animate
    }

    fn halt(&mut self) {
        if self.is_running() {
            log::debug!("animation loop stopped");
        }
        self.state = LoopState::Idle;
        self.tick_pending = false;
    }

    /// Engage the loop and start animating if the gates allow.
    ///
    /// Starting an already running loop changes nothing. A blocked start
    /// stays idle and asks for one static render instead; the loop remains
    /// engaged and will animate once unblocked.
    pub fn start(&mut self) -> LoopDirective {
        self.engaged = true;
        if self.is_running() {
            return LoopDirective::None;
        }
        if !self.eligible() {
            log::debug!("animation blocked, rendering one static frame");
            return LoopDirective::RenderOnce;
        }
        self.spin_up()
    }

    /// Disengage and stop. Safe to call repeatedly or when already idle.
    ///
    /// Any scheduled tick is invalidated, so a frame callback that was
    /// already queued becomes a no-op. Signals arriving afterwards no
    /// longer restart the loop.
    pub fn stop(&mut self) {
        self.engaged = false;
        self.halt();
    }

    /// Update the reduced-motion preference and reconcile.
    pub fn set_reduced_motion(&mut self, reduced: bool) -> LoopDirective {
        self.reduced_motion = reduced;
        self.reconcile()
    }

    /// Update the visibility signal and reconcile.
    pub fn set_visible(&mut self, visible: bool) -> LoopDirective {
        self.visible = visible;
        self.reconcile()
    }

    /// Ask for a frame reflecting changed static state (resize, theme).
    ///
    /// While running, the next scheduled tick already covers it. While
    /// idle, one static render is requested.
    pub fn refresh(&mut self) -> LoopDirective {
        if self.is_running() {
            LoopDirective::None
        } else {
            LoopDirective::RenderOnce
        }
    }

    /// Re-evaluate eligibility after a signal change.
    fn reconcile(&mut self) -> LoopDirective {
        if !self.engaged {
            return LoopDirective::None;
        }
        match (self.is_running(), self.eligible()) {
            (true, false) => {
                self.halt();
                LoopDirective::RenderOnce
            }
            (false, true) => self.spin_up(),
            _ => LoopDirective::None,
        }
    }

    /// Consume the scheduled tick, returning the frame delta in seconds.
    ///
    /// Returns `None` when the loop is idle or no tick is pending, which is
    /// exactly the case for a callback that fired after `stop`.
    pub fn tick(&mut self) -> Option<f32> {
        if self.is_running() && self.tick_pending {
            self.tick_pending = false;
            Some(self.clock.tick())
        } else {
            None
        }
    }

    /// Schedule the next tick. Returns false when the loop is idle, so a
    /// stopped loop cannot re-arm itself.
    pub fn arm(&mut self) -> bool {
        if self.is_running() {
            self.tick_pending = true;
            true
        } else {
            false
        }
    }
}
