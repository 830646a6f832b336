//! Session clock: the single piece of mutable tracking state.
//!
//! ## State
//!
//! ```text
//! Uninitialized -> TrackingActive { terminal pending | terminal sent }
//! ```
//!
//! The terminal flag goes pending -> sent once per view and is only
//! cleared by [`SessionClock::reset_for_new_view`].

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionClock {
    view_started_at_ms: i64,
    tracking_active: bool,
    terminal_sent: bool,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn view_started_at_ms(&self) -> i64 {
        self.view_started_at_ms
    }

    pub fn is_tracking_active(&self) -> bool {
        self.tracking_active
    }

    pub fn terminal_sent(&self) -> bool {
        self.terminal_sent
    }

    /// Seconds since the view started. Negative if the clock moved backward;
    /// callers clamp before reporting.
    pub fn elapsed_secs(&self, now_ms: i64) -> f64 {
        (now_ms - self.view_started_at_ms) as f64 / 1000.0
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Mark the start of a view. Calling it again moves the start point.
    pub fn start(&mut self, now_ms: i64) {
        self.view_started_at_ms = now_ms;
        self.tracking_active = true;
    }

    pub fn mark_terminal_sent(&mut self) {
        self.terminal_sent = true;
    }

    /// Begin a new view after a content swap.
    pub fn reset_for_new_view(&mut self, now_ms: i64) {
        self.start(now_ms);
        self.terminal_sent = false;
    }
}
