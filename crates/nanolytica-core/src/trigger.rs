//! Delivery trigger: the event-driven state machine.
//!
//! The trigger does not perform I/O. Each handler checks its guard against
//! the [`SessionClock`], mutates it, and returns the [`Directive`]s the
//! runtime must carry out.
//!
//! ## Transitions
//!
//! ```text
//! Ready         (not active)                -> start, ViewStart(0)
//! Unload        (active, terminal pending)  -> Terminal(elapsed), mark sent
//! Swap(region)  (active)                    -> Terminal(elapsed), reset view,
//!                                              defer ViewStart(0)
//! ManualTrack   (any)                       -> start, Manual(0)
//! ```
//!
//! Everything else is a no-op.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::events::{EventKind, LifecycleEvent, SwapDetail};
use crate::measurement::clamp_duration;
use crate::session::SessionClock;

/// Why a beacon is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconKind {
    /// Zero-duration marker that a view began.
    ViewStart,
    /// End of a view, carrying its dwell time.
    Terminal,
    /// Zero-duration marker from the public `track()` API.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beacon {
    pub kind: BeaconKind,
    pub duration_sec: u64,
}

impl Beacon {
    fn view_start() -> Self {
        Self {
            kind: BeaconKind::ViewStart,
            duration_sec: 0,
        }
    }
}

/// Work scheduled to run after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredTask {
    /// View-start beacon for the view that replaced swapped content.
    ViewStart,
}

/// Instruction for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Transmit(Beacon),
    Defer { delay: Duration, task: DeferredTask },
}

/// Which listener groups were registered at install time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Subscriptions {
    pub ready: bool,
    pub unload: bool,
    pub swap: bool,
    pub manual: bool,
}

impl Subscriptions {
    /// Do-not-track disables every listener; the swap listener also needs
    /// the framework to be present.
    pub fn for_install(do_not_track: bool, has_swap_framework: bool) -> Self {
        if do_not_track {
            return Self::default();
        }
        Self {
            ready: true,
            unload: true,
            swap: has_swap_framework,
            manual: true,
        }
    }

    pub fn covers(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Ready => self.ready,
            EventKind::Unload => self.unload,
            EventKind::Swap => self.swap,
            EventKind::Manual => self.manual,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryTrigger {
    session: SessionClock,
    subscriptions: Subscriptions,
    content_region_id: String,
    restart_delay: Duration,
}

impl DeliveryTrigger {
    pub fn new(
        subscriptions: Subscriptions,
        content_region_id: impl Into<String>,
        restart_delay: Duration,
    ) -> Self {
        Self::with_session(
            SessionClock::new(),
            subscriptions,
            content_region_id,
            restart_delay,
        )
    }

    /// Build around an existing session clock.
    pub fn with_session(
        session: SessionClock,
        subscriptions: Subscriptions,
        content_region_id: impl Into<String>,
        restart_delay: Duration,
    ) -> Self {
        Self {
            session,
            subscriptions,
            content_region_id: content_region_id.into(),
            restart_delay,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionClock {
        &self.session
    }

    pub fn subscriptions(&self) -> Subscriptions {
        self.subscriptions
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn handle(&mut self, event: &LifecycleEvent, now_ms: i64) -> Vec<Directive> {
        if !self.subscriptions.covers(event.kind()) {
            debug!(?event, "no listener registered; ignoring");
            return Vec::new();
        }
        match event {
            LifecycleEvent::Ready => self.on_ready(now_ms),
            LifecycleEvent::PageHide | LifecycleEvent::BeforeUnload => self.on_unload(now_ms),
            LifecycleEvent::AfterSwap { detail } => self.on_swap(detail.as_ref(), now_ms),
            LifecycleEvent::ManualTrack => self.on_manual(now_ms),
        }
    }

    pub fn fire_deferred(&mut self, task: DeferredTask, _now_ms: i64) -> Vec<Directive> {
        match task {
            DeferredTask::ViewStart => {
                debug!("deferred view start");
                vec![Directive::Transmit(Beacon::view_start())]
            }
        }
    }

    fn on_ready(&mut self, now_ms: i64) -> Vec<Directive> {
        if self.session.is_tracking_active() {
            return Vec::new();
        }
        self.session.start(now_ms);
        debug!(now_ms, "tracking active");
        vec![Directive::Transmit(Beacon::view_start())]
    }

    fn on_unload(&mut self, now_ms: i64) -> Vec<Directive> {
        if !self.session.is_tracking_active() || self.session.terminal_sent() {
            return Vec::new();
        }
        self.session.mark_terminal_sent();
        vec![Directive::Transmit(self.terminal(now_ms))]
    }

    fn on_swap(&mut self, detail: Option<&SwapDetail>, now_ms: i64) -> Vec<Directive> {
        let Some(target) = detail.and_then(|d| d.target_id.as_deref()) else {
            debug!("swap without target; ignoring");
            return Vec::new();
        };
        if target != self.content_region_id || !self.session.is_tracking_active() {
            return Vec::new();
        }
        let outgoing = self.terminal(now_ms);
        self.session.reset_for_new_view(now_ms);
        debug!(duration_sec = outgoing.duration_sec, "content swap; new view");
        vec![
            Directive::Transmit(outgoing),
            Directive::Defer {
                delay: self.restart_delay,
                task: DeferredTask::ViewStart,
            },
        ]
    }

    fn on_manual(&mut self, now_ms: i64) -> Vec<Directive> {
        self.session.start(now_ms);
        vec![Directive::Transmit(Beacon {
            kind: BeaconKind::Manual,
            duration_sec: 0,
        })]
    }

    fn terminal(&self, now_ms: i64) -> Beacon {
        Beacon {
            kind: BeaconKind::Terminal,
            duration_sec: clamp_duration(self.session.elapsed_secs(now_ms)),
        }
    }
}
