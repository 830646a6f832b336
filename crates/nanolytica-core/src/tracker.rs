//! Tracker runtime.
//!
//! Wires the host page, clock, scheduler, and transmitter around a
//! [`DeliveryTrigger`]. Configuration is resolved once in [`Tracker::new`];
//! listeners are decided at the same time and never revisited.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = Tracker::new(host, SystemClock, queue, transmitter, &options);
//! tracker.install();                       // view start if the DOM is parsed
//! tracker.dispatch(&LifecycleEvent::PageHide);
//! ```

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{self, Configuration, TrackerOptions};
use crate::events::LifecycleEvent;
use crate::host::{Host, ReadyState};
use crate::measurement::Measurement;
use crate::scheduler::Scheduler;
use crate::transmitter::{Route, Transmitter};
use crate::trigger::{Beacon, BeaconKind, DeferredTask, DeliveryTrigger, Directive, Subscriptions};

/// Record of one transmission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transmission {
    pub at_ms: i64,
    pub kind: BeaconKind,
    pub route: Route,
    pub measurement: Measurement,
}

pub struct Tracker<H, C, S> {
    host: H,
    clock: C,
    scheduler: S,
    transmitter: Transmitter,
    config: Configuration,
    trigger: DeliveryTrigger,
    installed: bool,
}

impl<H: Host, C: Clock, S: Scheduler> Tracker<H, C, S> {
    pub fn new(
        host: H,
        clock: C,
        scheduler: S,
        transmitter: Transmitter,
        options: &TrackerOptions,
    ) -> Self {
        let config = config::resolve(&host, options);
        if config.do_not_track {
            info!("do-not-track set; tracker disabled");
        }
        let subscriptions =
            Subscriptions::for_install(config.do_not_track, host.has_swap_framework());
        let trigger = DeliveryTrigger::new(
            subscriptions,
            options.content_region_id.clone(),
            Duration::from_millis(options.swap_restart_delay_ms),
        );
        Self {
            host,
            clock,
            scheduler,
            transmitter,
            config,
            trigger,
            installed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn trigger(&self) -> &DeliveryTrigger {
        &self.trigger
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start listening. A document that is already parsed gets its view
    /// start right away; a loading one waits for [`LifecycleEvent::Ready`].
    pub fn install(&mut self) -> Vec<Transmission> {
        if self.installed {
            return Vec::new();
        }
        self.installed = true;
        debug!(
            endpoint = %self.config.endpoint,
            subscriptions = ?self.trigger.subscriptions(),
            "installed"
        );
        if self.host.ready_state() == ReadyState::Loading {
            return Vec::new();
        }
        self.dispatch(&LifecycleEvent::Ready)
    }

    /// Deliver a lifecycle event. Nothing is listening before [`Tracker::install`].
    pub fn dispatch(&mut self, event: &LifecycleEvent) -> Vec<Transmission> {
        if !self.installed {
            debug!(?event, "not installed; ignoring");
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let directives = self.trigger.handle(event, now);
        self.execute(directives, now)
    }

    /// Public API: restart the current view and send a view-start beacon.
    pub fn track(&mut self) -> Vec<Transmission> {
        self.dispatch(&LifecycleEvent::ManualTrack)
    }

    /// Run a task previously handed to the scheduler.
    pub fn run_deferred(&mut self, task: DeferredTask) -> Vec<Transmission> {
        if !self.installed {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let directives = self.trigger.fire_deferred(task, now);
        self.execute(directives, now)
    }

    fn execute(&mut self, directives: Vec<Directive>, now: i64) -> Vec<Transmission> {
        let mut sent = Vec::new();
        for directive in directives {
            match directive {
                Directive::Transmit(beacon) => sent.push(self.transmit(beacon, now)),
                Directive::Defer { delay, task } => self.scheduler.defer(now, delay, task),
            }
        }
        sent
    }

    fn transmit(&self, beacon: Beacon, now: i64) -> Transmission {
        let measurement = Measurement::capture(&self.host, beacon.duration_sec);
        let route = self.transmitter.send(&measurement, &self.config.endpoint);
        Transmission {
            at_ms: now,
            kind: beacon.kind,
            route,
            measurement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::host::PageSnapshot;
    use crate::scheduler::DeferredQueue;
    use crate::transmitter::{recording_transmitter, BeaconMode, RecordingChannel};

    type TestTracker = Tracker<PageSnapshot, ManualClock, DeferredQueue>;

    fn tracker(page: PageSnapshot) -> (TestTracker, ManualClock, RecordingChannel) {
        let clock = ManualClock::new(0);
        let channel = RecordingChannel::new(BeaconMode::Accept);
        let tracker = Tracker::new(
            page,
            clock.clone(),
            DeferredQueue::new(),
            recording_transmitter(&channel),
            &TrackerOptions::default(),
        );
        (tracker, clock, channel)
    }

    #[test]
    fn install_on_parsed_document_sends_view_start() {
        let (mut t, _, channel) = tracker(PageSnapshot::default());
        let sent = t.install();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, BeaconKind::ViewStart);
        assert_eq!(channel.measurements()[0].duration_sec, 0);
        assert!(t.install().is_empty());
    }

    #[test]
    fn events_before_install_are_ignored() {
        let (mut t, clock, channel) = tracker(PageSnapshot::default());
        assert!(t.track().is_empty());
        assert!(t.dispatch(&LifecycleEvent::Ready).is_empty());
        assert!(t.run_deferred(DeferredTask::ViewStart).is_empty());
        assert!(!t.trigger().session().is_tracking_active());
        assert!(channel.captured().is_empty());

        clock.set(50);
        assert_eq!(t.install().len(), 1);
        assert_eq!(t.track()[0].kind, BeaconKind::Manual);
    }

    #[test]
    fn install_on_loading_document_waits_for_ready() {
        let (mut t, clock, channel) = tracker(PageSnapshot {
            ready_state: ReadyState::Loading,
            ..Default::default()
        });
        assert!(t.install().is_empty());
        clock.set(300);
        assert_eq!(t.dispatch(&LifecycleEvent::Ready).len(), 1);
        assert_eq!(t.trigger().session().view_started_at_ms(), 300);
        assert_eq!(channel.captured().len(), 1);
    }

    #[test]
    fn endpoint_comes_from_script_origin() {
        let (t, _, _) = tracker(PageSnapshot {
            script_src: Some("https://cdn.example.net/n.js".into()),
            ..Default::default()
        });
        assert_eq!(t.config().endpoint, "https://cdn.example.net/api/analytics/collect");
    }

    #[test]
    fn swap_defers_view_start_to_scheduler() {
        let (mut t, clock, channel) = tracker(PageSnapshot {
            swap_framework: true,
            ..Default::default()
        });
        t.install();
        clock.set(2_000);
        let sent = t.dispatch(&LifecycleEvent::swap_of("main-content"));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].measurement.duration_sec, 2);
        assert_eq!(t.scheduler_mut().next_due_ms(), Some(2_010));

        clock.set(2_010);
        let due = t.scheduler_mut().take_due(2_010);
        assert_eq!(due.len(), 1);
        let sent = t.run_deferred(due[0].task);
        assert_eq!(sent[0].kind, BeaconKind::ViewStart);
        assert_eq!(channel.captured().len(), 3);
    }

    #[test]
    fn track_measures_current_location() {
        let (mut t, _, _) = tracker(PageSnapshot::default());
        t.install();
        t.host_mut().location = "http://localhost/app/settings".into();
        let sent = t.track();
        assert_eq!(sent[0].kind, BeaconKind::Manual);
        assert_eq!(sent[0].measurement.path, "/app/settings");
    }
}
