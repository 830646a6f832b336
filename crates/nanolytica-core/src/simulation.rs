//! Deterministic lifecycle replay.
//!
//! A [`Scenario`] describes a page and a timeline of lifecycle events. The
//! simulator replays it in virtual time against a real [`Tracker`]:
//! - deferred tasks fire at their due time, before any later step
//! - `page_hide` tears the page down: pending deferred work is dropped and
//!   later steps are skipped
//! - without a teardown, leftover deferred work runs after the last step

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::clock::{Clock, ManualClock};
use crate::config::{Configuration, TrackerOptions};
use crate::error::ScenarioError;
use crate::events::LifecycleEvent;
use crate::host::PageSnapshot;
use crate::scheduler::DeferredQueue;
use crate::tracker::{Tracker, Transmission};
use crate::transmitter::Transmitter;
use crate::trigger::BeaconKind;

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds since the script was installed.
    pub at_ms: i64,
    #[serde(flatten)]
    pub event: LifecycleEvent,
    /// New page URL. Applied after a swap is handled (history is pushed once
    /// the swap completes), before any other event.
    #[serde(default)]
    pub navigate_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub page: PageSnapshot,
    #[serde(default)]
    pub options: TrackerOptions,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScenarioError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::InvalidValue {
                field: "name".into(),
                message: "must not be empty".into(),
            });
        }
        let mut previous_ms = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at_ms < previous_ms {
                return Err(ScenarioError::OutOfOrder {
                    index,
                    at_ms: step.at_ms,
                    previous_ms,
                });
            }
            previous_ms = step.at_ms;
        }
        if self.options.max_inflight_beacons > Semaphore::MAX_PERMITS {
            return Err(ScenarioError::InvalidValue {
                field: "options.max_inflight_beacons".into(),
                message: format!("must be at most {}", Semaphore::MAX_PERMITS),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub config: Configuration,
    pub transmissions: Vec<Transmission>,
    /// Steps after teardown that never ran.
    pub skipped_steps: usize,
    /// Deferred tasks still pending at teardown.
    pub dropped_deferred: usize,
}

impl SimulationReport {
    pub fn count(&self, kind: BeaconKind) -> usize {
        self.transmissions.iter().filter(|t| t.kind == kind).count()
    }

    pub fn durations(&self) -> Vec<u64> {
        self.transmissions
            .iter()
            .map(|t| t.measurement.duration_sec)
            .collect()
    }
}

/// Replay `scenario`, sending through `transmitter`.
pub fn run(scenario: &Scenario, transmitter: Transmitter) -> SimulationReport {
    let clock = ManualClock::new(0);
    let mut tracker = Tracker::new(
        scenario.page.clone(),
        clock.clone(),
        DeferredQueue::new(),
        transmitter,
        &scenario.options,
    );

    let mut transmissions = tracker.install();
    let mut skipped_steps = 0;
    let mut dropped_deferred = 0;
    let mut torn_down = false;

    for step in &scenario.steps {
        if torn_down {
            skipped_steps += 1;
            continue;
        }
        run_due(&mut tracker, &clock, step.at_ms, &mut transmissions);
        clock.set(step.at_ms);

        let is_swap = matches!(step.event, LifecycleEvent::AfterSwap { .. });
        if !is_swap {
            navigate(&mut tracker, step.navigate_to.as_deref());
        }
        debug!(at_ms = step.at_ms, event = ?step.event, "step");
        transmissions.extend(tracker.dispatch(&step.event));
        if is_swap {
            navigate(&mut tracker, step.navigate_to.as_deref());
        }

        if step.event == LifecycleEvent::PageHide {
            torn_down = true;
            dropped_deferred = tracker.scheduler_mut().clear();
        }
    }

    if skipped_steps > 0 {
        warn!(skipped_steps, "steps after page_hide were not replayed");
    }
    if !torn_down {
        run_due(&mut tracker, &clock, i64::MAX, &mut transmissions);
    }

    SimulationReport {
        scenario: scenario.name.clone(),
        config: tracker.config().clone(),
        transmissions,
        skipped_steps,
        dropped_deferred,
    }
}

fn run_due(
    tracker: &mut Tracker<PageSnapshot, ManualClock, DeferredQueue>,
    clock: &ManualClock,
    until_ms: i64,
    out: &mut Vec<Transmission>,
) {
    while let Some(due_ms) = tracker
        .scheduler_mut()
        .next_due_ms()
        .filter(|due| *due <= until_ms)
    {
        clock.set(due_ms.max(clock.now_ms()));
        for pending in tracker.scheduler_mut().take_due(due_ms) {
            out.extend(tracker.run_deferred(pending.task));
        }
    }
}

fn navigate(tracker: &mut Tracker<PageSnapshot, ManualClock, DeferredQueue>, url: Option<&str>) {
    if let Some(url) = url {
        tracker.host_mut().location = url.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmitter::{recording_transmitter, BeaconMode, RecordingChannel};

    fn accepting() -> Transmitter {
        recording_transmitter(&RecordingChannel::new(BeaconMode::Accept))
    }

    const SWAP_SCENARIO: &str = r#"
name = "swap then leave"

[page]
script_src = "https://stats.example.com/nanolytica.js"
location = "https://example.com/"
swap_framework = true

[[steps]]
at_ms = 2000
type = "after_swap"
detail = { target_id = "main-content" }
navigate_to = "https://example.com/about"

[[steps]]
at_ms = 5000
type = "page_hide"
"#;

    #[test]
    fn parses_flattened_steps() {
        let scenario = Scenario::from_toml_str(SWAP_SCENARIO).unwrap();
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].event, LifecycleEvent::swap_of("main-content"));
        assert_eq!(scenario.steps[1].event, LifecycleEvent::PageHide);
        assert_eq!(scenario.options, TrackerOptions::default());
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let text = r#"
name = "bad"
[[steps]]
at_ms = 100
type = "page_hide"
[[steps]]
at_ms = 50
type = "before_unload"
"#;
        assert!(matches!(
            Scenario::from_toml_str(text),
            Err(ScenarioError::OutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            Scenario::from_toml_str(r#"name = " ""#),
            Err(ScenarioError::InvalidValue { .. })
        ));
    }

    #[test]
    fn oversized_inflight_cap_is_rejected() {
        let text = "name = \"huge cap\"\n[options]\nmax_inflight_beacons = 4000000000000000000";
        match Scenario::from_toml_str(text) {
            Err(ScenarioError::InvalidValue { field, .. }) => {
                assert_eq!(field, "options.max_inflight_beacons")
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn swap_scenario_reports_paths_per_view() {
        let scenario = Scenario::from_toml_str(SWAP_SCENARIO).unwrap();
        let channel = RecordingChannel::new(BeaconMode::Accept);
        let report = run(&scenario, recording_transmitter(&channel));

        assert_eq!(report.durations(), vec![0, 2, 0, 3]);
        let paths: Vec<_> = report
            .transmissions
            .iter()
            .map(|t| t.measurement.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/", "/", "/about", "/about"]);
        assert_eq!(report.transmissions[2].at_ms, 2_010);
        assert_eq!(channel.captured().len(), 4);
        assert_eq!(
            report.config.endpoint,
            "https://stats.example.com/api/analytics/collect"
        );
    }

    #[test]
    fn teardown_inside_delay_window_drops_deferred_start() {
        let text = r#"
name = "leave mid-swap"
[page]
swap_framework = true
[[steps]]
at_ms = 1000
type = "after_swap"
detail = { target_id = "main-content" }
[[steps]]
at_ms = 1005
type = "page_hide"
[[steps]]
at_ms = 2000
type = "manual_track"
"#;
        let scenario = Scenario::from_toml_str(text).unwrap();
        let report = run(&scenario, accepting());
        assert_eq!(report.count(BeaconKind::ViewStart), 1);
        assert_eq!(report.count(BeaconKind::Terminal), 2);
        assert_eq!(report.dropped_deferred, 1);
        assert_eq!(report.skipped_steps, 1);
    }

    #[test]
    fn pending_start_runs_after_last_step() {
        let text = r#"
name = "swap at end"
[page]
swap_framework = true
[[steps]]
at_ms = 400
type = "after_swap"
detail = { target_id = "main-content" }
"#;
        let scenario = Scenario::from_toml_str(text).unwrap();
        let report = run(&scenario, accepting());
        assert_eq!(report.count(BeaconKind::ViewStart), 2);
        assert_eq!(report.transmissions.last().map(|t| t.at_ms), Some(410));
    }
}
