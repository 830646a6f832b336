//! Fire-and-forget measurement delivery.
//!
//! [`Transmitter::send`] serializes once and hands the bytes to the beacon
//! channel. Only if the beacon channel is missing or refuses to enqueue do
//! the same bytes go to the keepalive fallback. Nothing is queued or
//! retried; a lost beacon stays lost.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, warn};

use crate::measurement::Measurement;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Unload-safe, non-blocking delivery primitive.
pub trait BeaconChannel {
    /// Enqueue `body` for delivery. Returns whether the enqueue succeeded.
    fn send_beacon(&self, endpoint: &str, body: &[u8]) -> bool;
}

/// Request marked to outlive page teardown. Failures are swallowed.
pub trait FallbackChannel {
    fn post_keepalive(&self, endpoint: &str, body: Vec<u8>);
}

/// Which channel accepted a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Beacon,
    Fallback,
    /// Serialization failed; nothing left the process.
    Dropped,
}

pub struct Transmitter {
    beacon: Option<Box<dyn BeaconChannel>>,
    fallback: Box<dyn FallbackChannel>,
}

impl Transmitter {
    pub fn new(
        beacon: Option<Box<dyn BeaconChannel>>,
        fallback: Box<dyn FallbackChannel>,
    ) -> Self {
        Self { beacon, fallback }
    }

    /// Send a measurement. Never fails and never waits on the network.
    pub fn send(&self, measurement: &Measurement, endpoint: &str) -> Route {
        let body = match serde_json::to_vec(measurement) {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "failed to serialize measurement; dropping");
                return Route::Dropped;
            }
        };

        if let Some(beacon) = &self.beacon {
            if beacon.send_beacon(endpoint, &body) {
                debug!(endpoint, bytes = body.len(), "beacon enqueued");
                return Route::Beacon;
            }
            warn!(endpoint, "beacon refused; using keepalive fallback");
        } else {
            debug!(endpoint, "no beacon channel; using keepalive fallback");
        }

        self.fallback.post_keepalive(endpoint, body);
        Route::Fallback
    }
}

/// What a [`RecordingChannel`] does with beacons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconMode {
    Accept,
    Reject,
}

/// One payload captured by a [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub route: Route,
    pub endpoint: String,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn measurement(&self) -> serde_json::Result<Measurement> {
        serde_json::from_slice(&self.body)
    }
}

/// In-memory channel for dry runs and tests. Clones share the capture log.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    mode: BeaconMode,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl RecordingChannel {
    pub fn new(mode: BeaconMode) -> Self {
        Self {
            mode,
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.captured
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.captured()
            .iter()
            .filter_map(|c| c.measurement().ok())
            .collect()
    }

    fn record(&self, route: Route, endpoint: &str, body: Vec<u8>) {
        if let Ok(mut log) = self.captured.lock() {
            log.push(Captured {
                route,
                endpoint: endpoint.to_string(),
                body,
            });
        }
    }
}

impl BeaconChannel for RecordingChannel {
    fn send_beacon(&self, endpoint: &str, body: &[u8]) -> bool {
        match self.mode {
            BeaconMode::Accept => {
                self.record(Route::Beacon, endpoint, body.to_vec());
                true
            }
            BeaconMode::Reject => false,
        }
    }
}

impl FallbackChannel for RecordingChannel {
    fn post_keepalive(&self, endpoint: &str, body: Vec<u8>) {
        self.record(Route::Fallback, endpoint, body);
    }
}

/// Transmitter whose beacon and fallback both record into `channel`.
pub fn recording_transmitter(channel: &RecordingChannel) -> Transmitter {
    Transmitter::new(Some(Box::new(channel.clone())), Box::new(channel.clone()))
}
