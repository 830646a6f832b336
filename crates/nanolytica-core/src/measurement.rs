//! The payload sent to the collection endpoint.

use serde::{Deserialize, Serialize};

use crate::fields;
use crate::host::Host;

/// One view measurement, built right before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub path: String,
    pub referrer: String,
    pub screen_size: String,
    pub user_agent: String,
    pub duration_sec: u64,
}

impl Measurement {
    /// Snapshot the host page with the given whole-second duration.
    pub fn capture(host: &dyn Host, duration_sec: u64) -> Self {
        let location = host.location();
        let (width, height) = host.viewport();
        Self {
            path: fields::path(&location),
            referrer: fields::referrer(&host.referrer(), &location),
            screen_size: fields::screen_size(width, height),
            user_agent: fields::user_agent(&host.user_agent()),
            duration_sec,
        }
    }
}

/// Round elapsed seconds to a reportable duration, clamping at zero.
pub fn clamp_duration(elapsed_secs: f64) -> u64 {
    let rounded = elapsed_secs.round();
    if rounded.is_nan() || rounded <= 0.0 {
        0
    } else {
        rounded as u64
    }
}
