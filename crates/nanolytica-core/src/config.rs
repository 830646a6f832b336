//! Tracker configuration.
//!
//! Two layers:
//! - [`TrackerOptions`]: embedder-supplied knobs (collection path, content
//!   region, delays, beacon limits), serializable to/from TOML.
//! - [`Configuration`]: resolved once from the host page at install time
//!   and immutable afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::host::Host;

/// Collection path appended to the script origin.
pub const DEFAULT_COLLECT_PATH: &str = "/api/analytics/collect";
/// Element id of the region whose swaps count as view transitions.
pub const DEFAULT_CONTENT_REGION_ID: &str = "main-content";

/// Do-not-track values that mean "opt out". Case-sensitive.
const DNT_OPT_OUT_VALUES: [&str; 2] = ["1", "yes"];

/// Embedder options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerOptions {
    #[serde(default = "default_collect_path")]
    pub collect_path: String,
    #[serde(default = "default_content_region_id")]
    pub content_region_id: String,
    /// Delay before the post-swap view-start beacon.
    #[serde(default = "default_swap_restart_delay_ms")]
    pub swap_restart_delay_ms: u64,
    /// Bodies above this size are refused by the beacon channel.
    #[serde(default = "default_beacon_max_body_bytes")]
    pub beacon_max_body_bytes: usize,
    #[serde(default = "default_max_inflight_beacons")]
    pub max_inflight_beacons: usize,
}

fn default_collect_path() -> String {
    DEFAULT_COLLECT_PATH.into()
}
fn default_content_region_id() -> String {
    DEFAULT_CONTENT_REGION_ID.into()
}
fn default_swap_restart_delay_ms() -> u64 {
    10
}
fn default_beacon_max_body_bytes() -> usize {
    64 * 1024
}
fn default_max_inflight_beacons() -> usize {
    16
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            collect_path: default_collect_path(),
            content_region_id: default_content_region_id(),
            swap_restart_delay_ms: default_swap_restart_delay_ms(),
            beacon_max_body_bytes: default_beacon_max_body_bytes(),
            max_inflight_beacons: default_max_inflight_beacons(),
        }
    }
}

/// Resolved tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    /// Absolute collection URL, or a bare relative path when the script
    /// origin could not be determined.
    pub endpoint: String,
    pub do_not_track: bool,
}

/// Resolve the configuration from the host page. Never fails.
pub fn resolve(host: &dyn Host, options: &TrackerOptions) -> Configuration {
    let base = script_origin(host.current_script_src().as_deref());
    Configuration {
        endpoint: format!("{base}{}", options.collect_path),
        do_not_track: is_do_not_track(
            host.navigator_do_not_track().as_deref(),
            host.window_do_not_track().as_deref(),
        ),
    }
}

/// Origin (`scheme://host[:port]`) of the script source, or empty.
pub fn script_origin(src: Option<&str>) -> String {
    let Some(src) = src.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match Url::parse(src) {
        Ok(url) => {
            let origin = url.origin();
            if origin.is_tuple() {
                origin.ascii_serialization()
            } else {
                String::new()
            }
        }
        Err(err) => {
            tracing::debug!(src, %err, "script src is not a valid URL; using relative endpoint");
            String::new()
        }
    }
}

pub fn is_do_not_track(navigator: Option<&str>, window: Option<&str>) -> bool {
    let opted_out = |v: Option<&str>| v.is_some_and(|v| DNT_OPT_OUT_VALUES.contains(&v));
    opted_out(navigator) || opted_out(window)
}
