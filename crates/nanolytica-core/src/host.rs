//! Ambient page state the tracker reads.
//!
//! In a browser these reads map onto `document.currentScript`,
//! `navigator.doNotTrack`, `window.location` and friends. Everything the
//! tracker knows about the page comes through [`Host`].

use serde::{Deserialize, Serialize};

/// Document loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    /// Still parsing; DOMContentLoaded has not fired.
    Loading,
    Interactive,
    #[default]
    Complete,
}

/// Read-only view of the embedding page.
pub trait Host {
    /// `src` attribute of the currently executing script, if any.
    fn current_script_src(&self) -> Option<String>;

    /// Navigator-level do-not-track value.
    fn navigator_do_not_track(&self) -> Option<String>;

    /// Legacy window-level do-not-track value.
    fn window_do_not_track(&self) -> Option<String>;

    fn ready_state(&self) -> ReadyState;

    /// Whether the partial-page-update framework is loaded.
    fn has_swap_framework(&self) -> bool;

    /// Full URL of the current page.
    fn location(&self) -> String;

    /// `document.referrer`; empty when there is none.
    fn referrer(&self) -> String;

    /// Viewport width and height in CSS pixels.
    fn viewport(&self) -> (u32, u32);

    fn user_agent(&self) -> String;
}

/// Fixed page state, deserializable from scenario files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub script_src: Option<String>,
    #[serde(default)]
    pub navigator_dnt: Option<String>,
    #[serde(default)]
    pub window_dnt: Option<String>,
    #[serde(default)]
    pub ready_state: ReadyState,
    #[serde(default)]
    pub swap_framework: bool,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default = "default_width")]
    pub viewport_width: u32,
    #[serde(default = "default_height")]
    pub viewport_height: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_location() -> String {
    "http://localhost/".into()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_user_agent() -> String {
    concat!("nanolytica/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for PageSnapshot {
    fn default() -> Self {
        Self {
            script_src: None,
            navigator_dnt: None,
            window_dnt: None,
            ready_state: ReadyState::default(),
            swap_framework: false,
            location: default_location(),
            referrer: String::new(),
            viewport_width: default_width(),
            viewport_height: default_height(),
            user_agent: default_user_agent(),
        }
    }
}

impl Host for PageSnapshot {
    fn current_script_src(&self) -> Option<String> {
        self.script_src.clone()
    }

    fn navigator_do_not_track(&self) -> Option<String> {
        self.navigator_dnt.clone()
    }

    fn window_do_not_track(&self) -> Option<String> {
        self.window_dnt.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn has_swap_framework(&self) -> bool {
        self.swap_framework
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn referrer(&self) -> String {
        self.referrer.clone()
    }

    fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }
}
