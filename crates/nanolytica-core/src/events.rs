use serde::{Deserialize, Serialize};

/// Page lifecycle notifications the tracker reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// DOMContentLoaded, or install on an already parsed document.
    Ready,
    PageHide,
    BeforeUnload,
    /// Partial-page-update framework replaced a region.
    AfterSwap {
        /// Absent when the framework dispatched without a usable detail.
        #[serde(default)]
        detail: Option<SwapDetail>,
    },
    /// Host page called the public `track()` API.
    ManualTrack,
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Ready => EventKind::Ready,
            LifecycleEvent::PageHide | LifecycleEvent::BeforeUnload => EventKind::Unload,
            LifecycleEvent::AfterSwap { .. } => EventKind::Swap,
            LifecycleEvent::ManualTrack => EventKind::Manual,
        }
    }

    /// Swap targeting the element with `id`.
    pub fn swap_of(id: impl Into<String>) -> Self {
        LifecycleEvent::AfterSwap {
            detail: Some(SwapDetail {
                target_id: Some(id.into()),
            }),
        }
    }
}

/// Listener groups; one registration per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Ready,
    Unload,
    Swap,
    Manual,
}

/// Detail carried by an after-swap notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapDetail {
    /// `id` of the swapped target element; `None` when it has none.
    #[serde(default)]
    pub target_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_unload_events_share_a_kind() {
        assert_eq!(LifecycleEvent::PageHide.kind(), EventKind::Unload);
        assert_eq!(LifecycleEvent::BeforeUnload.kind(), EventKind::Unload);
    }

    #[test]
    fn swap_deserializes_with_and_without_detail() {
        let with: LifecycleEvent =
            serde_json::from_str(r#"{"type":"after_swap","detail":{"target_id":"main-content"}}"#)
                .unwrap();
        assert_eq!(with, LifecycleEvent::swap_of("main-content"));

        let without: LifecycleEvent = serde_json::from_str(r#"{"type":"after_swap"}"#).unwrap();
        assert_eq!(without, LifecycleEvent::AfterSwap { detail: None });
    }
}
