//! # Nanolytica Core Library
//!
//! Privacy-respecting page-view and dwell-time tracking. This crate holds
//! the client-side session lifecycle: when a view starts, when it ends, and
//! how its measurement leaves the page exactly once per transition.
//!
//! ## Architecture
//!
//! - **Session Clock**: the one piece of mutable tracking state
//! - **Delivery Trigger**: a pure state machine turning lifecycle events
//!   into directives
//! - **Transmitter**: fire-and-forget delivery over a beacon channel with a
//!   keepalive fallback
//! - **Tracker**: runtime glue over an injectable [`Host`], [`Clock`] and
//!   [`Scheduler`]
//!
//! ## Key Components
//!
//! - [`Tracker`]: install once, then `dispatch` events and call `track`
//! - [`DeliveryTrigger`]: event guards and transitions
//! - [`Transmitter`]: serialization and channel fallback
//! - [`simulation`]: deterministic replay of lifecycle scenarios

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fields;
pub mod host;
pub mod measurement;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod tracker;
pub mod transmitter;
pub mod transport;
pub mod trigger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Configuration, TrackerOptions};
pub use error::{ScenarioError, TrackerError, TransportError};
pub use events::{EventKind, LifecycleEvent, SwapDetail};
pub use host::{Host, PageSnapshot, ReadyState};
pub use measurement::Measurement;
pub use scheduler::{DeferredQueue, Scheduler};
pub use session::SessionClock;
pub use simulation::{Scenario, SimulationReport, Step};
pub use tracker::{Tracker, Transmission};
pub use transmitter::{BeaconChannel, FallbackChannel, RecordingChannel, Route, Transmitter};
pub use trigger::{Beacon, BeaconKind, DeferredTask, DeliveryTrigger, Directive, Subscriptions};
