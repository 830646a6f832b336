//! Core error types for nanolytica-core.
//!
//! The tracker lifecycle itself never surfaces errors to the host page.
//! These types cover the edges around it: loading scenarios, building
//! transports, and the I/O done by tooling.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nanolytica-core.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Scenario-related errors
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Transport construction errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scenario loading and validation errors.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Failed to read the scenario file
    #[error("Failed to load scenario from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to parse the scenario document
    #[error("Failed to parse scenario: {0}")]
    ParseFailed(String),

    /// Steps are not in chronological order
    #[error("Step {index} at {at_ms}ms is earlier than the previous step at {previous_ms}ms")]
    OutOfOrder {
        index: usize,
        at_ms: i64,
        previous_ms: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Transport-specific errors.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// No tokio runtime available to spawn deliveries on
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

impl From<toml::de::Error> for ScenarioError {
    fn from(err: toml::de::Error) -> Self {
        ScenarioError::ParseFailed(err.to_string())
    }
}

/// Result type alias for TrackerError
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
