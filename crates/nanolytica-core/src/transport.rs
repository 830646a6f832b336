//! HTTP delivery channels on reqwest + tokio.
//!
//! Both channels spawn the POST onto a runtime handle and return at once.
//! The beacon channel refuses oversized bodies and caps in-flight requests,
//! which is what lets the transmitter see a synchronous enqueue failure.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::config::TrackerOptions;
use crate::error::TransportError;
use crate::transmitter::{BeaconChannel, FallbackChannel, Transmitter, CONTENT_TYPE_JSON};

pub struct HttpBeacon {
    client: Client,
    handle: Handle,
    inflight: Arc<Semaphore>,
    max_body_bytes: usize,
}

impl HttpBeacon {
    /// The in-flight cap is clamped to what a semaphore can hold.
    pub fn new(client: Client, handle: Handle, options: &TrackerOptions) -> Self {
        let permits = options.max_inflight_beacons.min(Semaphore::MAX_PERMITS);
        Self {
            client,
            handle,
            inflight: Arc::new(Semaphore::new(permits)),
            max_body_bytes: options.beacon_max_body_bytes,
        }
    }
}

impl BeaconChannel for HttpBeacon {
    fn send_beacon(&self, endpoint: &str, body: &[u8]) -> bool {
        if body.len() > self.max_body_bytes {
            debug!(bytes = body.len(), limit = self.max_body_bytes, "beacon body too large");
            return false;
        }
        let Ok(permit) = self.inflight.clone().try_acquire_owned() else {
            debug!("beacon in-flight limit reached");
            return false;
        };

        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body.to_vec());
        self.handle.spawn(async move {
            let _permit = permit;
            match request.send().await {
                Ok(resp) => trace!(status = %resp.status(), "beacon delivered"),
                Err(err) => debug!(%err, "beacon delivery failed"),
            }
        });
        true
    }
}

pub struct HttpFallback {
    client: Client,
    handle: Handle,
}

impl HttpFallback {
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }
}

impl FallbackChannel for HttpFallback {
    fn post_keepalive(&self, endpoint: &str, body: Vec<u8>) {
        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body);
        self.handle.spawn(async move {
            match request.send().await.and_then(|resp| resp.error_for_status()) {
                Ok(resp) => trace!(status = %resp.status(), "fallback delivered"),
                Err(err) => debug!(%err, "fallback delivery failed; dropped"),
            }
        });
    }
}

/// Transmitter over HTTP using the current tokio runtime.
pub fn http_transmitter(options: &TrackerOptions) -> Result<Transmitter, TransportError> {
    let handle = Handle::try_current().map_err(|err| TransportError::NoRuntime(err.to_string()))?;
    let client = Client::builder()
        .user_agent(concat!("nanolytica/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(Transmitter::new(
        Some(Box::new(HttpBeacon::new(client.clone(), handle.clone(), options))),
        Box::new(HttpFallback::new(client, handle)),
    ))
}
