//! In-memory beacon node.
//!
//! Serves updates through the same encoders a node uses on the wire, so the
//! binary and JSON paths see byte-identical data to a live endpoint.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

use lc_probe_core::{
    encode_update, frame_response_chunk, ForkLayout, LightClientUpdate, LightClientUpdateJson,
};

use super::{updates_path, BeaconTransport, FetchError};

/// Electra mainnet fork digest, used for framing served payloads.
const FORK_DIGEST: [u8; 4] = [0x6a, 0x95, 0xa1, 0xa9];

#[derive(Debug, Default)]
pub struct MemoryTransport {
    layout: ForkLayout,
    version: Option<String>,
    head_slot: u64,
    updates: HashMap<u64, LightClientUpdate>,
    raw_binary: HashMap<u64, Vec<u8>>,
    delays: HashMap<u64, Duration>,
    requests: Mutex<Vec<u64>>,
}

impl MemoryTransport {
    pub fn new(head_slot: u64, layout: ForkLayout) -> Self {
        Self {
            layout,
            head_slot,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Serve `update` for `period`, regardless of its own attested slot.
    pub fn with_update(mut self, period: u64, update: LightClientUpdate) -> Self {
        self.updates.insert(period, update);
        self
    }

    /// Serve `bytes` verbatim on the binary path for `period`.
    pub fn with_raw_binary(mut self, period: u64, bytes: Vec<u8>) -> Self {
        self.raw_binary.insert(period, bytes);
        self
    }

    /// Delay every response for `period` by `delay`.
    pub fn with_delay(mut self, period: u64, delay: Duration) -> Self {
        self.delays.insert(period, delay);
        self
    }

    /// Periods requested so far, in request order.
    pub fn requested_periods(&self) -> Vec<u64> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    async fn lookup(&self, period: u64) -> Result<&LightClientUpdate, FetchError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(period);
        }
        if let Some(delay) = self.delays.get(&period) {
            tokio::time::sleep(*delay).await;
        }
        self.updates.get(&period).ok_or(FetchError::Missing {
            endpoint: updates_path(period),
        })
    }
}

impl BeaconTransport for MemoryTransport {
    async fn fetch_node_version(&self) -> Result<String, FetchError> {
        self.version.clone().ok_or(FetchError::Status {
            endpoint: "/eth/v1/node/version".to_string(),
            status: 404,
        })
    }

    async fn fetch_head_slot(&self) -> Result<u64, FetchError> {
        Ok(self.head_slot)
    }

    async fn fetch_binary_update(&self, period: u64) -> Result<Vec<u8>, FetchError> {
        if let Some(bytes) = self.raw_binary.get(&period) {
            return Ok(bytes.clone());
        }
        let update = self.lookup(period).await?;
        let payload = encode_update(update, &self.layout).map_err(|e| FetchError::Decode {
            endpoint: updates_path(period),
            message: e.to_string(),
        })?;
        Ok(frame_response_chunk(&payload, FORK_DIGEST))
    }

    async fn fetch_json_update(&self, period: u64) -> Result<LightClientUpdateJson, FetchError> {
        let update = self.lookup(period).await?;
        Ok(LightClientUpdateJson::from(update))
    }
}
