//! Beacon node data sources for the light client checks.
//!
//! [`BeaconClient`] talks to a real node over the Beacon API; [`MemoryTransport`]
//! serves fixed updates from memory. Both answer the same four requests.

mod http;
mod memory;

use std::{fmt, future::Future, time::Duration};

use lc_probe_core::LightClientUpdateJson;

pub use http::BeaconClient;
pub use memory::MemoryTransport;

/// Source of light client data for one beacon node.
pub trait BeaconTransport: Send + Sync {
    /// `GET /eth/v1/node/version`.
    fn fetch_node_version(&self) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Slot of the node's current head header.
    fn fetch_head_slot(&self) -> impl Future<Output = Result<u64, FetchError>> + Send;

    /// Light client update for `period`, SSZ-encoded with response-chunk framing.
    fn fetch_binary_update(
        &self,
        period: u64,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Light client update for `period` as the `data` object of the JSON response.
    fn fetch_json_update(
        &self,
        period: u64,
    ) -> impl Future<Output = Result<LightClientUpdateJson, FetchError>> + Send;
}

/// Failure to obtain a response, always tied to the request that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Timeout { endpoint: String, after: Duration },
    Status { endpoint: String, status: u16 },
    Request { endpoint: String, message: String },
    Decode { endpoint: String, message: String },
    Missing { endpoint: String },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { endpoint, after } => {
                write!(f, "{endpoint}: timed out after {}s", after.as_secs_f64())
            }
            Self::Status { endpoint, status } => write!(f, "{endpoint}: HTTP {status}"),
            Self::Request { endpoint, message } => write!(f, "{endpoint}: {message}"),
            Self::Decode { endpoint, message } => {
                write!(f, "{endpoint}: unexpected response: {message}")
            }
            Self::Missing { endpoint } => write!(f, "{endpoint}: no data returned"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Bound `fut` by `timeout`, reporting expiry against `endpoint`.
pub async fn with_timeout<T, F>(endpoint: &str, timeout: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            endpoint: endpoint.to_string(),
            after: timeout,
        }),
    }
}

/// Path of the light client updates endpoint for a single period.
pub fn updates_path(period: u64) -> String {
    format!("/eth/v1/beacon/light_client/updates?start_period={period}&count=1")
}
