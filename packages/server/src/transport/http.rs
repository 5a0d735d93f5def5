//! Beacon API client over HTTP.

use lc_probe_core::{ForkLayout, LightClientUpdateJson};
use reqwest::header::ACCEPT;
use serde::{de::DeserializeOwned, Deserialize};

use super::{updates_path, BeaconTransport, FetchError};

const JSON: &str = "application/json";
const SSZ: &str = "application/octet-stream";

/// Client for one beacon node's REST API.
#[derive(Debug, Clone)]
pub struct BeaconClient {
    http: reqwest::Client,
    base_url: String,
    /// Fork the JSON updates must be tagged with. Untagged updates pass.
    fork: Option<ForkLayout>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct NodeVersion {
    version: String,
}

#[derive(Deserialize)]
struct HeaderEnvelope {
    header: SignedHeader,
}

#[derive(Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Deserialize)]
struct HeaderMessage {
    slot: String,
}

/// One element of the JSON updates array.
#[derive(Deserialize)]
struct VersionedUpdate {
    #[serde(default)]
    version: Option<String>,
    data: LightClientUpdateJson,
}

impl BeaconClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            fork: None,
        }
    }

    /// Reject JSON updates whose `version` names a fork other than `layout`.
    pub fn with_fork(mut self, layout: ForkLayout) -> Self {
        self.fork = Some(layout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, accept: &str) -> Result<reqwest::Response, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                endpoint: path.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        self.get(path, JSON)
            .await?
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode {
                endpoint: path.to_string(),
                message: e.to_string(),
            })
    }
}

impl BeaconTransport for BeaconClient {
    async fn fetch_node_version(&self) -> Result<String, FetchError> {
        let resp: DataEnvelope<NodeVersion> = self.get_json("/eth/v1/node/version").await?;
        Ok(resp.data.version)
    }

    async fn fetch_head_slot(&self) -> Result<u64, FetchError> {
        let path = "/eth/v1/beacon/headers/head";
        let resp: DataEnvelope<HeaderEnvelope> = self.get_json(path).await?;
        let slot = resp.data.header.message.slot;
        slot.parse::<u64>().map_err(|_| FetchError::Decode {
            endpoint: path.to_string(),
            message: format!("invalid slot {slot:?}"),
        })
    }

    async fn fetch_binary_update(&self, period: u64) -> Result<Vec<u8>, FetchError> {
        let path = updates_path(period);
        let body = self
            .get(&path, SSZ)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::Request {
                endpoint: path.clone(),
                message: e.to_string(),
            })?;

        if body.is_empty() {
            return Err(FetchError::Missing { endpoint: path });
        }
        Ok(body.to_vec())
    }

    async fn fetch_json_update(&self, period: u64) -> Result<LightClientUpdateJson, FetchError> {
        let path = updates_path(period);
        let updates: Vec<VersionedUpdate> = self.get_json(&path).await?;
        let first = updates
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Missing {
                endpoint: path.clone(),
            })?;

        if let Some(ref version) = first.version {
            tracing::debug!(period, version = %version, "received light client update");
            if let Some(fork) = self.fork {
                if !version.eq_ignore_ascii_case(fork.name) {
                    return Err(FetchError::Decode {
                        endpoint: path,
                        message: format!("update is for fork {version}, expected {}", fork.name),
                    });
                }
            }
        }
        Ok(first.data)
    }
}
