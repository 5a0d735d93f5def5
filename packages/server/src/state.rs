use crate::config::ProbeConfig;

/// Shared application state.
pub struct AppState {
    /// Probe settings applied to every API request.
    pub config: ProbeConfig,
    /// HTTP client reused across probes.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}
