use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use lc_probe_core::ForkLayout;

/// Default number of sync committee periods walked by the history check:
/// the current one plus twenty before it.
pub const DEFAULT_HISTORY_DEPTH: u32 = 21;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Probe settings shared by the CLI and the HTTP API.
#[derive(Debug, Clone, Args)]
pub struct ProbeArgs {
    /// Per-request timeout in seconds.
    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Number of sync committee periods to verify, counting back from the current one.
    #[arg(long, env = "PROBE_HISTORY_DEPTH", default_value_t = DEFAULT_HISTORY_DEPTH)]
    pub history_depth: u32,

    /// Fork whose light client update layout the node is expected to serve.
    #[arg(long, env = "PROBE_FORK", default_value = "electra")]
    pub fork: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub history_depth: u32,
    pub layout: ForkLayout,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_depth: DEFAULT_HISTORY_DEPTH,
            layout: ForkLayout::default(),
        }
    }
}

impl TryFrom<&ProbeArgs> for ProbeConfig {
    type Error = anyhow::Error;

    fn try_from(args: &ProbeArgs) -> Result<Self> {
        let Some(layout) = ForkLayout::by_name(&args.fork) else {
            bail!("unsupported fork: {} (expected electra or deneb)", args.fork);
        };
        if args.history_depth == 0 {
            bail!("history depth must be at least 1");
        }
        if args.timeout_secs == 0 {
            bail!("timeout must be at least 1 second");
        }

        Ok(Self {
            timeout: Duration::from_secs(args.timeout_secs),
            history_depth: args.history_depth,
            layout,
        })
    }
}
