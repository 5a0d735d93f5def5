//! Named node checks and the suitability verdict.

mod beacon;
mod execution;
mod prover;

use std::{fmt, future::Future, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};

use crate::{config::ProbeConfig, transport::BeaconClient};

pub use beacon::run_beacon_checks;
pub use execution::run_execution_checks;
pub use prover::run_prover_checks;
pub(crate) use prover::prover_health;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Beacon,
    Execution,
    Prover,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beacon => "beacon",
            Self::Execution => "execution",
            Self::Prover => "prover",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub name: String,
    pub result: String,
    pub passed: bool,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub url: String,
    pub kind: NodeKind,
    pub results: Vec<CheckResult>,
    pub suitable: bool,
}

impl CheckReport {
    /// A node is suitable when none of its required checks failed.
    pub fn new(url: &str, kind: NodeKind, results: Vec<CheckResult>) -> Self {
        let suitable = results.iter().all(|r| r.passed || !r.required);
        Self {
            url: url.to_string(),
            kind,
            results,
            suitable,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Ordered check results for one node.
#[derive(Debug, Default)]
pub(crate) struct Checklist {
    results: Vec<CheckResult>,
}

impl Checklist {
    /// Record `outcome` under `name`. Returns the success value, if any.
    pub fn record<T>(
        &mut self,
        name: &str,
        required: bool,
        outcome: Result<(T, String)>,
    ) -> Option<T> {
        let (value, passed, result) = match outcome {
            Ok((value, summary)) => (Some(value), true, summary),
            Err(e) => (None, false, format!("{e:#}")),
        };

        if passed {
            tracing::info!(check = name, result = %result, "check passed");
        } else if required {
            tracing::warn!(check = name, error = %result, "required check failed");
        } else {
            tracing::info!(check = name, error = %result, "optional check failed");
        }

        self.results.push(CheckResult {
            name: name.to_string(),
            result,
            passed,
            required,
        });
        value
    }

    /// Record a required check that could not run because an earlier one failed.
    pub fn skip(&mut self, name: &str, reason: &str) {
        self.results.push(CheckResult {
            name: name.to_string(),
            result: format!("skipped: {reason}"),
            passed: false,
            required: true,
        });
    }

    pub fn into_results(self) -> Vec<CheckResult> {
        self.results
    }
}

/// Bound `fut` by `timeout`.
pub(crate) async fn timed<T>(timeout: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!("timed out after {}s", timeout.as_secs_f64()),
    }
}

/// A cancel receiver for one check run that fires once `stop` reads `true`,
/// including when it already does.
///
/// The forwarding task ends when the run drops its receiver.
pub fn cancel_on_stop(mut stop: watch::Receiver<bool>) -> oneshot::Receiver<()> {
    let (mut cancel_tx, cancel_rx) = oneshot::channel();
    tokio::spawn(async move {
        let stopped = tokio::select! {
            changed = stop.wait_for(|stopped| *stopped) => changed.is_ok(),
            _ = cancel_tx.closed() => false,
        };
        if stopped {
            let _ = cancel_tx.send(());
        }
    });
    cancel_rx
}

/// Run the checks for `kind` against the node at `url`.
pub async fn run_checks(
    http: &reqwest::Client,
    url: &str,
    kind: NodeKind,
    config: &ProbeConfig,
    cancel: &mut oneshot::Receiver<()>,
) -> CheckReport {
    tracing::info!(%url, %kind, "running checks");
    let results = match kind {
        NodeKind::Beacon => {
            let client = BeaconClient::new(http.clone(), url).with_fork(config.layout);
            run_beacon_checks(&client, config, cancel).await
        }
        NodeKind::Execution => run_execution_checks(http, url, config).await,
        NodeKind::Prover => run_prover_checks(http, url, config).await,
    };
    CheckReport::new(url, kind, results)
}
