//! Node type auto-detection.
//!
//! One capability probe per node kind runs concurrently. The first probe to
//! succeed decides the kind and the rest are aborted.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::task::JoinSet;

use crate::{
    checks::{prover_health, timed, NodeKind},
    rpc,
    transport::{BeaconClient, BeaconTransport},
};

pub async fn detect_node_kind(http: &reqwest::Client, url: &str, timeout: Duration) -> Result<NodeKind> {
    let mut probes = JoinSet::new();

    for kind in [NodeKind::Beacon, NodeKind::Execution, NodeKind::Prover] {
        let http = http.clone();
        let url = url.to_string();
        probes.spawn(async move {
            let outcome = timed(timeout, probe(&http, &url, kind)).await;
            (kind, outcome)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = probes.join_next().await {
        let (kind, outcome) = joined.context("detection probe panicked")?;
        match outcome {
            Ok(()) => {
                probes.abort_all();
                tracing::info!(%url, %kind, "node kind detected");
                return Ok(kind);
            }
            Err(e) => {
                tracing::debug!(%url, %kind, error = %format!("{e:#}"), "probe failed");
                failures.push(format!("{kind}: {e:#}"));
            }
        }
    }

    failures.sort();
    bail!("could not detect node kind for {url} ({})", failures.join("; "))
}

async fn probe(http: &reqwest::Client, url: &str, kind: NodeKind) -> Result<()> {
    match kind {
        NodeKind::Beacon => {
            BeaconClient::new(http.clone(), url).fetch_node_version().await?;
        }
        NodeKind::Execution => {
            rpc::eth_chain_id(http, url).await?;
        }
        NodeKind::Prover => {
            prover_health(http, url).await?;
        }
    }
    Ok(())
}
