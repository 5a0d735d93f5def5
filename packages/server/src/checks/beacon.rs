use anyhow::{bail, Context, Result};
use lc_probe_core::{period_at_slot, verify_from_binary};
use tokio::sync::oneshot;

use super::{timed, CheckResult, Checklist};
use crate::{config::ProbeConfig, history::verify_from_json, transport::BeaconTransport};

/// Light client checks against a beacon node, in order.
pub async fn run_beacon_checks<T: BeaconTransport>(
    transport: &T,
    config: &ProbeConfig,
    cancel: &mut oneshot::Receiver<()>,
) -> Vec<CheckResult> {
    let mut checks = Checklist::default();

    let version = timed(config.timeout, async {
        let version = transport.fetch_node_version().await?;
        Ok::<_, anyhow::Error>(((), version))
    })
    .await;
    checks.record("Node version", false, version);

    let head = timed(config.timeout, async {
        let slot = transport.fetch_head_slot().await?;
        Ok::<_, anyhow::Error>((slot, format!("slot {slot} (period {})", period_at_slot(slot))))
    })
    .await;
    let Some(head_slot) = checks.record("Head slot", true, head) else {
        checks.skip("Light client update (SSZ)", "head slot unavailable");
        checks.skip("Light client update history", "head slot unavailable");
        return checks.into_results();
    };

    let latest = verify_latest_binary(transport, config, period_at_slot(head_slot)).await;
    checks.record("Light client update (SSZ)", true, latest);

    let history = verify_from_json(transport, config, cancel).await.map(|report| {
        let summary = match report.oldest_period() {
            Some(oldest) if report.verified.len() > 1 => format!(
                "{} periods verified ({oldest}..={})",
                report.verified.len(),
                report.current_period
            ),
            _ => format!("{} period(s) verified", report.verified.len()),
        };
        ((), summary)
    });
    checks.record("Light client update history", true, history);

    checks.into_results()
}

/// Fetch the SSZ update for `period` and verify its committee proof.
async fn verify_latest_binary<T: BeaconTransport>(
    transport: &T,
    config: &ProbeConfig,
    period: u64,
) -> Result<((), String)> {
    let bytes = timed(config.timeout, async {
        Ok::<_, anyhow::Error>(transport.fetch_binary_update(period).await?)
    })
    .await
    .context("failed to fetch SSZ update")?;

    let verified = verify_from_binary(&bytes, &config.layout)
        .with_context(|| format!("period {period} update rejected"))?;

    if let Some(served) = verified.period {
        if served != period {
            bail!("requested period {period} but node served period {served}");
        }
    }

    Ok((
        (),
        format!(
            "period {period}: committee root 0x{} proven against state root 0x{}",
            hex::encode(verified.committee_root),
            hex::encode(verified.state_root)
        ),
    ))
}
