//! Historical sync committee verification over the JSON endpoint.

use std::fmt;

use anyhow::{Context, Result};
use lc_probe_core::{period_at_slot, verify_update, VerifiedUpdate, VerifyError};
use tokio::sync::oneshot;

use crate::{
    config::ProbeConfig,
    transport::{updates_path, with_timeout, BeaconTransport, FetchError},
};

/// Periods walked by a successful history check, newest first.
#[derive(Debug, Clone)]
pub struct HistoryReport {
    pub current_period: u64,
    pub verified: Vec<VerifiedUpdate>,
}

impl HistoryReport {
    pub fn oldest_period(&self) -> Option<u64> {
        self.verified.last().and_then(|v| v.period)
    }
}

#[derive(Debug)]
pub enum PeriodFailure {
    Fetch(FetchError),
    Verify(VerifyError),
    /// The node answered with an update attested in another period.
    WrongPeriod { served: u64 },
    Cancelled,
}

/// First period that failed. `offset` counts back from the current period.
#[derive(Debug)]
pub struct HistoryError {
    pub offset: u32,
    pub period: u64,
    pub failure: PeriodFailure,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (offset, period) = (self.offset, self.period);
        match &self.failure {
            PeriodFailure::Fetch(e) => write!(f, "period {period} (offset {offset}): {e}"),
            PeriodFailure::Verify(e) => write!(f, "period {period} (offset {offset}): {e}"),
            PeriodFailure::WrongPeriod { served } => write!(
                f,
                "period {period} (offset {offset}): node served an update from period {served}"
            ),
            PeriodFailure::Cancelled => {
                write!(f, "cancelled before period {period} (offset {offset})")
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Verify the committee proofs of `config.history_depth` periods, starting at
/// the period of the node's head slot and walking back.
pub async fn verify_from_json<T: BeaconTransport>(
    transport: &T,
    config: &ProbeConfig,
    cancel: &mut oneshot::Receiver<()>,
) -> Result<HistoryReport> {
    let head_slot = with_timeout(
        "/eth/v1/beacon/headers/head",
        config.timeout,
        transport.fetch_head_slot(),
    )
    .await
    .context("failed to read head slot")?;

    let report = verify_history(transport, period_at_slot(head_slot), config, cancel).await?;
    Ok(report)
}

/// Walk periods `current, current - 1, ...`, failing on the first bad one.
///
/// Stops early at period 0 on chains younger than the configured depth.
pub async fn verify_history<T: BeaconTransport>(
    transport: &T,
    current_period: u64,
    config: &ProbeConfig,
    cancel: &mut oneshot::Receiver<()>,
) -> Result<HistoryReport, HistoryError> {
    let mut verified = Vec::with_capacity(config.history_depth as usize);

    for offset in 0..config.history_depth {
        let Some(period) = current_period.checked_sub(u64::from(offset)) else {
            break;
        };
        let fail = |failure: PeriodFailure| HistoryError {
            offset,
            period,
            failure,
        };

        if cancel.try_recv().is_ok() {
            tracing::info!(offset, period, "history verification cancelled");
            return Err(fail(PeriodFailure::Cancelled));
        }

        let endpoint = updates_path(period);
        let json = with_timeout(&endpoint, config.timeout, transport.fetch_json_update(period))
            .await
            .map_err(|e| fail(PeriodFailure::Fetch(e)))?;

        let update = json
            .decode(&config.layout)
            .map_err(|e| fail(PeriodFailure::Verify(e)))?;

        if let Some(served) = update.period() {
            if served != period {
                return Err(fail(PeriodFailure::WrongPeriod { served }));
            }
        }

        let result = verify_update(&update, &config.layout).map_err(|e| {
            tracing::warn!(offset, period, error = %e, "committee proof rejected");
            fail(PeriodFailure::Verify(e))
        })?;

        tracing::debug!(offset, period, "period verified");
        verified.push(result);
    }

    tracing::info!(
        current_period,
        periods = verified.len(),
        "history verification complete"
    );
    Ok(HistoryReport {
        current_period,
        verified,
    })
}
