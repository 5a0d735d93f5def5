use anyhow::{bail, Context, Result};

use super::{timed, CheckResult, Checklist};
use crate::config::ProbeConfig;

pub async fn run_prover_checks(
    http: &reqwest::Client,
    url: &str,
    config: &ProbeConfig,
) -> Vec<CheckResult> {
    let mut checks = Checklist::default();

    let health = timed(config.timeout, async {
        let status = prover_health(http, url).await?;
        Ok::<_, anyhow::Error>(((), format!("HTTP {status}")))
    })
    .await;
    checks.record("Prover health", true, health);

    checks.into_results()
}

/// `GET {url}/health`, succeeding on any 2xx status.
pub(crate) async fn prover_health(http: &reqwest::Client, url: &str) -> Result<u16> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let status = http
        .get(&endpoint)
        .send()
        .await
        .with_context(|| format!("GET {endpoint} failed"))?
        .status();
    if !status.is_success() {
        bail!("GET {endpoint}: HTTP {}", status.as_u16());
    }
    Ok(status.as_u16())
}
