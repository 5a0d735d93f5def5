use super::{timed, CheckResult, Checklist};
use crate::{config::ProbeConfig, rpc};

/// Account queried by the proof check. Any address works; absent accounts
/// still get a proof rooted at the state root.
const PROOF_ADDRESS: [u8; 20] = [0u8; 20];

pub async fn run_execution_checks(
    http: &reqwest::Client,
    url: &str,
    config: &ProbeConfig,
) -> Vec<CheckResult> {
    let mut checks = Checklist::default();

    let chain_id = timed(config.timeout, async {
        let id = rpc::eth_chain_id(http, url).await?;
        Ok::<_, anyhow::Error>((id, format!("chain id {id}")))
    })
    .await;
    checks.record("Chain ID", true, chain_id);

    let header = timed(config.timeout, async {
        let header = rpc::eth_get_block(http, url, "latest").await?;
        let summary = format!(
            "block {} hash 0x{} ({} header fields)",
            header.number,
            hex::encode(header.hash),
            header.field_count
        );
        Ok::<_, anyhow::Error>((header, summary))
    })
    .await;
    let Some(header) = checks.record("Latest block header", true, header) else {
        checks.skip("Account proof", "no verified block header");
        return checks.into_results();
    };

    let proof = timed(config.timeout, async {
        let proof = rpc::eth_get_proof(
            http,
            url,
            &PROOF_ADDRESS,
            header.number,
            &header.state_root,
        )
        .await?;
        let summary = format!(
            "{} nodes rooted at state root of block {}, balance 0x{}",
            proof.nodes.len(),
            header.number,
            if proof.balance.is_empty() {
                "0".to_string()
            } else {
                hex::encode(&proof.balance)
            }
        );
        Ok::<_, anyhow::Error>(((), summary))
    })
    .await;
    checks.record("Account proof", true, proof);

    checks.into_results()
}
