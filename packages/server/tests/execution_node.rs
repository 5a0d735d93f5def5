//! Execution checks against a mock JSON-RPC node.

mod common;

use common::{genesis_block, spawn_execution};
use lc_probe_server::{
    checks::{run_execution_checks, CheckReport, CheckResult, NodeKind},
    config::ProbeConfig,
    rpc,
};
use serde_json::Value;

/// An RLP-shaped trie node; only its keccak matters to the check.
fn state_trie_root_node() -> Vec<u8> {
    let mut node = vec![0xf8, 0x51];
    node.extend((0..0x51u8).map(|i| i.wrapping_mul(37)));
    node
}

/// Genesis with its state root replaced by `keccak256(root_node)` and the
/// block hash recomputed to match.
fn block_committing_to(root_node: &[u8]) -> Value {
    let mut block = genesis_block();
    block["stateRoot"] = format!("0x{}", hex::encode(rpc::keccak256(root_node))).into();
    let hash = rpc::block_hash(block.as_object().unwrap()).unwrap();
    block["hash"] = format!("0x{}", hex::encode(hash)).into();
    block
}

async fn run(url: &str) -> Vec<CheckResult> {
    run_execution_checks(&reqwest::Client::new(), url, &ProbeConfig::default()).await
}

fn result<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckResult {
    results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no {name} check in {results:?}"))
}

#[tokio::test]
async fn honest_node_passes_every_check() {
    let root_node = state_trie_root_node();
    let url = spawn_execution(block_committing_to(&root_node), &[root_node, vec![0xc0]]).await;

    let results = run(&url).await;
    let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Chain ID", "Latest block header", "Account proof"]);
    assert!(results.iter().all(|r| r.passed && r.required), "{results:?}");

    assert_eq!(result(&results, "Chain ID").result, "chain id 1");
    assert!(result(&results, "Latest block header")
        .result
        .contains("(15 header fields)"));
    assert!(result(&results, "Account proof").result.starts_with("2 nodes"));
    assert!(CheckReport::new(&url, NodeKind::Execution, results).suitable);
}

#[tokio::test]
async fn genesis_header_matches_its_reported_hash() {
    let url = spawn_execution(genesis_block(), &[state_trie_root_node()]).await;

    let results = run(&url).await;
    let header = result(&results, "Latest block header");
    assert!(header.passed, "{header:?}");
    assert_eq!(
        header.result,
        "block 0 hash 0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3 \
         (15 header fields)"
    );

    // The served proof node is not the genesis state trie root.
    let proof = result(&results, "Account proof");
    assert!(!proof.passed);
    assert!(
        proof.result.contains(
            "does not hash to state root \
             0xd7f8974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544"
        ),
        "{}",
        proof.result
    );
}

#[tokio::test]
async fn state_root_disagreeing_with_the_proof_fails() {
    let root_node = state_trie_root_node();
    let mut other_node = root_node.clone();
    other_node[10] ^= 0x01;
    let url = spawn_execution(block_committing_to(&root_node), &[other_node]).await;

    let results = run(&url).await;
    assert!(result(&results, "Latest block header").passed);
    let proof = result(&results, "Account proof");
    assert!(!proof.passed);
    assert!(proof.result.contains("first proof node does not hash to state root"));
    assert!(!CheckReport::new(&url, NodeKind::Execution, results).suitable);
}

#[tokio::test]
async fn wrong_block_hash_fails_the_header_and_skips_the_proof() {
    let mut block = genesis_block();
    block["hash"] = format!("0x{}", "ff".repeat(32)).into();
    let url = spawn_execution(block, &[state_trie_root_node()]).await;

    let results = run(&url).await;
    assert!(result(&results, "Chain ID").passed);

    let header = result(&results, "Latest block header");
    assert!(!header.passed);
    assert_eq!(
        header.result,
        format!(
            "block 0: header hashes to \
             0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3 but node reported 0x{}",
            "ff".repeat(32)
        )
    );

    let proof = result(&results, "Account proof");
    assert!(!proof.passed && proof.required);
    assert_eq!(proof.result, "skipped: no verified block header");
}

#[tokio::test]
async fn empty_account_proof_fails() {
    let url = spawn_execution(block_committing_to(&state_trie_root_node()), &[]).await;

    let results = run(&url).await;
    let proof = result(&results, "Account proof");
    assert!(!proof.passed);
    assert_eq!(proof.result, "eth_getProof: accountProof is empty");
}
