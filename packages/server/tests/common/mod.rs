//! Shared helpers: fixture chains and mock beacon and execution nodes.

#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lc_probe_core::{
    encode_update, fixtures, frame_response_chunk, LightClientUpdate, LightClientUpdateJson,
    ELECTRA, SLOTS_PER_PERIOD,
};
use lc_probe_server::transport::MemoryTransport;
use serde::Deserialize;
use serde_json::json;

pub const CURRENT_PERIOD: u64 = 1400;

/// Verifiable updates for `depth` periods ending at `current`.
pub fn chain(current: u64, depth: u64) -> BTreeMap<u64, LightClientUpdate> {
    (0..depth)
        .map(|offset| {
            let period = current - offset;
            let slot = period * SLOTS_PER_PERIOD + 32 * offset + 1;
            (period, fixtures::update(slot, &ELECTRA))
        })
        .collect()
}

/// Flip one bit in a branch sibling; the claimed state root is left alone.
pub fn tamper_branch(update: &mut LightClientUpdate) {
    update.next_sync_committee_branch[2][7] ^= 0x10;
}

pub fn head_slot(current: u64) -> u64 {
    current * SLOTS_PER_PERIOD + 4000
}

pub fn memory_node(updates: BTreeMap<u64, LightClientUpdate>) -> MemoryTransport {
    updates.into_iter().fold(
        MemoryTransport::new(head_slot(CURRENT_PERIOD), ELECTRA),
        |node, (period, update)| node.with_update(period, update),
    )
}

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct MockBeacon {
    head_slot: u64,
    fork: &'static str,
    updates: BTreeMap<u64, LightClientUpdate>,
}

#[derive(Deserialize)]
struct UpdatesQuery {
    start_period: u64,
}

async fn node_version() -> Json<serde_json::Value> {
    Json(json!({ "data": { "version": "MockBeacon/v0.1.0" } }))
}

async fn head(State(node): State<Arc<MockBeacon>>) -> Json<serde_json::Value> {
    Json(json!({
        "data": {
            "root": format!("0x{}", "00".repeat(32)),
            "canonical": true,
            "header": { "message": { "slot": node.head_slot.to_string(), "proposer_index": "7" } }
        }
    }))
}

async fn updates(
    State(node): State<Arc<MockBeacon>>,
    Query(query): Query<UpdatesQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(update) = node.updates.get(&query.start_period) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let wants_ssz = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/octet-stream"));

    if wants_ssz {
        let payload = encode_update(update, &ELECTRA).unwrap();
        (
            [(CONTENT_TYPE, "application/octet-stream")],
            frame_response_chunk(&payload, [0x6a, 0x95, 0xa1, 0xa9]),
        )
            .into_response()
    } else {
        Json(json!([{ "version": node.fork, "data": LightClientUpdateJson::from(update) }]))
            .into_response()
    }
}

/// Start a beacon node serving `updates` with its head in `CURRENT_PERIOD`.
pub async fn spawn_beacon(updates: BTreeMap<u64, LightClientUpdate>) -> String {
    spawn_beacon_tagged(updates, "electra").await
}

/// Like [`spawn_beacon`], tagging JSON updates with `fork` as their version.
pub async fn spawn_beacon_tagged(
    updates: BTreeMap<u64, LightClientUpdate>,
    fork: &'static str,
) -> String {
    let node = Arc::new(MockBeacon {
        head_slot: head_slot(CURRENT_PERIOD),
        fork,
        updates,
    });
    let router = Router::new()
        .route("/eth/v1/node/version", get(node_version))
        .route("/eth/v1/beacon/headers/head", get(head))
        .route("/eth/v1/beacon/light_client/updates", get(self::updates))
        .with_state(node);
    serve(router).await
}

/// Start a prover exposing only `GET /health`.
pub async fn spawn_prover() -> String {
    serve(Router::new().route("/health", get(|| async { Json(json!({ "status": "ok" })) }))).await
}

/// Mainnet block 0 as returned by `eth_getBlockByNumber`.
pub fn genesis_block() -> serde_json::Value {
    let zero32 = format!("0x{}", "00".repeat(32));
    let empty_trie = "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";
    json!({
        "parentHash": zero32,
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": format!("0x{}", "00".repeat(20)),
        "stateRoot": "0xd7f8974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544",
        "transactionsRoot": empty_trie,
        "receiptsRoot": empty_trie,
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "difficulty": "0x400000000",
        "number": "0x0",
        "gasLimit": "0x1388",
        "gasUsed": "0x0",
        "timestamp": "0x0",
        "extraData": "0x11bbe8db4e347b4e8c937c1c8370e4b5ed33adb3db69cbdb7a38e1e50b1b82fa",
        "mixHash": zero32,
        "nonce": "0x0000000000000042",
        "hash": "0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3",
        "transactions": [],
        "uncles": [],
    })
}

struct MockExecution {
    block: serde_json::Value,
    account_proof: Vec<String>,
}

async fn json_rpc(
    State(node): State<Arc<MockExecution>>,
    Json(request): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let id = request["id"].clone();
    let result = match request["method"].as_str() {
        Some("eth_chainId") => json!("0x1"),
        Some("eth_getBlockByNumber") => node.block.clone(),
        Some("eth_getProof") => json!({
            "address": request["params"][0],
            "balance": "0x0",
            "nonce": "0x0",
            "accountProof": node.account_proof,
            "storageProof": [],
        }),
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "method not found" },
            }))
        }
    };
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

/// Start an execution node serving `block` as the latest block and
/// `account_proof` for every `eth_getProof`.
pub async fn spawn_execution(block: serde_json::Value, account_proof: &[Vec<u8>]) -> String {
    let node = Arc::new(MockExecution {
        block,
        account_proof: account_proof
            .iter()
            .map(|node| format!("0x{}", hex::encode(node)))
            .collect(),
    });
    serve(Router::new().route("/", post(json_rpc)).with_state(node)).await
}
