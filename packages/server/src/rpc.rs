//! Execution node JSON-RPC probes: chain id, latest header and account proofs.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: Value) -> Result<Value> {
    let req = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };

    let resp = client
        .post(url)
        .json(&req)
        .send()
        .await
        .with_context(|| format!("{method} request failed"))?;

    if !resp.status().is_success() {
        bail!("{method}: HTTP {}", resp.status().as_u16());
    }

    let body: RpcResponse = resp
        .json()
        .await
        .with_context(|| format!("{method}: response is not JSON-RPC"))?;

    if let Some(err) = body.error {
        bail!("{method}: RPC error ({}): {}", err.code, err.message);
    }
    match body.result {
        Some(Value::Null) | None => bail!("{method}: empty result"),
        Some(result) => Ok(result),
    }
}

pub async fn eth_chain_id(client: &reqwest::Client, url: &str) -> Result<u64> {
    let result = rpc_call(client, url, "eth_chainId", serde_json::json!([])).await?;
    let quantity = result.as_str().context("eth_chainId: expected a hex string")?;
    parse_hex_u64(quantity).context("eth_chainId: invalid quantity")
}

/// Header of a block whose RLP re-encoding hashed to the hash the node reported.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: [u8; 32],
    pub state_root: [u8; 32],
    pub field_count: usize,
}

/// Fetch a block header and check that it hashes to the reported block hash.
pub async fn eth_get_block(client: &reqwest::Client, url: &str, block_tag: &str) -> Result<BlockHeader> {
    let result = rpc_call(
        client,
        url,
        "eth_getBlockByNumber",
        serde_json::json!([block_tag, false]),
    )
    .await?;
    let block = result.as_object().context("eth_getBlockByNumber: expected a block object")?;

    let number = parse_hex_u64(hex_field(block, "number")?).context("invalid block number")?;
    let state_root = parse_hash(hex_field(block, "stateRoot")?).context("invalid stateRoot")?;
    let reported = parse_hash(hex_field(block, "hash")?).context("invalid block hash")?;

    let (rlp, field_count) = encode_header(block)?;
    let computed = keccak256(&rlp);
    if computed != reported {
        bail!(
            "block {number}: header hashes to 0x{} but node reported 0x{}",
            hex::encode(computed),
            hex::encode(reported)
        );
    }

    Ok(BlockHeader {
        number,
        hash: reported,
        state_root,
        field_count,
    })
}

#[derive(Debug, Clone)]
pub struct AccountProof {
    /// Balance as minimal big-endian bytes.
    pub balance: Vec<u8>,
    /// RLP-encoded trie nodes, root first.
    pub nodes: Vec<Vec<u8>>,
}

/// Fetch `eth_getProof` for `address` at `block_number` and check that the
/// first node is the state trie root.
pub async fn eth_get_proof(
    client: &reqwest::Client,
    url: &str,
    address: &[u8; 20],
    block_number: u64,
    state_root: &[u8; 32],
) -> Result<AccountProof> {
    let result = rpc_call(
        client,
        url,
        "eth_getProof",
        serde_json::json!([format!("0x{}", hex::encode(address)), [], format!("0x{block_number:x}")]),
    )
    .await?;
    let obj = result.as_object().context("eth_getProof: expected a proof object")?;

    let balance = normalize_quantity(hex_field(obj, "balance")?);
    let nodes = obj
        .get("accountProof")
        .and_then(Value::as_array)
        .context("eth_getProof: missing accountProof")?
        .iter()
        .enumerate()
        .map(|(i, node)| {
            node.as_str()
                .with_context(|| format!("accountProof[{i}] is not a string"))
                .and_then(parse_hex_bytes)
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(root_node) = nodes.first() else {
        bail!("eth_getProof: accountProof is empty");
    };
    if keccak256(root_node) != *state_root {
        bail!(
            "eth_getProof: first proof node does not hash to state root 0x{}",
            hex::encode(state_root)
        );
    }

    Ok(AccountProof { balance, nodes })
}

// ---------------------------------------------------------------------------
// Header RLP
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Field {
    Bytes(&'static str),
    Quantity(&'static str),
}

/// Fields every header since the merge carries, in RLP order.
const BASE_FIELDS: [Field; 15] = [
    Field::Bytes("parentHash"),
    Field::Bytes("sha3Uncles"),
    Field::Bytes("miner"),
    Field::Bytes("stateRoot"),
    Field::Bytes("transactionsRoot"),
    Field::Bytes("receiptsRoot"),
    Field::Bytes("logsBloom"),
    Field::Quantity("difficulty"),
    Field::Quantity("number"),
    Field::Quantity("gasLimit"),
    Field::Quantity("gasUsed"),
    Field::Quantity("timestamp"),
    Field::Bytes("extraData"),
    Field::Bytes("mixHash"),
    Field::Bytes("nonce"),
];

/// Fork-added fields. Each is appended only when present, and the list stops
/// at the first absent one.
const FORK_FIELDS: [Field; 6] = [
    Field::Quantity("baseFeePerGas"),
    Field::Bytes("withdrawalsRoot"),
    Field::Quantity("blobGasUsed"),
    Field::Quantity("excessBlobGas"),
    Field::Bytes("parentBeaconBlockRoot"),
    Field::Bytes("requestsHash"),
];

/// Keccak-256 of the RLP encoding of a JSON header.
pub fn block_hash(block: &Map<String, Value>) -> Result<[u8; 32]> {
    let (rlp, _) = encode_header(block)?;
    Ok(keccak256(&rlp))
}

/// RLP-encode a JSON header. Returns the encoding and the number of fields used.
fn encode_header(block: &Map<String, Value>) -> Result<(Vec<u8>, usize)> {
    let present = FORK_FIELDS
        .iter()
        .take_while(|f| block.contains_key(field_name(**f)))
        .count();

    let mut items = Vec::with_capacity(BASE_FIELDS.len() + present);
    for field in BASE_FIELDS.iter().chain(&FORK_FIELDS[..present]) {
        let raw = hex_field(block, field_name(*field))?;
        let value = match field {
            Field::Bytes(name) => parse_hex_bytes(raw).with_context(|| format!("invalid {name}"))?,
            Field::Quantity(_) => normalize_quantity(raw),
        };
        items.push(rlp_string(&value));
    }

    let count = items.len();
    Ok((rlp_list(&items), count))
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Bytes(name) | Field::Quantity(name) => name,
    }
}

fn rlp_string(data: &[u8]) -> Vec<u8> {
    match data {
        [b] if *b < 0x80 => vec![*b],
        _ => with_length_prefix(0x80, data),
    }
}

fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    with_length_prefix(0xc0, &items.concat())
}

/// Prefix `payload` with an RLP length header based at `offset` (0x80 or 0xc0).
fn with_length_prefix(offset: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    if payload.len() <= 55 {
        out.push(offset + payload.len() as u8);
    } else {
        let len = payload.len().to_be_bytes();
        let skip = len.iter().take_while(|b| **b == 0).count();
        out.push(offset + 55 + (len.len() - skip) as u8);
        out.extend_from_slice(&len[skip..]);
    }
    out.extend_from_slice(payload);
    out
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

fn hex_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .with_context(|| format!("missing field {key}"))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Minimal big-endian bytes of a hex quantity. Zero is empty.
fn normalize_quantity(quantity: &str) -> Vec<u8> {
    let digits = strip_0x(quantity).trim_start_matches('0');
    if digits.is_empty() {
        return Vec::new();
    }
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}")).unwrap_or_default()
    } else {
        hex::decode(digits).unwrap_or_default()
    }
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).with_context(|| format!("invalid hex string {s:?}"))
}

fn parse_hash(s: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex_bytes(s)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("expected 32 bytes, got {}", b.len()))
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    u64::from_str_radix(strip_0x(s), 16).with_context(|| format!("invalid hex quantity {s:?}"))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use tiny_keccak::{Hasher, Keccak};
    let mut keccak = Keccak::v256();
    keccak.update(data);
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    out
}
