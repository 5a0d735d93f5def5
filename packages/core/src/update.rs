use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use serde::{Deserialize, Serialize};

use crate::{
    copy_array,
    fork::ForkLayout,
    hash::{hash, hash_key, merkle_reduce},
    period_at_slot, Pubkey, Root, VerifyError, PUBKEY_LEN, ROOT_LEN, SYNC_COMMITTEE_SIZE,
};

/// The 512 member keys of a sync committee plus their aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncCommittee {
    pubkeys: Vec<Pubkey>,
    aggregate_pubkey: Pubkey,
}

impl SyncCommittee {
    pub fn new(pubkeys: Vec<Pubkey>, aggregate_pubkey: Pubkey) -> Result<Self, VerifyError> {
        if pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err(VerifyError::CommitteeSizeMismatch {
                expected: SYNC_COMMITTEE_SIZE,
                actual: pubkeys.len(),
            });
        }
        Ok(Self {
            pubkeys,
            aggregate_pubkey,
        })
    }

    pub fn pubkeys(&self) -> &[Pubkey] {
        &self.pubkeys
    }

    pub fn aggregate_pubkey(&self) -> &Pubkey {
        &self.aggregate_pubkey
    }
}

/// Hash tree root of a sync committee container: the key-vector subtree
/// combined with the aggregate key leaf.
pub fn calculate_next_sync_committee_root(committee: &SyncCommittee) -> Root {
    let leaves = committee.pubkeys.iter().map(|pk| hash_key(pk)).collect();
    let pubkeys_root = merkle_reduce(leaves);
    hash(&[&pubkeys_root, &hash_key(&committee.aggregate_pubkey)])
}

/// A decoded light client update, reduced to the fields the committee proof needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightClientUpdate {
    /// Slot of the attested header. Absent when the source omitted it.
    pub attested_slot: Option<u64>,
    /// State root of the attested header.
    pub state_root: Root,
    pub next_sync_committee: SyncCommittee,
    pub next_sync_committee_branch: Vec<Root>,
}

impl LightClientUpdate {
    pub fn period(&self) -> Option<u64> {
        self.attested_slot.map(period_at_slot)
    }
}

// ---------------------------------------------------------------------------
// Beacon API JSON form
// ---------------------------------------------------------------------------

/// `data` object of a `/eth/v1/beacon/light_client/updates` JSON response.
///
/// Only the fields needed for the committee proof are modelled; everything
/// else in the document is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientUpdateJson {
    pub attested_header: AttestedHeaderJson,
    pub next_sync_committee: SyncCommitteeJson,
    pub next_sync_committee_branch: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedHeaderJson {
    pub beacon: BeaconHeaderJson,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconHeaderJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    pub state_root: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommitteeJson {
    pub pubkeys: Vec<String>,
    pub aggregate_pubkey: String,
}

impl LightClientUpdateJson {
    /// Decode the hex fields into a [`LightClientUpdate`] laid out for `layout`.
    pub fn decode(&self, layout: &ForkLayout) -> Result<LightClientUpdate, VerifyError> {
        let committee = &self.next_sync_committee;
        if committee.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err(VerifyError::CommitteeSizeMismatch {
                expected: SYNC_COMMITTEE_SIZE,
                actual: committee.pubkeys.len(),
            });
        }

        let mut pubkeys = Vec::with_capacity(SYNC_COMMITTEE_SIZE);
        for (i, pk) in committee.pubkeys.iter().enumerate() {
            pubkeys.push(parse_hex_fixed::<PUBKEY_LEN>(
                &format!("next_sync_committee.pubkeys[{i}]"),
                pk,
            )?);
        }
        let aggregate_pubkey = parse_hex_fixed::<PUBKEY_LEN>(
            "next_sync_committee.aggregate_pubkey",
            &committee.aggregate_pubkey,
        )?;

        let depth = layout.branch_depth();
        if self.next_sync_committee_branch.len() != depth {
            return Err(VerifyError::BranchLengthMismatch {
                expected: depth,
                actual: self.next_sync_committee_branch.len(),
            });
        }
        let mut branch = Vec::with_capacity(depth);
        for (i, node) in self.next_sync_committee_branch.iter().enumerate() {
            branch.push(parse_hex_fixed::<ROOT_LEN>(
                &format!("next_sync_committee_branch[{i}]"),
                node,
            )?);
        }

        let beacon = &self.attested_header.beacon;
        let state_root =
            parse_hex_fixed::<ROOT_LEN>("attested_header.beacon.state_root", &beacon.state_root)?;
        let attested_slot = match beacon.slot {
            Some(ref raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| VerifyError::InvalidSlot(raw.clone()))?,
            ),
            None => None,
        };

        Ok(LightClientUpdate {
            attested_slot,
            state_root,
            next_sync_committee: SyncCommittee::new(pubkeys, aggregate_pubkey)?,
            next_sync_committee_branch: branch,
        })
    }
}

impl From<&LightClientUpdate> for LightClientUpdateJson {
    fn from(update: &LightClientUpdate) -> Self {
        let committee = &update.next_sync_committee;
        Self {
            attested_header: AttestedHeaderJson {
                beacon: BeaconHeaderJson {
                    slot: update.attested_slot.map(|slot| slot.to_string()),
                    state_root: to_hex(&update.state_root),
                },
            },
            next_sync_committee: SyncCommitteeJson {
                pubkeys: committee.pubkeys().iter().map(|pk| to_hex(pk)).collect(),
                aggregate_pubkey: to_hex(committee.aggregate_pubkey()),
            },
            next_sync_committee_branch: update
                .next_sync_committee_branch
                .iter()
                .map(|node| to_hex(node))
                .collect(),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_hex_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N], VerifyError> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    let bytes = hex::decode(stripped).map_err(|_| VerifyError::InvalidHex {
        field: field.to_string(),
    })?;
    if bytes.len() != N {
        return Err(VerifyError::InvalidFieldLength {
            field: field.to_string(),
            expected: N,
            actual: bytes.len(),
        });
    }
    Ok(copy_array::<N>(&bytes))
}
