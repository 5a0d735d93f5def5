//! Deterministic committees and self-consistent updates.
//!
//! Keys are not valid BLS points; only their bytes matter to the committee proof.

use alloc::vec::Vec;

use crate::{
    fork::ForkLayout,
    hash::hash,
    merkle::merkle_root_from_branch,
    update::{calculate_next_sync_committee_root, LightClientUpdate, SyncCommittee},
    Pubkey, Root, SYNC_COMMITTEE_SIZE,
};

/// Key `index` of committee `seed`: a counter prefix followed by a fill byte.
pub fn pubkey(seed: u8, index: usize) -> Pubkey {
    let mut pk = [seed; 48];
    pk[..2].copy_from_slice(&(index as u16).to_be_bytes());
    pk[47] = 0x80 | seed;
    pk
}

pub fn committee(seed: u8) -> SyncCommittee {
    let pubkeys = (0..SYNC_COMMITTEE_SIZE).map(|i| pubkey(seed, i)).collect();
    let mut aggregate = [0xa0u8; 48];
    aggregate[0] = seed;
    SyncCommittee::new(pubkeys, aggregate).expect("fixture committee has 512 keys")
}

/// Sibling hashes for the next-committee path, derived from `seed`.
pub fn branch(seed: u8, layout: &ForkLayout) -> Vec<Root> {
    (0..layout.branch_depth())
        .map(|level| hash(&[b"branch", &[seed, level as u8]]))
        .collect()
}

/// An update attested at `slot` whose state root commits to its committee.
pub fn update(slot: u64, layout: &ForkLayout) -> LightClientUpdate {
    let seed = (slot / crate::SLOTS_PER_PERIOD) as u8;
    let next_sync_committee = committee(seed);
    let next_sync_committee_branch = branch(seed, layout);
    let leaf = calculate_next_sync_committee_root(&next_sync_committee);
    let state_root = merkle_root_from_branch(
        layout.next_sync_committee_gindex,
        &next_sync_committee_branch,
        &leaf,
    )
    .expect("fixture branch matches layout depth");

    LightClientUpdate {
        attested_slot: Some(slot),
        state_root,
        next_sync_committee,
        next_sync_committee_branch,
    }
}
