//! Fixed-layout SSZ codec for the `LightClientUpdate` container.
//!
//! Only the leading fields are decoded:
//!
//! ```text
//! [0..4)                      offset O of attested_header (u32 LE)
//! [4..4+512*48)               next_sync_committee.pubkeys
//! [..+48)                     next_sync_committee.aggregate_pubkey
//! [..+depth*32)               next_sync_committee_branch
//! ...                         remaining fixed fields (ignored)
//! [O..O+8)                    attested_header.beacon.slot (u64 LE)
//! [O+48..O+80)                attested_header.beacon.state_root
//! ```
//!
//! Beacon nodes serving `application/octet-stream` wrap each update in a
//! response chunk: an 8-byte LE length, a 4-byte fork digest, then the payload.

use alloc::vec::Vec;

use crate::{
    copy_array, fork::ForkLayout, update::SyncCommittee, LightClientUpdate, Pubkey, Root,
    VerifyError, PUBKEY_LEN, ROOT_LEN, SYNC_COMMITTEE_SIZE,
};

pub const FRAME_HEADER_LEN: usize = 12;
/// Size of a `BeaconBlockHeader` (slot, proposer, parent, state, body).
pub const ATTESTED_HEADER_LEN: usize = 112;

const OFFSET_LEN: usize = 4;
const MIN_UPDATE_LEN: usize = 8;
const HEADER_SLOT: usize = 0;
const HEADER_STATE_ROOT: usize = 48;
const HEADER_STATE_ROOT_END: usize = HEADER_STATE_ROOT + ROOT_LEN;

/// Strip the response-chunk framing and return the SSZ payload.
///
/// The payload runs from byte 12 for the number of bytes given by the low
/// 32 bits of the length prefix, clamped to the end of the buffer.
pub fn unwrap_response_chunk(bytes: &[u8]) -> Result<&[u8], VerifyError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(VerifyError::BufferTooShort {
            context: "response chunk",
            needed: FRAME_HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let length = u32::from_le_bytes(copy_array::<4>(&bytes[0..4])) as usize;
    let end = FRAME_HEADER_LEN.saturating_add(length).min(bytes.len());
    Ok(&bytes[FRAME_HEADER_LEN..end])
}

/// Wrap an SSZ payload the way a beacon node does for a single chunk.
pub fn frame_response_chunk(payload: &[u8], fork_digest: [u8; 4]) -> Vec<u8> {
    let chunk_len = (fork_digest.len() + payload.len()) as u64;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(&chunk_len.to_le_bytes());
    out.extend_from_slice(&fork_digest);
    out.extend_from_slice(payload);
    out
}

pub fn decode_framed_update(
    bytes: &[u8],
    layout: &ForkLayout,
) -> Result<LightClientUpdate, VerifyError> {
    decode_update(unwrap_response_chunk(bytes)?, layout)
}

/// Decode an unframed `LightClientUpdate` container.
pub fn decode_update(bytes: &[u8], layout: &ForkLayout) -> Result<LightClientUpdate, VerifyError> {
    if bytes.len() < MIN_UPDATE_LEN {
        return Err(VerifyError::BufferTooShort {
            context: "light client update",
            needed: MIN_UPDATE_LEN,
            actual: bytes.len(),
        });
    }

    let header_offset = u32::from_le_bytes(copy_array::<4>(&bytes[0..OFFSET_LEN])) as usize;
    if header_offset > bytes.len() {
        return Err(VerifyError::OffsetOutOfBounds {
            offset: header_offset,
            len: bytes.len(),
        });
    }

    let fixed_end = layout.fixed_part_end();
    if bytes.len() < fixed_end {
        return Err(VerifyError::BufferTooShort {
            context: "light client update fixed part",
            needed: fixed_end,
            actual: bytes.len(),
        });
    }
    if header_offset < fixed_end {
        return Err(VerifyError::OffsetOverlapsFixedPart {
            offset: header_offset,
            fixed_end,
        });
    }
    if bytes.len() < header_offset + HEADER_STATE_ROOT_END {
        return Err(VerifyError::BufferTooShort {
            context: "attested header",
            needed: header_offset + HEADER_STATE_ROOT_END,
            actual: bytes.len(),
        });
    }

    let aggregate_start = OFFSET_LEN + SYNC_COMMITTEE_SIZE * PUBKEY_LEN;
    let pubkeys: Vec<Pubkey> = bytes[OFFSET_LEN..aggregate_start]
        .chunks_exact(PUBKEY_LEN)
        .map(copy_array::<PUBKEY_LEN>)
        .collect();
    let aggregate_pubkey = copy_array::<PUBKEY_LEN>(&bytes[aggregate_start..layout.branch_offset()]);

    let branch: Vec<Root> = bytes[layout.branch_offset()..fixed_end]
        .chunks_exact(ROOT_LEN)
        .map(copy_array::<ROOT_LEN>)
        .collect();

    let header = &bytes[header_offset..];
    let slot = u64::from_le_bytes(copy_array::<8>(&header[HEADER_SLOT..HEADER_SLOT + 8]));
    let state_root = copy_array::<ROOT_LEN>(&header[HEADER_STATE_ROOT..HEADER_STATE_ROOT_END]);

    Ok(LightClientUpdate {
        attested_slot: Some(slot),
        state_root,
        next_sync_committee: SyncCommittee::new(pubkeys, aggregate_pubkey)?,
        next_sync_committee_branch: branch,
    })
}

/// Encode `update` with the leading layout above followed directly by a
/// minimal attested header. Fields this crate does not model are written as zeros.
pub fn encode_update(update: &LightClientUpdate, layout: &ForkLayout) -> Result<Vec<u8>, VerifyError> {
    let depth = layout.branch_depth();
    if update.next_sync_committee_branch.len() != depth {
        return Err(VerifyError::BranchLengthMismatch {
            expected: depth,
            actual: update.next_sync_committee_branch.len(),
        });
    }

    let fixed_end = layout.fixed_part_end();
    let mut out = Vec::with_capacity(fixed_end + ATTESTED_HEADER_LEN);
    out.extend_from_slice(&(fixed_end as u32).to_le_bytes());
    for pk in update.next_sync_committee.pubkeys() {
        out.extend_from_slice(pk);
    }
    out.extend_from_slice(update.next_sync_committee.aggregate_pubkey());
    for node in &update.next_sync_committee_branch {
        out.extend_from_slice(node);
    }

    let mut header = [0u8; ATTESTED_HEADER_LEN];
    header[HEADER_SLOT..HEADER_SLOT + 8]
        .copy_from_slice(&update.attested_slot.unwrap_or_default().to_le_bytes());
    header[HEADER_STATE_ROOT..HEADER_STATE_ROOT_END].copy_from_slice(&update.state_root);
    out.extend_from_slice(&header);

    Ok(out)
}
