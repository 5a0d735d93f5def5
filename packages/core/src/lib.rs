#![no_std]

extern crate alloc;

use alloc::string::String;

mod fork;
mod hash;
mod merkle;
mod ssz;
mod update;
mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use fork::{ForkLayout, DENEB, ELECTRA};
pub use hash::{bytes_equal, hash, hash_key, merkle_reduce, ZERO_HASH};
pub use merkle::{gindex_depth, merkle_root_from_branch};
pub use ssz::{
    decode_framed_update, decode_update, encode_update, frame_response_chunk,
    unwrap_response_chunk, ATTESTED_HEADER_LEN, FRAME_HEADER_LEN,
};
pub use update::{
    calculate_next_sync_committee_root, AttestedHeaderJson, BeaconHeaderJson, LightClientUpdate,
    LightClientUpdateJson, SyncCommittee, SyncCommitteeJson,
};
pub use verify::{verify_from_binary, verify_update, VerifiedUpdate};

pub type Root = [u8; 32];
pub type Pubkey = [u8; PUBKEY_LEN];

pub const ROOT_LEN: usize = 32;
pub const PUBKEY_LEN: usize = 48;
pub const SYNC_COMMITTEE_SIZE: usize = 512;
pub const SLOTS_PER_EPOCH: u64 = 32;
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;
pub const SLOTS_PER_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Sync committee period containing `slot`.
pub const fn period_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_PERIOD
}

/// Broad class of a [`VerifyError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload does not match the expected layout (size, offset, length, encoding).
    Format,
    /// The payload decoded cleanly but its proof does not hold.
    Proof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyError {
    BufferTooShort {
        context: &'static str,
        needed: usize,
        actual: usize,
    },
    OffsetOutOfBounds {
        offset: usize,
        len: usize,
    },
    OffsetOverlapsFixedPart {
        offset: usize,
        fixed_end: usize,
    },
    InvalidGeneralizedIndex(u64),
    BranchLengthMismatch {
        expected: usize,
        actual: usize,
    },
    CommitteeSizeMismatch {
        expected: usize,
        actual: usize,
    },
    InvalidHex {
        field: String,
    },
    InvalidFieldLength {
        field: String,
        expected: usize,
        actual: usize,
    },
    InvalidSlot(String),
    StateRootMismatch {
        expected: Root,
        computed: Root,
    },
}

impl VerifyError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StateRootMismatch { .. } => ErrorKind::Proof,
            _ => ErrorKind::Format,
        }
    }
}

impl core::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooShort {
                context,
                needed,
                actual,
            } => write!(
                f,
                "{context}: buffer too short, need at least {needed} bytes, got {actual}"
            ),
            Self::OffsetOutOfBounds { offset, len } => write!(
                f,
                "attested header offset {offset} points past the end of a {len}-byte buffer"
            ),
            Self::OffsetOverlapsFixedPart { offset, fixed_end } => write!(
                f,
                "attested header offset {offset} overlaps the fixed part ending at {fixed_end}"
            ),
            Self::InvalidGeneralizedIndex(gindex) => {
                write!(f, "invalid generalized index {gindex}")
            }
            Self::BranchLengthMismatch { expected, actual } => write!(
                f,
                "merkle branch length mismatch: expected {expected}, got {actual}"
            ),
            Self::CommitteeSizeMismatch { expected, actual } => write!(
                f,
                "sync committee size mismatch: expected {expected} pubkeys, got {actual}"
            ),
            Self::InvalidHex { field } => write!(f, "{field}: invalid hex string"),
            Self::InvalidFieldLength {
                field,
                expected,
                actual,
            } => write!(f, "{field}: expected {expected} bytes, got {actual}"),
            Self::InvalidSlot(raw) => write!(f, "invalid slot value {raw:?}"),
            Self::StateRootMismatch { expected, computed } => write!(
                f,
                "State root mismatch: header claims 0x{}, branch yields 0x{}",
                hex::encode(expected),
                hex::encode(computed)
            ),
        }
    }
}

impl core::error::Error for VerifyError {}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
