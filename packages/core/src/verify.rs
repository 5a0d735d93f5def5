use crate::{
    fork::ForkLayout,
    hash::bytes_equal,
    merkle::merkle_root_from_branch,
    ssz::decode_framed_update,
    update::{calculate_next_sync_committee_root, LightClientUpdate},
    Root, VerifyError,
};

/// Summary of an update whose committee proof held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedUpdate {
    pub attested_slot: Option<u64>,
    pub period: Option<u64>,
    pub committee_root: Root,
    pub state_root: Root,
}

/// Check that `update.next_sync_committee` is committed to by `update.state_root`.
pub fn verify_update(
    update: &LightClientUpdate,
    layout: &ForkLayout,
) -> Result<VerifiedUpdate, VerifyError> {
    let committee_root = calculate_next_sync_committee_root(&update.next_sync_committee);
    let computed = merkle_root_from_branch(
        layout.next_sync_committee_gindex,
        &update.next_sync_committee_branch,
        &committee_root,
    )?;

    if !bytes_equal(&computed, &update.state_root) {
        return Err(VerifyError::StateRootMismatch {
            expected: update.state_root,
            computed,
        });
    }

    Ok(VerifiedUpdate {
        attested_slot: update.attested_slot,
        period: update.period(),
        committee_root,
        state_root: update.state_root,
    })
}

/// Decode a framed SSZ update as served by a beacon node and verify it.
pub fn verify_from_binary(
    update_bytes: &[u8],
    layout: &ForkLayout,
) -> Result<VerifiedUpdate, VerifyError> {
    let update = decode_framed_update(update_bytes, layout)?;
    verify_update(&update, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encode_update, fixtures, frame_response_chunk, hash::hash_key, ErrorKind, DENEB, ELECTRA,
    };

    fn framed(update: &LightClientUpdate) -> alloc::vec::Vec<u8> {
        frame_response_chunk(&encode_update(update, &ELECTRA).unwrap(), [0x6a, 0x95, 0xa1, 0xa9])
    }

    #[test]
    fn canonical_vector_verifies() {
        let update = fixtures::update(8192 * 1400 + 64, &ELECTRA);
        let verified = verify_from_binary(&framed(&update), &ELECTRA).unwrap();

        assert_eq!(verified.period, Some(1400));
        assert_eq!(verified.state_root, update.state_root);
        assert_eq!(
            verified.committee_root,
            calculate_next_sync_committee_root(&update.next_sync_committee)
        );
    }

    #[test]
    fn zero_committee_under_zero_siblings_verifies() {
        // gindex 87 walks right, right, right, left, right, left.
        let state_root: Root =
            hex::decode("67055dadd2e4e630836ae652ce18dacadd385665e6732043de5398e57f5db90b")
                .unwrap()
                .try_into()
                .unwrap();
        let update = LightClientUpdate {
            attested_slot: Some(8192 * 1400 + 64),
            state_root,
            next_sync_committee: crate::SyncCommittee::new(alloc::vec![[0u8; 48]; 512], [0u8; 48])
                .unwrap(),
            next_sync_committee_branch: alloc::vec![[0u8; 32]; 6],
        };

        let verified = verify_from_binary(&framed(&update), &ELECTRA).unwrap();
        assert_eq!(verified.period, Some(1400));
        assert_eq!(
            hex::encode(verified.committee_root),
            "173669ae8794c057def63b20372114a628abb029354a2ef50d7a1aaa9a3dab4a"
        );
    }

    #[test]
    fn one_byte_state_root_change_is_a_mismatch() {
        let mut update = fixtures::update(8192 * 1400, &ELECTRA);
        let honest = update.state_root;
        update.state_root[31] ^= 0x01;

        let err = verify_from_binary(&framed(&update), &ELECTRA).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Proof);
        assert_eq!(
            err,
            VerifyError::StateRootMismatch {
                expected: update.state_root,
                computed: honest,
            }
        );
        assert!(alloc::format!("{err}").starts_with("State root mismatch"));
    }

    #[test]
    fn tampered_member_key_is_a_mismatch() {
        let update = fixtures::update(8192 * 2, &ELECTRA);
        let mut keys = update.next_sync_committee.pubkeys().to_vec();
        keys[511][0] ^= 0x80;
        let tampered = LightClientUpdate {
            next_sync_committee: crate::SyncCommittee::new(
                keys,
                *update.next_sync_committee.aggregate_pubkey(),
            )
            .unwrap(),
            ..update
        };
        assert!(matches!(
            verify_update(&tampered, &ELECTRA),
            Err(VerifyError::StateRootMismatch { .. })
        ));
    }

    #[test]
    fn wrong_fork_layout_is_a_format_error() {
        let update = fixtures::update(8192, &DENEB);
        let err = verify_update(&update, &ELECTRA).unwrap_err();
        assert_eq!(
            err,
            VerifyError::BranchLengthMismatch {
                expected: 6,
                actual: 5
            }
        );
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn leaf_is_the_committee_root() {
        // A branch built over some other leaf must not verify.
        let update = fixtures::update(8192, &ELECTRA);
        let other_leaf = hash_key(&[1u8; 48]);
        let forged_root = merkle_root_from_branch(
            ELECTRA.next_sync_committee_gindex,
            &update.next_sync_committee_branch,
            &other_leaf,
        )
        .unwrap();
        let forged = LightClientUpdate {
            state_root: forged_root,
            ..update
        };
        assert!(verify_update(&forged, &ELECTRA).is_err());
    }

    #[test]
    fn truncated_frame_is_a_format_error() {
        let bytes = framed(&fixtures::update(8192, &ELECTRA));
        let err = verify_from_binary(&bytes[..500], &ELECTRA).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
