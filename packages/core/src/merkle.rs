use crate::{hash::hash, Root, VerifyError};

/// Depth of the node at `gindex`, i.e. the number of siblings on its path to the root.
pub fn gindex_depth(gindex: u64) -> Result<usize, VerifyError> {
    if gindex == 0 {
        return Err(VerifyError::InvalidGeneralizedIndex(gindex));
    }
    Ok((u64::BITS - 1 - gindex.leading_zeros()) as usize)
}

/// Recompute the root above `leaf` from its sibling `branch`.
///
/// The bit pattern of `gindex` selects, level by level, whether the current
/// node is a left (even) or right (odd) child. `branch[0]` is the sibling of
/// the leaf itself and the walk ends at index 1.
pub fn merkle_root_from_branch(
    gindex: u64,
    branch: &[Root],
    leaf: &Root,
) -> Result<Root, VerifyError> {
    let depth = gindex_depth(gindex)?;
    if branch.len() != depth {
        return Err(VerifyError::BranchLengthMismatch {
            expected: depth,
            actual: branch.len(),
        });
    }

    let mut index = gindex;
    let mut node = *leaf;
    for sibling in branch {
        node = if index & 1 == 1 {
            hash(&[sibling, &node])
        } else {
            hash(&[&node, sibling])
        };
        index >>= 1;
    }

    debug_assert_eq!(index, 1);
    Ok(node)
}
