use crate::{merkle::gindex_depth, ROOT_LEN, PUBKEY_LEN, SYNC_COMMITTEE_SIZE};

/// Fork-specific location of `next_sync_committee` inside the beacon state.
///
/// The branch depth and the SSZ fixed-part size both derive from the
/// generalized index, so a fork change only ever touches this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkLayout {
    pub name: &'static str,
    pub next_sync_committee_gindex: u64,
}

/// Electra and later: 64-leaf beacon state, field 23.
pub const ELECTRA: ForkLayout = ForkLayout {
    name: "electra",
    next_sync_committee_gindex: 87,
};

/// Altair through Deneb: 32-leaf beacon state, field 23.
pub const DENEB: ForkLayout = ForkLayout {
    name: "deneb",
    next_sync_committee_gindex: 55,
};

const KNOWN: [ForkLayout; 2] = [ELECTRA, DENEB];

impl ForkLayout {
    pub fn by_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|layout| layout.name.eq_ignore_ascii_case(name))
            .copied()
    }

    pub fn branch_depth(&self) -> usize {
        // The constants above are non-zero, so depth cannot fail for them.
        gindex_depth(self.next_sync_committee_gindex).unwrap_or(0)
    }

    /// Byte offset of the branch inside an update container.
    pub const fn branch_offset(&self) -> usize {
        4 + (SYNC_COMMITTEE_SIZE + 1) * PUBKEY_LEN
    }

    /// End of the fixed-part fields this crate reads from an update container.
    pub fn fixed_part_end(&self) -> usize {
        self.branch_offset() + self.branch_depth() * ROOT_LEN
    }
}

impl Default for ForkLayout {
    fn default() -> Self {
        ELECTRA
    }
}

impl core::fmt::Display for ForkLayout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (gindex {})", self.name, self.next_sync_committee_gindex)
    }
}
