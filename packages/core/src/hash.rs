use alloc::vec::Vec;
use sha2::{Digest, Sha256};

use crate::Root;

pub const ZERO_HASH: Root = [0u8; 32];

const KEY_PADDING: [u8; 16] = [0u8; 16];

/// SHA-256 over the concatenation of `parts`.
pub fn hash(parts: &[&[u8]]) -> Root {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Leaf hash of a 48-byte key: the key's two SSZ chunks, the second zero-padded.
pub fn hash_key(value: &[u8]) -> Root {
    hash(&[value, &KEY_PADDING])
}

pub fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Reduce an ordered list of roots to a single binary Merkle root.
///
/// An unmatched last node in a layer is paired with [`ZERO_HASH`]. An empty
/// input reduces to [`ZERO_HASH`].
pub fn merkle_reduce(mut layer: Vec<Root>) -> Root {
    if layer.is_empty() {
        return ZERO_HASH;
    }

    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&ZERO_HASH);
                hash(&[&pair[0], right])
            })
            .collect();
    }

    layer[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn hash_concatenates_parts() {
        assert_eq!(hash(&[b"ab", b"cd"]), hash(&[b"abcd"]));
        assert_ne!(hash(&[b"ab"]), hash(&[b"ba"]));
    }

    #[test]
    fn hash_key_pads_to_64_bytes() {
        let key = [7u8; 48];
        let mut padded = [0u8; 64];
        padded[..48].copy_from_slice(&key);
        assert_eq!(hash_key(&key), hash(&[&padded]));
    }

    #[test]
    fn bytes_equal_checks_length_first() {
        assert!(bytes_equal(b"abc", b"abc"));
        assert!(!bytes_equal(b"abc", b"abcd"));
        assert!(!bytes_equal(b"", b"a"));
        assert!(bytes_equal(b"", b""));
    }

    #[test]
    fn reduce_pairs_in_order() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        let d = [4u8; 32];

        let left = hash(&[&a, &b]);
        let right = hash(&[&c, &d]);
        assert_eq!(merkle_reduce(vec![a, b, c, d]), hash(&[&left, &right]));
    }

    #[test]
    fn reduce_pads_odd_layers_with_zero() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];

        let left = hash(&[&a, &b]);
        let right = hash(&[&c, &ZERO_HASH]);
        assert_eq!(merkle_reduce(vec![a, b, c]), hash(&[&left, &right]));
    }

    #[test]
    fn reduce_edge_cases() {
        assert_eq!(merkle_reduce(Vec::new()), ZERO_HASH);
        assert_eq!(merkle_reduce(vec![[9u8; 32]]), [9u8; 32]);
    }
}
