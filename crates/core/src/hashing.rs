//! Hashing utilities.
//!
//! H is keccak256 everywhere: claim index/total hashes, claim-type
//! discriminants and tree nodes all go through [`keccak256`].

use alloy_primitives::{keccak256 as alloy_keccak256, B256};

use crate::constants::{CLAIM_KEY_PREFIX, CLAIM_TYPE_LEN, EMPTY_NODE_VALUE};
use crate::types::ClaimType;

/// Compute keccak256 hash of input data.
///
/// # Example
///
/// ```
/// use claimtree_core::hashing::keccak256;
///
/// let hash = keccak256(b"iden3.io");
/// assert_eq!(hash, claimtree_core::DEFAULT_NAMESPACE_HASH);
/// ```
pub fn keccak256(data: &[u8]) -> B256 {
    alloy_keccak256(data)
}

/// Derive the 24-byte claim-type discriminant of a type label.
pub fn claim_type_from_label(label: &str) -> ClaimType {
    let hash = keccak256(label.as_bytes());
    ClaimType::from_slice(&hash[..CLAIM_TYPE_LEN])
}

/// Compute the hash of a middle tree node.
///
/// The hash is `keccak256(left || right)`, except that two empty children
/// collapse to the empty value so that unpopulated subtrees of any height
/// hash to zero.
///
/// Note: This is positional (no lexicographic sorting).
pub fn compute_middle_hash(left: &B256, right: &B256) -> B256 {
    if *left == EMPTY_NODE_VALUE && *right == EMPTY_NODE_VALUE {
        return EMPTY_NODE_VALUE;
    }

    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(left.as_slice());
    data.extend_from_slice(right.as_slice());

    keccak256(&data)
}

/// Store key under which the full bytes of a claim with total hash `ht` live.
pub fn compute_claim_key(ht: &B256) -> B256 {
    let mut data = Vec::with_capacity(CLAIM_KEY_PREFIX.len() + 32);
    data.extend_from_slice(CLAIM_KEY_PREFIX);
    data.extend_from_slice(ht.as_slice());

    keccak256(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{b256, hex};

    #[test]
    fn test_keccak256() {
        // Keccak256, not SHA3-256
        let expected = B256::from(hex!(
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        ));
        assert_eq!(keccak256(b""), expected);
    }

    #[test]
    fn test_claim_type_is_hash_prefix() {
        let full = keccak256(b"setroot");
        let ty = claim_type_from_label("setroot");
        assert_eq!(ty.as_slice(), &full[..24]);
    }

    #[test]
    fn test_middle_hash_empty_children() {
        assert_eq!(
            compute_middle_hash(&EMPTY_NODE_VALUE, &EMPTY_NODE_VALUE),
            EMPTY_NODE_VALUE
        );
    }

    #[test]
    fn test_middle_hash_is_positional() {
        let a = b256!("1111111111111111111111111111111111111111111111111111111111111111");
        let b = b256!("2222222222222222222222222222222222222222222222222222222222222222");

        assert_ne!(compute_middle_hash(&a, &b), compute_middle_hash(&b, &a));
        assert_eq!(
            compute_middle_hash(&a, &b),
            keccak256(&[a.as_slice(), b.as_slice()].concat())
        );
    }

    #[test]
    fn test_middle_hash_with_one_empty_child() {
        let a = b256!("1111111111111111111111111111111111111111111111111111111111111111");
        let h = compute_middle_hash(&a, &EMPTY_NODE_VALUE);
        assert_ne!(h, EMPTY_NODE_VALUE);
        assert_eq!(h, keccak256(&[a.as_slice(), &[0u8; 32]].concat()));
    }

    #[test]
    fn test_claim_key_is_domain_separated() {
        let ht = b256!("0fce11cbd33e15d137a3a1953cda71aa81898ee8b917c21615073b59cd4dca8c");
        assert_ne!(compute_claim_key(&ht), ht);
        assert_ne!(compute_claim_key(&ht), keccak256(ht.as_slice()));
    }
}
