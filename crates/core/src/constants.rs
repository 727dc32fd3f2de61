//! Canonical constants for claim encoding and tree hashing.
//!
//! The claim-type discriminants and layout widths below are an
//! interoperability contract: any other implementation sharing the same
//! kind table must produce byte-identical encodings.

use alloy_primitives::{b256, hex, B256};

use crate::types::ClaimType;

// Namespace

/// Default namespace string for claims.
pub const DEFAULT_NAMESPACE: &str = "iden3.io";

/// keccak256("iden3.io")
pub const DEFAULT_NAMESPACE_HASH: B256 =
    b256!("3cfc3a1edbf691316fec9b75970fbfb2b0e8d8edfc6ec7628db77c4969403074");

// Claim-type discriminants (first 24 bytes of keccak256(label))

/// Label of the generic claim type recognised by `parse_kind`.
pub const CLAIM_LABEL_DEFAULT: &str = "default";
/// Label of the assign-name claim type.
pub const CLAIM_LABEL_ASSIGN_NAME: &str = "assignname";
/// Label of the authorize-ksign claim type.
pub const CLAIM_LABEL_AUTHORIZE_KSIGN: &str = "authorizeksign";
/// Label of the set-root claim type.
pub const CLAIM_LABEL_SET_ROOT: &str = "setroot";

/// keccak256("default")[..24]
pub const CLAIM_TYPE_DEFAULT: ClaimType =
    ClaimType::new(hex!("cfee7c08a98f4b565d124c7e4e28acc52e1bc780e3887db0"));

/// keccak256("assignname")[..24]
pub const CLAIM_TYPE_ASSIGN_NAME: ClaimType =
    ClaimType::new(hex!("b7ae3d3a2056c54f48763999f3ff99caffaaba3bab58cae9"));

/// keccak256("authorizeksign")[..24]
pub const CLAIM_TYPE_AUTHORIZE_KSIGN: ClaimType =
    ClaimType::new(hex!("353f867ef725411de05e3d4b0a01c37cf7ad24bcc213141a"));

/// keccak256("setroot")[..24]
pub const CLAIM_TYPE_SET_ROOT: ClaimType =
    ClaimType::new(hex!("9b9a76a0132a0814192c05c9321efc30c7286f6187f18fc6"));

// Layout widths (bytes)

/// Width of the namespace hash field.
pub const NAMESPACE_LEN: usize = 32;
/// Width of the claim-type field.
pub const CLAIM_TYPE_LEN: usize = 24;
/// Width of the base index header: namespace || type || index length || version.
pub const BASE_INDEX_LEN: usize = NAMESPACE_LEN + CLAIM_TYPE_LEN + 4 + 4;
/// Width of an Ethereum address field.
pub const ADDRESS_LEN: usize = 20;
/// Width of a hash field.
pub const HASH_LEN: usize = 32;
/// Width of a unix timestamp field.
pub const TIMESTAMP_LEN: usize = 8;

/// Index length of an assign-name claim (header + name hash + namespace hash).
pub const ASSIGN_NAME_INDEX_LEN: u32 = (BASE_INDEX_LEN + HASH_LEN + HASH_LEN) as u32;
/// Full length of an assign-name claim.
pub const ASSIGN_NAME_LEN: usize = ASSIGN_NAME_INDEX_LEN as usize + ADDRESS_LEN;

/// Index length of an authorize-ksign claim (header + key address).
pub const AUTHORIZE_KSIGN_INDEX_LEN: u32 = (BASE_INDEX_LEN + ADDRESS_LEN) as u32;
/// Full length of an authorize-ksign claim.
pub const AUTHORIZE_KSIGN_LEN: usize =
    AUTHORIZE_KSIGN_INDEX_LEN as usize + HASH_LEN + HASH_LEN + TIMESTAMP_LEN + TIMESTAMP_LEN;

/// Index length of a set-root claim (header + identity address).
pub const SET_ROOT_INDEX_LEN: u32 = (BASE_INDEX_LEN + ADDRESS_LEN) as u32;
/// Full length of a set-root claim.
pub const SET_ROOT_LEN: usize = SET_ROOT_INDEX_LEN as usize + HASH_LEN;

/// `validUntil` sentinel of an operational key: valid until explicitly revoked.
pub const VALID_UNTIL_UNBOUNDED: u64 = u64::MAX;

// Sparse Merkle Tree constants

/// Protocol-wide default tree depth.
pub const DEFAULT_TREE_LEVELS: usize = 140;

/// Largest supported depth (one branching level per bit of a 256-bit index plus the leaf level).
pub const MAX_TREE_LEVELS: usize = 257;

/// Reserved value of an empty subtree.
pub const EMPTY_NODE_VALUE: B256 = B256::ZERO;

/// Store tag of a middle node: `0x00 || left || right`.
pub const MIDDLE_NODE_TAG: u8 = 0x00;

/// Store tag of a leaf node: `0x01 || hi || ht`.
pub const LEAF_NODE_TAG: u8 = 0x01;

/// Store key holding the current root.
/// keccak256("root")
pub const ROOT_KEY: B256 =
    b256!("d6c66cad06fe14fdb6ce9297d80d32f24d7428996d0045cbf90cc345c677ba16");

/// Prefix hashed with `Ht` to derive the store key of a claim's bytes.
pub const CLAIM_KEY_PREFIX: &[u8] = b"claim:";
