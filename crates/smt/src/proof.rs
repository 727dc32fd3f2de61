//! Proof encoding and verification for the Sparse Merkle Tree.
//!
//! Wire layout:
//!
//! ```text
//! flags (1) || bitmap (32) || siblings (32 each, deepest first) || [aux hi || aux ht]
//! ```
//!
//! Bit `d` of the bitmap (byte `31 - d/8`, mask `1 << (d % 8)`) marks a
//! non-empty sibling at depth `d`. Flag `0x01` marks a trailing auxiliary
//! leaf. Empty siblings are never encoded.

use alloy_primitives::{hex, B256};
use claimtree_core::constants::{EMPTY_NODE_VALUE, MAX_TREE_LEVELS};
use claimtree_core::hashing::compute_middle_hash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SmtError};
use crate::node::{first_divergence, leaf_hash_at, path_bit};

/// Flag bit: an auxiliary leaf follows the siblings.
pub const FLAG_AUX: u8 = 0x01;

const HEADER_LEN: usize = 1 + BITMAP_LEN;
const BITMAP_LEN: usize = 32;
const MAX_DEPTHS: usize = BITMAP_LEN * 8;

/// Leaf found where a non-existence query path diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxLeaf {
    /// Index hash of the divergent leaf
    pub hi: B256,
    /// Total hash of the divergent leaf
    pub ht: B256,
}

/// A Sparse Merkle Tree proof for one index hash.
///
/// Whether it proves existence or non-existence is decided by the caller of
/// [`check_proof`]: pass the claim's `ht` for existence or the empty value
/// for non-existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    /// Sibling hash per depth, root first. Trailing empty siblings are trimmed.
    siblings: Vec<B256>,
    aux: Option<AuxLeaf>,
}

impl Proof {
    pub(crate) fn new(mut siblings: Vec<B256>, aux: Option<AuxLeaf>) -> Self {
        while siblings.last() == Some(&EMPTY_NODE_VALUE) {
            siblings.pop();
        }
        Self { siblings, aux }
    }

    /// Siblings indexed by depth (depth 0 = child of the root), empty ones
    /// included up to the deepest non-empty one.
    pub fn siblings(&self) -> &[B256] {
        &self.siblings
    }

    /// Sibling at `depth`; empty beyond the stored ones.
    pub fn sibling(&self, depth: usize) -> B256 {
        self.siblings
            .get(depth)
            .copied()
            .unwrap_or(EMPTY_NODE_VALUE)
    }

    /// Auxiliary leaf, if the query path ended at a different leaf.
    pub fn aux(&self) -> Option<&AuxLeaf> {
        self.aux.as_ref()
    }

    /// Number of non-empty siblings.
    pub fn non_empty_siblings(&self) -> usize {
        self.siblings
            .iter()
            .filter(|s| **s != EMPTY_NODE_VALUE)
            .count()
    }

    /// Presence bitmap of the non-empty siblings.
    pub fn bitmap(&self) -> [u8; BITMAP_LEN] {
        let mut bitmap = [0u8; BITMAP_LEN];
        for (depth, sibling) in self.siblings.iter().enumerate() {
            if *sibling != EMPTY_NODE_VALUE {
                bitmap[BITMAP_LEN - 1 - depth / 8] |= 1 << (depth % 8);
            }
        }
        bitmap
    }

    /// Encode to the wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let aux_len = if self.aux.is_some() { 64 } else { 0 };
        let mut out = Vec::with_capacity(HEADER_LEN + 32 * self.non_empty_siblings() + aux_len);

        out.push(if self.aux.is_some() { FLAG_AUX } else { 0 });
        out.extend_from_slice(&self.bitmap());
        for sibling in self.siblings.iter().rev() {
            if *sibling != EMPTY_NODE_VALUE {
                out.extend_from_slice(sibling.as_slice());
            }
        }
        if let Some(aux) = &self.aux {
            out.extend_from_slice(aux.hi.as_slice());
            out.extend_from_slice(aux.ht.as_slice());
        }
        out
    }

    /// Strict decoder for the wire layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SmtError::InvalidProof(format!(
                "proof shorter than header: {} < {}",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let flags = bytes[0];
        if flags & !FLAG_AUX != 0 {
            return Err(SmtError::InvalidProof(format!(
                "unknown flags 0x{:02x}",
                flags
            )));
        }

        let bitmap = &bytes[1..HEADER_LEN];
        let depths: Vec<usize> = (0..MAX_DEPTHS)
            .filter(|d| (bitmap[BITMAP_LEN - 1 - d / 8] >> (d % 8)) & 1 == 1)
            .collect();

        let has_aux = flags & FLAG_AUX != 0;
        let expected = HEADER_LEN + 32 * depths.len() + if has_aux { 64 } else { 0 };
        if bytes.len() != expected {
            return Err(SmtError::InvalidProof(format!(
                "expected {} bytes for {} siblings, got {}",
                expected,
                depths.len(),
                bytes.len()
            )));
        }

        let mut siblings = vec![EMPTY_NODE_VALUE; depths.last().map_or(0, |d| d + 1)];
        let mut chunks = bytes[HEADER_LEN..].chunks_exact(32).map(B256::from_slice);

        for &depth in depths.iter().rev() {
            let sibling = chunks
                .next()
                .ok_or_else(|| SmtError::InvalidProof("missing sibling".into()))?;
            if sibling == EMPTY_NODE_VALUE {
                return Err(SmtError::InvalidProof(format!(
                    "empty sibling marked present at depth {}",
                    depth
                )));
            }
            siblings[depth] = sibling;
        }

        let aux = if has_aux {
            match (chunks.next(), chunks.next()) {
                (Some(hi), Some(ht)) => Some(AuxLeaf { hi, ht }),
                _ => return Err(SmtError::InvalidProof("missing aux leaf".into())),
            }
        } else {
            None
        };

        Ok(Self { siblings, aux })
    }

    /// Hex encoding with `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(self.to_bytes())
    }

    /// Decode from hex (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s.trim()).map_err(|e| SmtError::InvalidProof(format!("bad hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Proof {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Proof::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Verify `proof` for index `hi` against `root`.
///
/// Pass the claim's total hash as `ht` to check existence, or the empty
/// value to check non-existence. Pure: needs no store access. Any malformed
/// or mismatching input yields `false`.
///
/// With an auxiliary leaf (non-existence only), the leaf must differ from
/// `hi` and is placed as the sibling at the first depth where their paths
/// split; the proof may carry no siblings at or below that depth.
pub fn check_proof(root: &B256, proof: &Proof, hi: &B256, ht: &B256, levels: usize) -> bool {
    if !(2..=MAX_TREE_LEVELS).contains(&levels) {
        return false;
    }

    let branching = levels - 1;
    if proof.siblings.len() > branching {
        return false;
    }

    let mut siblings = proof.siblings.clone();

    if let Some(aux) = &proof.aux {
        if *ht != EMPTY_NODE_VALUE || aux.hi == *hi {
            return false;
        }
        let Some(split) = first_divergence(hi, &aux.hi, 0, levels) else {
            return false;
        };
        if siblings.len() > split {
            return false;
        }
        siblings.resize(split + 1, EMPTY_NODE_VALUE);
        siblings[split] = leaf_hash_at(levels, split + 1, &aux.hi, &aux.ht);
    }

    let mut node = *ht;
    for depth in (0..branching).rev() {
        let sibling = siblings.get(depth).copied().unwrap_or(EMPTY_NODE_VALUE);
        node = if path_bit(hi, depth) {
            compute_middle_hash(&sibling, &node)
        } else {
            compute_middle_hash(&node, &sibling)
        };
    }

    node == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    const SIB: B256 = b256!("03aab4f597fe23598cc10f1af68192195a7538d3d6fc83cf49e5cfd53eaac527");

    #[test]
    fn test_empty_proof_is_33_zero_bytes() {
        let proof = Proof::new(vec![], None);
        assert_eq!(proof.to_bytes(), vec![0u8; 33]);
        assert_eq!(Proof::from_bytes(&[0u8; 33]).unwrap(), proof);
    }

    #[test]
    fn test_trailing_empty_siblings_trimmed() {
        let proof = Proof::new(vec![SIB, EMPTY_NODE_VALUE, EMPTY_NODE_VALUE], None);
        assert_eq!(proof.siblings(), &[SIB]);
        assert_eq!(proof.sibling(5), EMPTY_NODE_VALUE);
    }

    #[test]
    fn test_bitmap_layout() {
        let proof = Proof::new(vec![SIB], None);
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[32], 0x01);
        assert_eq!(&bytes[33..], SIB.as_slice());

        // Depth 9 lives in the second-to-last bitmap byte
        let mut siblings = vec![EMPTY_NODE_VALUE; 10];
        siblings[9] = SIB;
        let bitmap = Proof::new(siblings, None).bitmap();
        assert_eq!(bitmap[30], 0b10);
        assert_eq!(bitmap[31], 0);
    }

    #[test]
    fn test_siblings_encoded_deepest_first() {
        let deep = b256!("1111111111111111111111111111111111111111111111111111111111111111");
        let proof = Proof::new(vec![SIB, EMPTY_NODE_VALUE, deep], None);
        let bytes = proof.to_bytes();
        assert_eq!(&bytes[33..65], deep.as_slice());
        assert_eq!(&bytes[65..97], SIB.as_slice());
        assert_eq!(Proof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_aux_encoding() {
        let aux = AuxLeaf {
            hi: b256!("1111111111111111111111111111111111111111111111111111111111111111"),
            ht: b256!("2222222222222222222222222222222222222222222222222222222222222222"),
        };
        let proof = Proof::new(vec![SIB], Some(aux));
        let bytes = proof.to_bytes();
        assert_eq!(bytes[0], FLAG_AUX);
        assert_eq!(bytes.len(), 33 + 32 + 64);
        assert_eq!(Proof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_decode_is_strict() {
        // Too short
        assert!(Proof::from_bytes(&[0u8; 32]).is_err());

        // Unknown flag
        let mut bytes = vec![0u8; 33];
        bytes[0] = 0x02;
        assert!(Proof::from_bytes(&bytes).is_err());

        // Bitmap says one sibling, none present
        let mut bytes = vec![0u8; 33];
        bytes[32] = 0x01;
        assert!(Proof::from_bytes(&bytes).is_err());

        // Trailing bytes
        let mut bytes = Proof::new(vec![SIB], None).to_bytes();
        bytes.push(0);
        assert!(Proof::from_bytes(&bytes).is_err());

        // Aux flag without aux payload
        let mut bytes = vec![0u8; 33];
        bytes[0] = FLAG_AUX;
        assert!(Proof::from_bytes(&bytes).is_err());

        // Empty sibling marked present
        let mut bytes = vec![0u8; 65];
        bytes[32] = 0x01;
        assert!(Proof::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_serde_as_hex() {
        let proof = Proof::new(vec![SIB], None);
        let json = serde_json::to_string(&proof).unwrap();
        assert_eq!(json, format!("\"{}\"", proof.to_hex()));
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn test_check_rejects_bad_levels() {
        let proof = Proof::new(vec![], None);
        let hi = B256::ZERO;
        assert!(!check_proof(&B256::ZERO, &proof, &hi, &EMPTY_NODE_VALUE, 1));
        assert!(!check_proof(&B256::ZERO, &proof, &hi, &EMPTY_NODE_VALUE, 258));
        // Empty tree, empty proof
        assert!(check_proof(&B256::ZERO, &proof, &hi, &EMPTY_NODE_VALUE, 140));
    }

    #[test]
    fn test_check_rejects_siblings_beyond_levels() {
        let proof = Proof::new(vec![EMPTY_NODE_VALUE, EMPTY_NODE_VALUE, SIB], None);
        assert!(!check_proof(&B256::ZERO, &proof, &B256::ZERO, &EMPTY_NODE_VALUE, 3));
    }

    #[test]
    fn test_check_rejects_aux_on_existence() {
        let aux = AuxLeaf {
            hi: b256!("1111111111111111111111111111111111111111111111111111111111111111"),
            ht: SIB,
        };
        let proof = Proof::new(vec![], Some(aux));
        assert!(!check_proof(&B256::ZERO, &proof, &B256::ZERO, &SIB, 140));
    }

    #[test]
    fn test_check_rejects_aux_equal_to_query() {
        let hi = b256!("1111111111111111111111111111111111111111111111111111111111111111");
        let aux = AuxLeaf { hi, ht: SIB };
        let root = leaf_hash_at(140, 0, &hi, &SIB);
        let proof = Proof::new(vec![], Some(aux));
        assert!(!check_proof(&root, &proof, &hi, &EMPTY_NODE_VALUE, 140));
    }
}
