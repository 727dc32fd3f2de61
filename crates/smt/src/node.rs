//! Node types for the Sparse Merkle Tree.

use alloy_primitives::B256;
use claimtree_core::constants::{EMPTY_NODE_VALUE, LEAF_NODE_TAG, MIDDLE_NODE_TAG};
use claimtree_core::hashing::compute_middle_hash;

use crate::error::{Result, SmtError};

/// A node in the Sparse Merkle Tree.
///
/// The tree uses three node types:
/// - `Empty`: Represents absence of data (hash = 0x000...000)
/// - `Leaf`: A claim position, stored compressed at the shallowest depth
///   where its subtree holds nothing else
/// - `Middle`: Two child hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// Empty subtree. Never written to the store.
    Empty,

    /// Leaf holding a claim's index and total hash.
    Leaf {
        /// Index hash: the path
        hi: B256,
        /// Total hash: the committed content
        ht: B256,
    },

    /// Middle node with two children.
    Middle {
        /// Left child hash (path bit 0)
        left: B256,
        /// Right child hash (path bit 1)
        right: B256,
    },
}

impl Node {
    /// Hash of this node when it roots the subtree at `depth` of a tree with
    /// `levels` levels.
    ///
    /// Only leaves depend on the depth; see [`leaf_hash_at`].
    pub fn hash_at(&self, levels: usize, depth: usize) -> B256 {
        match self {
            Node::Empty => EMPTY_NODE_VALUE,
            Node::Leaf { hi, ht } => leaf_hash_at(levels, depth, hi, ht),
            Node::Middle { left, right } => compute_middle_hash(left, right),
        }
    }

    /// Store encoding: `0x00 || left || right` or `0x01 || hi || ht`.
    ///
    /// Empty nodes have no encoding.
    pub fn encode(&self) -> Option<Vec<u8>> {
        let (tag, a, b) = match self {
            Node::Empty => return None,
            Node::Middle { left, right } => (MIDDLE_NODE_TAG, left, right),
            Node::Leaf { hi, ht } => (LEAF_NODE_TAG, hi, ht),
        };

        let mut out = Vec::with_capacity(65);
        out.push(tag);
        out.extend_from_slice(a.as_slice());
        out.extend_from_slice(b.as_slice());
        Some(out)
    }

    /// Decode a node fetched from the store under `hash`.
    pub fn decode(hash: B256, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(SmtError::CorruptNode {
                hash,
                reason: format!("expected 65 bytes, got {}", bytes.len()),
            });
        }

        let a = B256::from_slice(&bytes[1..33]);
        let b = B256::from_slice(&bytes[33..65]);

        match bytes[0] {
            MIDDLE_NODE_TAG => Ok(Node::Middle { left: a, right: b }),
            LEAF_NODE_TAG => Ok(Node::Leaf { hi: a, ht: b }),
            tag => Err(SmtError::CorruptNode {
                hash,
                reason: format!("unknown node tag 0x{:02x}", tag),
            }),
        }
    }
}

/// Path bit of `hi` at `depth` (depth 0 = root split).
///
/// Bits are consumed least-significant first over the big-endian bytes, so
/// depth 0 is the lowest bit of the last byte. `true` means right.
pub fn path_bit(hi: &B256, depth: usize) -> bool {
    (hi[31 - depth / 8] >> (depth % 8)) & 1 == 1
}

/// First branching depth in `from..levels-1` where `a` and `b` take
/// different directions.
pub fn first_divergence(a: &B256, b: &B256, from: usize, levels: usize) -> Option<usize> {
    (from..levels.saturating_sub(1)).find(|&depth| path_bit(a, depth) != path_bit(b, depth))
}

/// Hash of a leaf compressed into the subtree rooted at `depth`.
///
/// Folds `ht` from the bottom branching depth up to `depth` with empty
/// siblings, which makes the compressed tree hash identically to the
/// full-depth tree. At `depth == levels - 1` this is `ht` itself.
pub fn leaf_hash_at(levels: usize, depth: usize, hi: &B256, ht: &B256) -> B256 {
    let mut hash = *ht;
    for d in (depth..levels.saturating_sub(1)).rev() {
        hash = if path_bit(hi, d) {
            compute_middle_hash(&EMPTY_NODE_VALUE, &hash)
        } else {
            compute_middle_hash(&hash, &EMPTY_NODE_VALUE)
        };
    }
    hash
}
