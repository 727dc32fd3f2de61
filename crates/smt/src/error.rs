//! Error types for the SMT crate.

use alloy_primitives::B256;
use claimtree_core::CoreError;
use thiserror::Error;

/// SMT error type.
#[derive(Error, Debug)]
pub enum SmtError {
    /// A leaf already occupies this index hash. Updates go through a new version.
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(B256),

    /// Two different index hashes share every path bit of the tree.
    #[error("Path collision for index {0}: tree too shallow to separate it")]
    PathCollision(B256),

    /// Leaf value was empty (ambiguous with non-membership).
    #[error("Invalid leaf value: empty")]
    EmptyLeafValue,

    /// Node store read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Node content does not match its hash or position.
    #[error("Corrupt node {hash}: {reason}")]
    CorruptNode {
        /// Hash the node was fetched under.
        hash: B256,
        /// What was wrong with it.
        reason: String,
    },

    /// Malformed proof encoding.
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Tree depth outside the supported range.
    #[error("Invalid tree levels: {0}")]
    InvalidLevels(usize),

    /// Claim codec failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for SmtError.
pub type Result<T> = std::result::Result<T, SmtError>;
