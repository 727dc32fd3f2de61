//! # Claimtree Core
//!
//! Claim codec, claim catalog and hashing primitives for identity claim trees.
//!
//! A claim is a byte string whose leading `index_length` bytes form its
//! index. The index hash `hi` fixes the claim's position in a sparse Merkle
//! tree; the total hash `ht` is what the tree commits to at that position.
//!
//! ## Features
//!
//! - **Codec**: [`Claim`], [`parse_kind`] and the [`ClaimEncoding`] hashes
//! - **Catalog**: generic, assign-name, authorize-ksign and set-root claims
//! - **Constants**: claim-type discriminants, layout widths, tree constants
//! - **Hashing**: keccak256 helpers shared with the tree

#![warn(missing_docs)]

pub mod catalog;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod types;

// Re-export commonly used items
pub use catalog::{AssignNameClaim, AuthorizeKSignClaim, GenericClaim, SetRootClaim};
pub use codec::{parse_kind, Claim, ClaimEncoding};
pub use constants::*;
pub use error::{CoreError, Result};
pub use hashing::{compute_middle_hash, keccak256};
pub use types::*;

// Re-export Alloy primitives for convenience
pub use alloy_primitives::{Address, B256};
