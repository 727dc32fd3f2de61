//! Sparse Merkle Tree for claim trees.
//!
//! This crate provides:
//! - Content-addressed node storage behind the [`NodeStore`] trait
//! - A fixed-depth tree mapping claim index hashes to total hashes
//! - Existence and non-existence proofs with a compact binary encoding
//! - The pure verifier [`check_proof`]

#![warn(missing_docs)]

pub mod error;
pub mod node;
pub mod proof;
pub mod store;
pub mod tree;

pub use error::{Result, SmtError};
pub use node::Node;
pub use proof::{check_proof, AuxLeaf, Proof};
pub use store::{MemoryStore, NodeStore};
pub use tree::Tree;
