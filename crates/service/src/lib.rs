//! Claim and relay services for claim trees.
//!
//! This crate provides:
//! - [`ClaimService`]: claim submission, proof lookup and versioning over one tree
//! - [`RelayService`]: SetRoot publication and two-level chain proofs
//! - TOML configuration with environment variable expansion
//! - JSON snapshots of in-memory node stores
//!
//! Services are constructed with the tree they own and passed to whatever
//! consumes them:
//!
//! ```
//! use claimtree_core::{Address, AuthorizeKSignClaim, Claim, ClaimEncoding};
//! use claimtree_service::{verify_chain, ClaimService, RelayService};
//! use claimtree_smt::{MemoryStore, Tree};
//!
//! let mut identity = ClaimService::new(Tree::new(MemoryStore::new(), 140)?);
//! let claim: Claim = AuthorizeKSignClaim::new_operational(Address::repeat_byte(0x11)).into();
//! identity.add_claim(&claim)?;
//!
//! let identity_address = Address::repeat_byte(0x22);
//! let mut relay = RelayService::new(Tree::new(MemoryStore::new(), 140)?);
//! relay.publish_root(identity_address, identity.root())?;
//!
//! let chain = relay.prove_claim(&identity, identity_address, &claim)?;
//! assert!(verify_chain(&relay.root(), &chain, &claim.hi(), &claim.ht(), 140, 140));
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim_service;
pub mod config;
pub mod relay;
pub mod snapshot;

pub use claim_service::{ClaimProof, ClaimService};
pub use config::Config;
pub use relay::{verify_chain, ChainProof, RelayService};
