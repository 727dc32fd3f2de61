//! Claim service: admin submission, proof lookup and versioning over one tree.

use alloy_primitives::B256;
use anyhow::{Context, Result};
use claimtree_core::{Claim, ClaimEncoding, GenericClaim, EMPTY_NODE_VALUE};
use claimtree_smt::{check_proof, NodeStore, Proof, Tree};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A proof bundled with the root it was generated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProof {
    /// Root the proof verifies against
    pub root: B256,
    /// Encoded proof
    pub proof: Proof,
}

impl ClaimProof {
    /// Check existence (`ht` = claim total hash) or non-existence
    /// (`ht` = empty value) of `hi` against the bundled root.
    pub fn verify(&self, hi: &B256, ht: &B256, levels: usize) -> bool {
        check_proof(&self.root, &self.proof, hi, ht, levels)
    }
}

/// Service owning one claim tree.
///
/// Constructed with the tree it serves; nothing is shared implicitly.
#[derive(Debug)]
pub struct ClaimService<S> {
    tree: Tree<S>,
}

impl<S: NodeStore> ClaimService<S> {
    /// Wrap a tree.
    pub fn new(tree: Tree<S>) -> Self {
        Self { tree }
    }

    /// Current root.
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    /// Number of levels of the tree.
    pub fn levels(&self) -> usize {
        self.tree.levels()
    }

    /// Borrow the underlying tree.
    pub fn tree(&self) -> &Tree<S> {
        &self.tree
    }

    /// Consume the service, returning its tree.
    pub fn into_tree(self) -> Tree<S> {
        self.tree
    }

    /// Add a claim. Returns the new root.
    pub fn add_claim(&mut self, claim: &Claim) -> Result<B256> {
        let hi = claim.hi();
        let root = self
            .tree
            .add(claim)
            .with_context(|| format!("Failed to add {} claim {}", claim.kind(), hi))?;

        info!(
            kind = %claim.kind(),
            version = claim.version(),
            hi = %hi,
            root = %root,
            "Claim added"
        );
        Ok(root)
    }

    /// Decode and add an encoded claim. Returns the decoded claim.
    pub fn add_claim_bytes(&mut self, bytes: &[u8]) -> Result<Claim> {
        let claim = Claim::parse(bytes).context("Failed to decode submitted claim")?;
        self.add_claim(&claim)?;
        Ok(claim)
    }

    /// Compact proof for `hi` against the current root.
    pub fn proof(&self, hi: &B256) -> Result<ClaimProof> {
        let proof = self
            .tree
            .generate_proof(hi)
            .with_context(|| format!("Failed to generate proof for {}", hi))?;
        Ok(ClaimProof {
            root: self.tree.root(),
            proof,
        })
    }

    /// Proof for `hi` reporting a divergent leaf as an auxiliary leaf.
    pub fn proof_with_aux(&self, hi: &B256) -> Result<ClaimProof> {
        let proof = self
            .tree
            .generate_proof_with_aux(hi)
            .with_context(|| format!("Failed to generate proof for {}", hi))?;
        Ok(ClaimProof {
            root: self.tree.root(),
            proof,
        })
    }

    /// The claim occupying `hi`, if any.
    ///
    /// Returns `None` for absent positions and for leaves added without
    /// their claim bytes.
    pub fn claim_at(&self, hi: &B256) -> Result<Option<Claim>> {
        let ht = self.tree.value_in_pos(hi)?;
        if ht == EMPTY_NODE_VALUE {
            return Ok(None);
        }

        let Some(bytes) = self.tree.claim_bytes(&ht)? else {
            return Ok(None);
        };

        // Generic claims may carry any type label
        let claim = Claim::parse(&bytes)
            .or_else(|_| GenericClaim::from_bytes(&bytes).map(Claim::Generic))
            .with_context(|| format!("Stored claim at {} is undecodable", hi))?;
        Ok(Some(claim))
    }

    /// First version of `claim` whose index hash is not in the tree.
    pub fn next_version(&self, claim: &Claim) -> Result<u32> {
        let mut candidate = claim.clone().with_version(0);
        loop {
            if self.tree.value_in_pos(&candidate.hi())? == EMPTY_NODE_VALUE {
                return Ok(candidate.version());
            }
            let next = candidate
                .version()
                .checked_add(1)
                .context("Claim version space exhausted")?;
            candidate.set_version(next);
        }
    }

    /// Add `claim` at its next free version. Returns the claim as inserted.
    pub fn add_next_version(&mut self, claim: Claim) -> Result<Claim> {
        let version = self.next_version(&claim)?;
        let claim = claim.with_version(version);
        self.add_claim(&claim)?;
        Ok(claim)
    }
}
