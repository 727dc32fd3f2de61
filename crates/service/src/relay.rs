//! Relay service: publishes identity roots as SetRoot claims and chains
//! proofs across the identity tree and the relay tree.
//!
//! A chain proof shows that a claim is in an identity's tree at some root,
//! that the identity published that root into the relay tree, and that no
//! later publication from the same identity exists at the relay root.

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use claimtree_core::{Claim, ClaimEncoding, SetRootClaim, EMPTY_NODE_VALUE};
use claimtree_smt::{check_proof, NodeStore, Proof, Tree};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::claim_service::ClaimService;

/// Two-level proof of a claim anchored in the relay tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProof {
    /// Proof of the claim against the identity root published in `set_root`
    pub claim_proof: Proof,
    /// The identity's publication of its root
    pub set_root: SetRootClaim,
    /// Proof of `set_root` against the relay root
    pub set_root_proof: Proof,
    /// Proof that the next version of `set_root` is absent from the relay root
    pub next_version_proof: Proof,
}

impl ChainProof {
    /// Identity that published the root.
    pub fn identity(&self) -> Address {
        self.set_root.eth_id
    }

    /// Identity root the claim proof is anchored to.
    pub fn identity_root(&self) -> B256 {
        self.set_root.root
    }
}

/// Service owning the relay tree.
#[derive(Debug)]
pub struct RelayService<S> {
    claims: ClaimService<S>,
}

impl<S: NodeStore> RelayService<S> {
    /// Wrap a relay tree.
    pub fn new(tree: Tree<S>) -> Self {
        Self {
            claims: ClaimService::new(tree),
        }
    }

    /// Current relay root.
    pub fn root(&self) -> B256 {
        self.claims.root()
    }

    /// The claim service over the relay tree.
    pub fn claims(&self) -> &ClaimService<S> {
        &self.claims
    }

    /// Consume the service, returning the relay tree.
    pub fn into_tree(self) -> Tree<S> {
        self.claims.into_tree()
    }

    /// Publish `root` for `identity` at the identity's next SetRoot version.
    pub fn publish_root(&mut self, identity: Address, root: B256) -> Result<SetRootClaim> {
        let claim = self
            .claims
            .add_next_version(SetRootClaim::new(identity, root).into())?;

        let Claim::SetRoot(set_root) = claim else {
            anyhow::bail!("Published claim is not a SetRoot claim");
        };

        info!(
            identity = %identity,
            root = %root,
            version = set_root.version(),
            relay_root = %self.root(),
            "Published identity root"
        );
        Ok(set_root)
    }

    /// Latest SetRoot claim published by `identity`.
    pub fn latest_root(&self, identity: Address) -> Result<Option<SetRootClaim>> {
        let probe: Claim = SetRootClaim::new(identity, B256::ZERO).into();
        let next = self.claims.next_version(&probe)?;
        if next == 0 {
            return Ok(None);
        }
        self.set_root_at(identity, next - 1)
    }

    /// SetRoot claim of `identity` at `version`.
    fn set_root_at(&self, identity: Address, version: u32) -> Result<Option<SetRootClaim>> {
        // The published root is a value field, so the position is independent of it
        let hi = Claim::from(SetRootClaim::new(identity, B256::ZERO))
            .with_version(version)
            .hi();
        match self.claims.claim_at(&hi)? {
            Some(Claim::SetRoot(claim)) => Ok(Some(claim)),
            Some(other) => anyhow::bail!("Unexpected {} claim at SetRoot position", other.kind()),
            None => Ok(None),
        }
    }

    /// Chain proof for `claim` in the identity tree served by `identity_service`.
    ///
    /// Requires the identity's current root to be its latest publication.
    pub fn prove_claim<T: NodeStore>(
        &self,
        identity_service: &ClaimService<T>,
        identity: Address,
        claim: &Claim,
    ) -> Result<ChainProof> {
        let identity_root = identity_service.root();

        let set_root = self
            .latest_root(identity)?
            .with_context(|| format!("Identity {} has not published a root", identity))?;
        if set_root.root != identity_root {
            anyhow::bail!(
                "Latest published root {} of {} differs from current root {}",
                set_root.root,
                identity,
                identity_root
            );
        }

        let claim_proof = identity_service.proof(&claim.hi())?.proof;
        let set_root_proof = self.claims.proof(&set_root.hi())?.proof;

        let next_version = set_root
            .version()
            .checked_add(1)
            .context("SetRoot version space exhausted")?;
        let next = Claim::from(set_root.clone()).with_version(next_version);
        let next_version_proof = self.claims.proof(&next.hi())?.proof;

        Ok(ChainProof {
            claim_proof,
            set_root,
            set_root_proof,
            next_version_proof,
        })
    }
}

/// Verify a chain proof for `hi` (existence with the claim's `ht`, or
/// non-existence with the empty value) against `relay_root`.
///
/// Callers decide whether [`ChainProof::identity`] is the identity they
/// expect.
pub fn verify_chain(
    relay_root: &B256,
    chain: &ChainProof,
    hi: &B256,
    ht: &B256,
    identity_levels: usize,
    relay_levels: usize,
) -> bool {
    let set_root = &chain.set_root;
    let Some(next_version) = set_root.version().checked_add(1) else {
        return false;
    };
    let next = Claim::from(set_root.clone()).with_version(next_version);

    check_proof(&set_root.root, &chain.claim_proof, hi, ht, identity_levels)
        && check_proof(
            relay_root,
            &chain.set_root_proof,
            &set_root.hi(),
            &set_root.ht(),
            relay_levels,
        )
        && check_proof(
            relay_root,
            &chain.next_version_proof,
            &next.hi(),
            &EMPTY_NODE_VALUE,
            relay_levels,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use claimtree_core::AuthorizeKSignClaim;
    use claimtree_smt::MemoryStore;

    const IDENTITY: Address = address!("d79ae0a65e7dd29db1eac700368e693de09610b8");

    fn relay() -> RelayService<MemoryStore> {
        RelayService::new(Tree::new(MemoryStore::new(), 140).unwrap())
    }

    #[test]
    fn test_publish_bumps_version() {
        let mut relay = relay();
        assert!(relay.latest_root(IDENTITY).unwrap().is_none());

        let first = relay.publish_root(IDENTITY, B256::repeat_byte(1)).unwrap();
        let second = relay.publish_root(IDENTITY, B256::repeat_byte(2)).unwrap();
        assert_eq!(first.version(), 0);
        assert_eq!(second.version(), 1);

        let latest = relay.latest_root(IDENTITY).unwrap().unwrap();
        assert_eq!(latest, second);
    }

    #[test]
    fn test_chain_proof_round_trip() {
        let mut identity = ClaimService::new(Tree::new(MemoryStore::new(), 140).unwrap());
        let claim: Claim =
            AuthorizeKSignClaim::new_operational(address!("ee602447b5a75cf4f25367f5d199b860844d10c4"))
                .into();
        identity.add_claim(&claim).unwrap();

        let mut relay = relay();
        relay.publish_root(IDENTITY, identity.root()).unwrap();

        let chain = relay.prove_claim(&identity, IDENTITY, &claim).unwrap();
        assert_eq!(chain.identity(), IDENTITY);
        assert_eq!(chain.identity_root(), identity.root());
        assert!(verify_chain(
            &relay.root(),
            &chain,
            &claim.hi(),
            &claim.ht(),
            140,
            140
        ));

        // Wrong content or wrong relay root
        assert!(!verify_chain(
            &relay.root(),
            &chain,
            &claim.hi(),
            &EMPTY_NODE_VALUE,
            140,
            140
        ));
        assert!(!verify_chain(
            &B256::repeat_byte(9),
            &chain,
            &claim.hi(),
            &claim.ht(),
            140,
            140
        ));
    }

    #[test]
    fn test_stale_publication_rejected() {
        let mut identity = ClaimService::new(Tree::new(MemoryStore::new(), 140).unwrap());
        let claim: Claim =
            AuthorizeKSignClaim::new_operational(address!("ee602447b5a75cf4f25367f5d199b860844d10c4"))
                .into();
        identity.add_claim(&claim).unwrap();

        let mut relay = relay();
        assert!(relay.prove_claim(&identity, IDENTITY, &claim).is_err());

        relay.publish_root(IDENTITY, identity.root()).unwrap();
        let chain = relay.prove_claim(&identity, IDENTITY, &claim).unwrap();

        // A later publication makes the old chain stale at the new relay root
        relay.publish_root(IDENTITY, B256::repeat_byte(7)).unwrap();
        assert!(!verify_chain(
            &relay.root(),
            &chain,
            &claim.hi(),
            &claim.ht(),
            140,
            140
        ));
        assert!(relay.prove_claim(&identity, IDENTITY, &claim).is_err());
    }
}
