use alloy_primitives::B256;
use anyhow::Result;
use clap::Args;
use claimtree_core::{ClaimEncoding, EMPTY_NODE_VALUE};
use claimtree_service::config::Config;
use claimtree_smt::Proof;
use serde::Serialize;
use tracing::info;

use super::claim::{decode_claim, ClaimSummary};
use super::{open_identity, print_json, save_identity};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Hex-encoded claim
    pub claim: String,

    /// Insert at the claim's next free version instead of its encoded one
    #[arg(long)]
    pub next_version: bool,
}

#[derive(Debug, Args)]
pub struct ProveArgs {
    /// Index hash to prove
    pub hi: B256,

    /// Report a divergent leaf as an auxiliary leaf
    #[arg(long)]
    pub aux: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOutput {
    root: B256,
    claim: ClaimSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProveOutput {
    root: B256,
    hi: B256,
    /// Leaf value at `hi`, zero when absent
    ht: B256,
    exists: bool,
    proof: Proof,
}

#[derive(Debug, Serialize)]
struct RootOutput {
    root: B256,
    levels: usize,
}

pub fn run_add(args: AddArgs, config: &Config) -> Result<()> {
    let mut service = open_identity(config)?;
    let claim = decode_claim(&args.claim)?;

    let claim = if args.next_version {
        service.add_next_version(claim)?
    } else {
        service.add_claim(&claim)?;
        claim
    };

    let output = AddOutput {
        root: service.root(),
        claim: ClaimSummary::from(claim),
    };
    save_identity(config, service)?;

    print_json(&output)
}

pub fn run_prove(args: ProveArgs, config: &Config) -> Result<()> {
    let service = open_identity(config)?;

    let ht = service.tree().value_in_pos(&args.hi)?;
    let claim_proof = if args.aux {
        service.proof_with_aux(&args.hi)?
    } else {
        service.proof(&args.hi)?
    };
    info!(hi = %args.hi, exists = ht != EMPTY_NODE_VALUE, "Generated proof");

    print_json(&ProveOutput {
        root: claim_proof.root,
        hi: args.hi,
        ht,
        exists: ht != EMPTY_NODE_VALUE,
        proof: claim_proof.proof,
    })
}

pub fn run_root(config: &Config) -> Result<()> {
    let service = open_identity(config)?;
    print_json(&RootOutput {
        root: service.root(),
        levels: service.levels(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use claimtree_core::{AuthorizeKSignClaim, Claim};

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.snapshot_path = Some(dir.join("identity.json"));
        config
    }

    #[test]
    fn test_add_persists_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let claim: Claim =
            AuthorizeKSignClaim::new_operational(address!("ee602447b5a75cf4f25367f5d199b860844d10c4"))
                .into();

        run_add(
            AddArgs {
                claim: claim.to_hex(),
                next_version: false,
            },
            &config,
        )
        .unwrap();

        let service = open_identity(&config).unwrap();
        assert_eq!(service.tree().value_in_pos(&claim.hi()).unwrap(), claim.ht());

        // Same claim again lands at version 1
        run_add(
            AddArgs {
                claim: claim.to_hex(),
                next_version: true,
            },
            &config,
        )
        .unwrap();
        let service = open_identity(&config).unwrap();
        let bumped = claim.with_version(1);
        assert_eq!(service.tree().value_in_pos(&bumped.hi()).unwrap(), bumped.ht());
    }

    #[test]
    fn test_duplicate_add_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let claim: Claim =
            AuthorizeKSignClaim::new_operational(address!("ee602447b5a75cf4f25367f5d199b860844d10c4"))
                .into();
        let args = || AddArgs {
            claim: claim.to_hex(),
            next_version: false,
        };

        run_add(args(), &config).unwrap();
        assert!(run_add(args(), &config).is_err());
    }
}
