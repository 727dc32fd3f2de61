use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::Args;
use claimtree_core::EMPTY_NODE_VALUE;
use claimtree_service::config::Config;
use claimtree_smt::{check_proof, Proof};

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Root the proof is checked against
    #[arg(long)]
    pub root: B256,

    /// Hex-encoded proof
    #[arg(long)]
    pub proof: String,

    /// Index hash of the claim
    #[arg(long)]
    pub hi: B256,

    /// Total hash of the claim; omit to check non-existence
    #[arg(long)]
    pub ht: Option<B256>,

    /// Tree levels (defaults to the configured identity tree levels)
    #[arg(long)]
    pub levels: Option<usize>,
}

pub fn run(args: VerifyArgs, config: &Config) -> Result<()> {
    let proof = Proof::from_hex(&args.proof).context("Failed to decode proof")?;
    let ht = args.ht.unwrap_or(EMPTY_NODE_VALUE);
    let levels = args.levels.unwrap_or(config.tree.levels);

    if !check_proof(&args.root, &proof, &args.hi, &ht, levels) {
        anyhow::bail!("Proof does not verify against root {}", args.root);
    }

    if ht == EMPTY_NODE_VALUE {
        println!("OK: {} is absent", args.hi);
    } else {
        println!("OK: {} holds {}", args.hi, ht);
    }
    Ok(())
}
