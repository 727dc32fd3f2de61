use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use claimtree_core::{Claim, ClaimEncoding};
use claimtree_service::{config::Config, verify_chain, ChainProof};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use super::claim::{decode_claim, ClaimSummary};
use super::{open_identity, open_relay, print_json, save_relay};

#[derive(Debug, Subcommand)]
pub enum RelayCommand {
    /// Publish an identity root into the relay tree.
    Publish(PublishArgs),
    /// Print the latest root published by an identity.
    Latest(LatestArgs),
    /// Build a chain proof for a claim of the identity tree.
    Prove(ProveChainArgs),
    /// Check a chain proof against a relay root.
    Verify(VerifyChainArgs),
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    #[arg(long)]
    pub identity: Address,

    /// Root to publish (defaults to the current identity tree root)
    #[arg(long)]
    pub root: Option<B256>,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    #[arg(long)]
    pub identity: Address,
}

#[derive(Debug, Args)]
pub struct ProveChainArgs {
    #[arg(long)]
    pub identity: Address,

    /// Hex-encoded claim
    pub claim: String,
}

#[derive(Debug, Args)]
pub struct VerifyChainArgs {
    /// Relay root the chain is checked against
    #[arg(long)]
    pub relay_root: B256,

    /// Path to the JSON printed by `relay prove`
    #[arg(long)]
    pub chain: PathBuf,

    /// Hex-encoded claim
    pub claim: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishOutput {
    relay_root: B256,
    set_root: ClaimSummary,
}

/// Document printed by `relay prove` and read back by `relay verify`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainOutput {
    relay_root: B256,
    chain: ChainProof,
}

pub fn run(command: RelayCommand, config: &Config) -> Result<()> {
    match command {
        RelayCommand::Publish(args) => publish(args, config),
        RelayCommand::Latest(args) => latest(args, config),
        RelayCommand::Prove(args) => prove(args, config),
        RelayCommand::Verify(args) => verify(args, config),
    }
}

fn publish(args: PublishArgs, config: &Config) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => open_identity(config)?.root(),
    };

    let mut relay = open_relay(config)?;
    let set_root = relay.publish_root(args.identity, root)?;
    let output = PublishOutput {
        relay_root: relay.root(),
        set_root: ClaimSummary::from(Claim::from(set_root)),
    };
    save_relay(config, relay)?;

    print_json(&output)
}

fn latest(args: LatestArgs, config: &Config) -> Result<()> {
    let relay = open_relay(config)?;
    let set_root = relay
        .latest_root(args.identity)?
        .with_context(|| format!("Identity {} has not published a root", args.identity))?;
    print_json(&ClaimSummary::from(Claim::from(set_root)))
}

fn prove(args: ProveChainArgs, config: &Config) -> Result<()> {
    print_json(&chain_output(args, config)?)
}

fn chain_output(args: ProveChainArgs, config: &Config) -> Result<ChainOutput> {
    let identity = open_identity(config)?;
    let relay = open_relay(config)?;
    let claim = decode_claim(&args.claim)?;

    let chain = relay.prove_claim(&identity, args.identity, &claim)?;
    Ok(ChainOutput {
        relay_root: relay.root(),
        chain,
    })
}

fn verify(args: VerifyChainArgs, config: &Config) -> Result<()> {
    let json = std::fs::read_to_string(&args.chain)
        .with_context(|| format!("Failed to read chain proof: {}", args.chain.display()))?;
    let output: ChainOutput = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse chain proof: {}", args.chain.display()))?;
    let claim = decode_claim(&args.claim)?;

    // Only the relay root given on the command line is trusted
    if output.relay_root != args.relay_root {
        warn!(
            file_root = %output.relay_root,
            relay_root = %args.relay_root,
            "Chain proof was generated against a different relay root"
        );
    }
    let chain = output.chain;

    if !verify_chain(
        &args.relay_root,
        &chain,
        &claim.hi(),
        &claim.ht(),
        config.tree.levels,
        config.relay.levels,
    ) {
        anyhow::bail!("Chain proof does not verify against relay root {}", args.relay_root);
    }

    println!(
        "OK: claim {} in root {} published by {}",
        claim.hi(),
        chain.identity_root(),
        chain.identity()
    );
    Ok(())
}
