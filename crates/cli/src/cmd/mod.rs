pub mod claim;
pub mod relay;
pub mod tree;
pub mod verify;

use alloy_primitives::hex;
use anyhow::{Context, Result};
use claimtree_service::{config::Config, snapshot, ClaimService, RelayService};
use claimtree_smt::{MemoryStore, Tree};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Decode hex input (optional `0x` prefix).
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    hex::decode(input.trim()).with_context(|| format!("Invalid hex input: {}", input))
}

fn open_tree(path: Option<&Path>, levels: usize) -> Result<Tree<MemoryStore>> {
    let store = match path {
        Some(path) => snapshot::load(path)?,
        None => MemoryStore::new(),
    };
    Ok(Tree::open(store, levels)?)
}

fn save_tree(path: Option<&Path>, tree: Tree<MemoryStore>) -> Result<()> {
    match path {
        Some(path) => snapshot::save(tree.store(), path),
        None => {
            warn!("No snapshot path configured, changes are discarded");
            Ok(())
        }
    }
}

/// Open the identity tree from its configured snapshot.
pub fn open_identity(config: &Config) -> Result<ClaimService<MemoryStore>> {
    let tree = open_tree(config.storage.snapshot_path.as_deref(), config.tree.levels)
        .context("Failed to open identity tree")?;
    Ok(ClaimService::new(tree))
}

/// Persist the identity tree to its configured snapshot.
pub fn save_identity(config: &Config, service: ClaimService<MemoryStore>) -> Result<()> {
    save_tree(config.storage.snapshot_path.as_deref(), service.into_tree())
}

/// Open the relay tree from its configured snapshot.
pub fn open_relay(config: &Config) -> Result<RelayService<MemoryStore>> {
    let tree = open_tree(
        config.storage.relay_snapshot_path.as_deref(),
        config.relay.levels,
    )
    .context("Failed to open relay tree")?;
    Ok(RelayService::new(tree))
}

/// Persist the relay tree to its configured snapshot.
pub fn save_relay(config: &Config, relay: RelayService<MemoryStore>) -> Result<()> {
    save_tree(
        config.storage.relay_snapshot_path.as_deref(),
        relay.into_tree(),
    )
}
