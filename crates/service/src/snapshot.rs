//! JSON snapshots of in-memory node stores.
//!
//! A snapshot holds every store entry as hex, so a tree re-opened from a
//! snapshot resumes at its persisted root with every historical node intact.

use alloy_primitives::B256;
use anyhow::{Context, Result};
use claimtree_smt::MemoryStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    /// Hex key -> hex value, sorted for stable output
    entries: BTreeMap<String, String>,
}

/// Save `store` to `path`.
///
/// Writes atomically using a temp file next to the destination.
pub fn save(store: &MemoryStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        entries: store
            .iter()
            .map(|(key, value)| (hex::encode(key), hex::encode(value)))
            .collect(),
    };
    let json = serde_json::to_vec_pretty(&snapshot).context("Failed to serialize snapshot")?;

    let temp = temp_path(path);
    std::fs::write(&temp, json)
        .with_context(|| format!("Failed to write snapshot: {}", temp.display()))?;
    std::fs::rename(&temp, path)
        .with_context(|| format!("Failed to move snapshot into place: {}", path.display()))?;

    debug!(path = %path.display(), entries = store.len(), "Saved snapshot");
    Ok(())
}

/// Sibling temp file of `path`, keeping the full file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Load a store from `path`.
///
/// Returns an empty store if no snapshot exists yet.
pub fn load(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        debug!(path = %path.display(), "No snapshot, starting empty");
        return Ok(MemoryStore::new());
    }

    let json = std::fs::read(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_slice(&json)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    if snapshot.version != SNAPSHOT_VERSION {
        anyhow::bail!(
            "Unsupported snapshot version {} in {}",
            snapshot.version,
            path.display()
        );
    }

    let store = snapshot
        .entries
        .into_iter()
        .map(|(key, value)| -> Result<(B256, Vec<u8>)> {
            let key = hex::decode(&key).with_context(|| format!("Invalid snapshot key: {}", key))?;
            if key.len() != 32 {
                anyhow::bail!("Snapshot key has {} bytes, expected 32", key.len());
            }
            let value = hex::decode(&value).context("Invalid snapshot value")?;
            Ok((B256::from_slice(&key), value))
        })
        .collect::<Result<MemoryStore>>()?;

    debug!(path = %path.display(), entries = store.len(), "Loaded snapshot");
    Ok(store)
}
