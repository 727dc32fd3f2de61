//! Node storage backends.

use alloy_primitives::B256;
use std::collections::HashMap;

use crate::error::Result;

/// Byte-addressable key-value store backing a tree.
///
/// Keys are 32-byte hashes; nodes are content-addressed so values are never
/// overwritten with different content, except the reserved root pointer.
/// No delete operation is needed.
pub trait NodeStore {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &B256) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`.
    fn put(&mut self, key: B256, value: Vec<u8>) -> Result<()>;
}

impl<T: NodeStore + ?Sized> NodeStore for &mut T {
    fn get(&self, key: &B256) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&mut self, key: B256, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }
}

/// In-memory node store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<B256, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&B256, &Vec<u8>)> {
        self.entries.iter()
    }
}

impl FromIterator<(B256, Vec<u8>)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (B256, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, key: &B256) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: B256, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }
}
