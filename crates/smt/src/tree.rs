//! Sparse Merkle Tree - the main tree structure.

use alloy_primitives::B256;
use claimtree_core::constants::{EMPTY_NODE_VALUE, MAX_TREE_LEVELS, ROOT_KEY};
use claimtree_core::hashing::{compute_claim_key, compute_middle_hash};
use claimtree_core::ClaimEncoding;
use tracing::{debug, info, warn};

use crate::error::{Result, SmtError};
use crate::node::{first_divergence, leaf_hash_at, path_bit, Node};
use crate::proof::{AuxLeaf, Proof};
use crate::store::NodeStore;

/// Where a walk from the root towards an index hash stopped.
#[derive(Debug)]
struct Path {
    /// Sibling hash per depth above `depth`
    siblings: Vec<B256>,
    /// Depth of the node the walk ended on
    depth: usize,
    /// `Empty` or `Leaf`
    end: Node,
}

/// A fixed-depth Sparse Merkle Tree over a content-addressed node store.
///
/// Maps claim index hashes (`hi`) to total hashes (`ht`). Nodes are only ever
/// added to the store, so every root the tree has had stays provable for as
/// long as the store retains its nodes.
///
/// `add` takes `&mut self` and is the single writer; proof generation takes
/// `&self` and may run from several threads at once.
///
/// # Examples
///
/// ```
/// use claimtree_core::{Address, AuthorizeKSignClaim, ClaimEncoding, EMPTY_NODE_VALUE};
/// use claimtree_smt::{check_proof, MemoryStore, Tree};
///
/// let mut tree = Tree::new(MemoryStore::new(), 140).unwrap();
/// let claim = AuthorizeKSignClaim::new_operational(Address::repeat_byte(0x11));
/// tree.add(&claim).unwrap();
///
/// let proof = tree.generate_proof(&claim.hi()).unwrap();
/// assert!(check_proof(&tree.root(), &proof, &claim.hi(), &claim.ht(), 140));
/// assert!(!check_proof(&tree.root(), &proof, &claim.hi(), &EMPTY_NODE_VALUE, 140));
/// ```
#[derive(Debug)]
pub struct Tree<S> {
    store: S,
    levels: usize,
    root: B256,
}

impl<S: NodeStore> Tree<S> {
    /// Create a tree with an empty root over `store`.
    ///
    /// `levels` counts the bottom leaf level, so the tree branches on
    /// `levels - 1` bits of each index hash.
    pub fn new(store: S, levels: usize) -> Result<Self> {
        validate_levels(levels)?;
        Ok(Self {
            store,
            levels,
            root: EMPTY_NODE_VALUE,
        })
    }

    /// Re-open a tree over `store`, resuming at its persisted root.
    pub fn open(store: S, levels: usize) -> Result<Self> {
        validate_levels(levels)?;
        let root = match store.get(&ROOT_KEY)? {
            Some(bytes) if bytes.len() == 32 => B256::from_slice(&bytes),
            Some(bytes) => {
                return Err(SmtError::CorruptNode {
                    hash: ROOT_KEY,
                    reason: format!("root pointer has {} bytes", bytes.len()),
                })
            }
            None => EMPTY_NODE_VALUE,
        };
        debug!(levels, root = %root, "Opened tree");
        Ok(Self {
            store,
            levels,
            root,
        })
    }

    /// Current root.
    pub fn root(&self) -> B256 {
        self.root
    }

    /// Number of levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Borrow the node store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the tree, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Insert a claim at its index hash and store its bytes.
    ///
    /// Returns the new root. Fails with [`SmtError::DuplicateEntry`] when a
    /// leaf already sits at the claim's index hash.
    pub fn add<C: ClaimEncoding + ?Sized>(&mut self, claim: &C) -> Result<B256> {
        let hi = claim.hi();
        let ht = claim.ht();
        // Claim bytes go in before any node so a failed write leaves the tree unchanged
        self.store.put(compute_claim_key(&ht), claim.to_bytes())?;
        self.add_leaf(hi, ht)
    }

    /// Insert a raw `hi -> ht` leaf. Returns the new root.
    ///
    /// The root only moves once the root pointer is persisted; on a store
    /// error the tree stays at its previous root and the insert can be retried.
    pub fn add_leaf(&mut self, hi: B256, ht: B256) -> Result<B256> {
        if ht == EMPTY_NODE_VALUE {
            return Err(SmtError::EmptyLeafValue);
        }

        let path = self.walk(self.root, &hi)?;

        let mut node = match path.end {
            Node::Leaf {
                hi: existing_hi,
                ht: existing_ht,
            } => {
                if existing_hi == hi {
                    warn!(hi = %hi, "Rejected duplicate entry");
                    return Err(SmtError::DuplicateEntry(hi));
                }
                self.push_down(path.depth, hi, ht, existing_hi, existing_ht)?
            }
            _ => self.put_leaf(path.depth, hi, ht)?,
        };

        for depth in (0..path.depth).rev() {
            let sibling = path.siblings[depth];
            node = if path_bit(&hi, depth) {
                self.put_middle(sibling, node)?
            } else {
                self.put_middle(node, sibling)?
            };
        }

        self.store.put(ROOT_KEY, node.to_vec())?;
        self.root = node;

        info!(hi = %hi, root = %node, depth = path.depth, "Added leaf");
        Ok(node)
    }

    /// Proof for `hi` against the current root.
    ///
    /// A leaf found where the path to `hi` diverges is folded into an
    /// ordinary sibling, so the proof never carries an auxiliary leaf.
    pub fn generate_proof(&self, hi: &B256) -> Result<Proof> {
        self.generate_proof_at(self.root, hi)
    }

    /// Proof for `hi` against a historical `root` of this tree.
    pub fn generate_proof_at(&self, root: B256, hi: &B256) -> Result<Proof> {
        let path = self.walk(root, hi)?;
        let mut siblings = path.siblings;

        if let Node::Leaf {
            hi: leaf_hi,
            ht: leaf_ht,
        } = path.end
        {
            if leaf_hi != *hi {
                let split = first_divergence(hi, &leaf_hi, path.depth, self.levels)
                    .ok_or(SmtError::PathCollision(*hi))?;
                siblings.resize(split, EMPTY_NODE_VALUE);
                siblings.push(leaf_hash_at(self.levels, split + 1, &leaf_hi, &leaf_ht));
            }
        }

        debug!(hi = %hi, root = %root, depth = path.depth, "Generated proof");
        Ok(Proof::new(siblings, None))
    }

    /// Proof for `hi` against the current root, reporting a divergent leaf
    /// as an auxiliary leaf instead of folding it into the siblings.
    pub fn generate_proof_with_aux(&self, hi: &B256) -> Result<Proof> {
        let path = self.walk(self.root, hi)?;

        let aux = match path.end {
            Node::Leaf {
                hi: leaf_hi,
                ht: leaf_ht,
            } if leaf_hi != *hi => {
                if first_divergence(hi, &leaf_hi, path.depth, self.levels).is_none() {
                    return Err(SmtError::PathCollision(*hi));
                }
                Some(AuxLeaf {
                    hi: leaf_hi,
                    ht: leaf_ht,
                })
            }
            _ => None,
        };

        debug!(hi = %hi, depth = path.depth, aux = aux.is_some(), "Generated proof");
        Ok(Proof::new(path.siblings, aux))
    }

    /// Total hash stored at `hi`, or the empty value when `hi` is absent.
    pub fn value_in_pos(&self, hi: &B256) -> Result<B256> {
        let path = self.walk(self.root, hi)?;
        Ok(match path.end {
            Node::Leaf {
                hi: leaf_hi,
                ht: leaf_ht,
            } if leaf_hi == *hi => leaf_ht,
            _ => EMPTY_NODE_VALUE,
        })
    }

    /// Full bytes of the claim added with total hash `ht`.
    pub fn claim_bytes(&self, ht: &B256) -> Result<Option<Vec<u8>>> {
        self.store.get(&compute_claim_key(ht))
    }

    /// Walk from `root` towards `hi` until an empty node or a leaf.
    fn walk(&self, root: B256, hi: &B256) -> Result<Path> {
        let mut siblings = Vec::new();
        let mut hash = root;
        let mut depth = 0;

        loop {
            if hash == EMPTY_NODE_VALUE {
                return Ok(Path {
                    siblings,
                    depth,
                    end: Node::Empty,
                });
            }

            match self.load(hash, depth)? {
                leaf @ Node::Leaf { .. } => {
                    return Ok(Path {
                        siblings,
                        depth,
                        end: leaf,
                    })
                }
                Node::Middle { left, right } => {
                    if path_bit(hi, depth) {
                        siblings.push(left);
                        hash = right;
                    } else {
                        siblings.push(right);
                        hash = left;
                    }
                }
                Node::Empty => {
                    return Err(SmtError::CorruptNode {
                        hash,
                        reason: "empty node stored".into(),
                    })
                }
            }

            depth += 1;
        }
    }

    /// Fetch and check the node rooting the subtree at `depth`.
    fn load(&self, hash: B256, depth: usize) -> Result<Node> {
        let bytes = self.store.get(&hash)?.ok_or_else(|| SmtError::CorruptNode {
            hash,
            reason: "missing from store".into(),
        })?;
        let node = Node::decode(hash, &bytes)?;

        if let Node::Middle { .. } = node {
            if depth + 1 >= self.levels {
                return Err(SmtError::CorruptNode {
                    hash,
                    reason: format!("middle node at leaf depth {}", depth),
                });
            }
        }
        if node.hash_at(self.levels, depth) != hash {
            return Err(SmtError::CorruptNode {
                hash,
                reason: format!("content does not hash to key at depth {}", depth),
            });
        }

        Ok(node)
    }

    /// Split the subtree at `depth` holding one leaf into one holding both.
    fn push_down(
        &mut self,
        depth: usize,
        hi: B256,
        ht: B256,
        existing_hi: B256,
        existing_ht: B256,
    ) -> Result<B256> {
        let split = first_divergence(&hi, &existing_hi, depth, self.levels)
            .ok_or(SmtError::PathCollision(hi))?;

        let new_leaf = self.put_leaf(split + 1, hi, ht)?;
        let old_leaf = self.put_leaf(split + 1, existing_hi, existing_ht)?;

        let mut node = if path_bit(&hi, split) {
            self.put_middle(old_leaf, new_leaf)?
        } else {
            self.put_middle(new_leaf, old_leaf)?
        };

        for d in (depth..split).rev() {
            node = if path_bit(&hi, d) {
                self.put_middle(EMPTY_NODE_VALUE, node)?
            } else {
                self.put_middle(node, EMPTY_NODE_VALUE)?
            };
        }

        Ok(node)
    }

    fn put_leaf(&mut self, depth: usize, hi: B256, ht: B256) -> Result<B256> {
        let hash = leaf_hash_at(self.levels, depth, &hi, &ht);
        self.put_node(hash, Node::Leaf { hi, ht })?;
        Ok(hash)
    }

    fn put_middle(&mut self, left: B256, right: B256) -> Result<B256> {
        let hash = compute_middle_hash(&left, &right);
        if hash != EMPTY_NODE_VALUE {
            self.put_node(hash, Node::Middle { left, right })?;
        }
        Ok(hash)
    }

    fn put_node(&mut self, hash: B256, node: Node) -> Result<()> {
        if let Some(bytes) = node.encode() {
            debug!(hash = %hash, "Storing node");
            self.store.put(hash, bytes)?;
        }
        Ok(())
    }
}

fn validate_levels(levels: usize) -> Result<()> {
    if !(2..=MAX_TREE_LEVELS).contains(&levels) {
        return Err(SmtError::InvalidLevels(levels));
    }
    Ok(())
}
