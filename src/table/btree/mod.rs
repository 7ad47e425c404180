//! Disk-resident B+ tree keyed by `u32`.
//!
//! Page 0 holds [`TreeMeta`]; every other page is a leaf or internal [`Node`].
//! Leaves carry fixed-size payloads and are chained left to right; internal
//! nodes route searches with `(separator, left, right)` cells.

mod meta;
mod node;
mod pager;

#[cfg(test)]
mod tests;

use std::path::Path;

use disk::IoStats;
use log::{debug, info, warn};

pub use meta::{TreeMeta, META_PAGE};
pub use node::{
    max_cells, InternalCell, InternalNode, Key, LeafCell, LeafNode, Node, NodeHeader, NodeType,
    PageKind, PageNum, CELLS_OFFSET, INTERNAL_CELL_SIZE, KEY_SIZE, MAX_CELLS_PER_NODE,
    NODE_BODY_SIZE, NODE_HEADER_SIZE, NO_PAGE,
};
pub use pager::Pager;

use crate::{
    config::TreeConfig,
    error::{Error, Result},
};

#[derive(Debug)]
pub struct BTree {
    pager: Pager,
}

impl BTree {
    /// Opens the tree stored at `path`, initializing the file if it is empty.
    pub fn open_or_create(path: impl AsRef<Path>, config: TreeConfig) -> Result<Self> {
        let pager = Pager::open(path, config)?;
        Ok(Self { pager })
    }

    /// Stores `payload` under `key`. Existing entries with the same key are
    /// kept, and a later search returns one of them.
    ///
    /// On failure the in-memory metadata is rolled back to what it was before
    /// the call.
    pub fn insert(&mut self, key: Key, payload: &[u8]) -> Result<()> {
        let payload_size = self.pager.config().payload_size;
        if payload.len() != payload_size {
            return Err(Error::PayloadSize {
                expected: payload_size,
                actual: payload.len(),
            });
        }

        let meta = self.pager.meta();
        let result = self.insert_entry(key, payload);
        if let Err(err) = &result {
            warn!("Insert of key {} failed, restoring metadata: {}", key, err);
            self.pager.restore_meta(meta);
        }
        result
    }

    fn insert_entry(&mut self, key: Key, payload: &[u8]) -> Result<()> {
        let payload_size = self.pager.config().payload_size;
        let mut leaf = if self.pager.meta().is_empty() {
            let page = self.pager.allocate();
            self.pager.set_root(page);
            self.pager.set_first_leaf(page);
            info!("Created root leaf at page {}", page);
            LeafNode::new_root(page, payload_size)
        } else {
            self.find_leaf(key)?
        };
        debug!("Inserting key {} into leaf {}", key, leaf.page());

        leaf.insert(key, payload, &mut self.pager)?;
        self.pager.save_meta()
    }

    /// Payload of the first entry stored under `key`.
    pub fn search(&mut self, key: Key) -> Result<Option<Vec<u8>>> {
        if self.pager.meta().is_empty() {
            return Ok(None);
        }
        let leaf = self.find_leaf(key)?;
        Ok(leaf.find(key).map(<[u8]>::to_vec))
    }

    pub fn read_node(&mut self, page: PageNum) -> Result<Node> {
        self.pager.read_node(page)
    }

    pub fn meta(&self) -> TreeMeta {
        self.pager.meta()
    }

    /// Levels above the leaves; 0 for an empty tree or a lone root leaf.
    pub fn height(&mut self) -> Result<u8> {
        let root = self.pager.meta().root;
        if root == NO_PAGE {
            return Ok(0);
        }
        Ok(self.pager.read_node(root)?.height())
    }

    pub fn config(&self) -> &TreeConfig {
        self.pager.config()
    }

    pub fn io_stats(&self) -> IoStats {
        self.pager.stats()
    }

    /// Each step down must land exactly one level lower, so a corrupt child
    /// pointer cannot send the descent in circles.
    fn find_leaf(&mut self, key: Key) -> Result<LeafNode> {
        let mut page = self.pager.meta().root;
        let mut node = self.pager.read_node(page)?;
        loop {
            match node {
                Node::Leaf(leaf) => return Ok(leaf),
                Node::Internal(internal) => {
                    page = internal.descend(key);
                    node = self.pager.read_node_at(page, internal.height() - 1)?;
                }
            }
        }
    }
}
