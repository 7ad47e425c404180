use std::path::Path;

use disk::{Disk, IoStats};
use log::{debug, trace};

use super::{
    meta::{TreeMeta, META_PAGE},
    node::{InternalNode, LeafNode, Node, PageKind, PageNum},
};
use crate::{
    config::TreeConfig,
    error::{Error, FormatError, Result},
    Page, PAGE_SIZE,
};

/// Page-granular access to the tree file plus the in-memory copy of its
/// metadata page.
///
/// Structural changes only touch the in-memory metadata; [`Pager::save_meta`]
/// writes it back.
#[derive(Debug)]
pub struct Pager {
    disk: Disk<PAGE_SIZE>,
    meta: TreeMeta,
    meta_dirty: bool,
    config: TreeConfig,
}

impl Pager {
    /// Opens the tree file at `path`. An empty file gets a fresh metadata page.
    pub fn open(path: impl AsRef<Path>, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut disk = Disk::open(path)?.with_sync_writes(config.sync_writes);

        let meta = if disk.is_empty()? {
            let meta = TreeMeta::default();
            disk.write_block(META_PAGE, &meta.encode()[..])?;
            debug!("Initialized metadata in {}", disk.path().display());
            meta
        } else {
            let bytes = disk.read_block(META_PAGE)?;
            TreeMeta::decode(&bytes[..]).map_err(Error::format(META_PAGE))?
        };
        debug!(
            "Opened tree {}: root {}, first leaf {}, {} nodes",
            disk.path().display(),
            meta.root,
            meta.first_leaf,
            meta.node_count
        );

        Ok(Self {
            disk,
            meta,
            meta_dirty: false,
            config,
        })
    }

    pub fn read_page(&mut self, page: PageNum) -> Result<Page> {
        trace!("Reading page {}", page);
        Ok(self.disk.read_block(page)?)
    }

    pub fn write_page(&mut self, page: PageNum, bytes: &Page) -> Result<()> {
        trace!("Writing page {}", page);
        Ok(self.disk.write_block(page, &bytes[..])?)
    }

    pub fn read_node(&mut self, page: PageNum) -> Result<Node> {
        if page == META_PAGE {
            return Err(Error::ReservedPage(page));
        }
        let bytes = self.read_page(page)?;
        let node = Node::decode(page, &bytes[..], self.config.max_internal_cells)
            .map_err(Error::format(page))?;
        if let Node::Leaf(leaf) = &node {
            if leaf.payload_size() != self.config.payload_size {
                return Err(Error::Format {
                    page,
                    source: FormatError::CellSize {
                        expected: self.config.leaf_cell_size(),
                        found: leaf.cell_size(),
                    },
                });
            }
        }
        Ok(node)
    }

    pub fn read_leaf(&mut self, page: PageNum) -> Result<LeafNode> {
        match self.read_node(page)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::Format {
                page,
                source: FormatError::KindTag {
                    expected: PageKind::Leaf,
                    found: PageKind::Internal,
                },
            }),
        }
    }

    pub fn read_internal(&mut self, page: PageNum) -> Result<InternalNode> {
        match self.read_node(page)? {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(Error::Format {
                page,
                source: FormatError::KindTag {
                    expected: PageKind::Internal,
                    found: PageKind::Leaf,
                },
            }),
        }
    }

    /// Reads a node that must sit `height` levels above the leaves.
    pub fn read_node_at(&mut self, page: PageNum, height: u8) -> Result<Node> {
        let node = self.read_node(page)?;
        if node.height() != height {
            return Err(Error::Format {
                page,
                source: FormatError::Height {
                    expected: height,
                    found: node.height(),
                },
            });
        }
        Ok(node)
    }

    /// Reads the parent of a node at `child_height`.
    pub fn read_parent(&mut self, page: PageNum, child_height: u8) -> Result<InternalNode> {
        match self.read_node_at(page, child_height + 1)? {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(Error::Format {
                page,
                source: FormatError::KindTag {
                    expected: PageKind::Internal,
                    found: PageKind::Leaf,
                },
            }),
        }
    }

    /// Puts back metadata captured before a failed operation.
    pub fn restore_meta(&mut self, meta: TreeMeta) {
        self.meta = meta;
        self.meta_dirty = true;
    }

    pub fn write_leaf(&mut self, leaf: &LeafNode) -> Result<()> {
        self.write_node_page(leaf.page(), leaf.encode())
    }

    pub fn write_internal(&mut self, internal: &InternalNode) -> Result<()> {
        self.write_node_page(internal.page(), internal.encode())
    }

    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        self.write_node_page(node.page(), node.encode())
    }

    fn write_node_page(&mut self, page: PageNum, bytes: Page) -> Result<()> {
        if page == META_PAGE {
            return Err(Error::ReservedPage(page));
        }
        self.write_page(page, &bytes)
    }

    /// Hands out the next node page. Pages are never reused.
    pub fn allocate(&mut self) -> PageNum {
        self.meta.node_count += 1;
        self.meta_dirty = true;
        trace!("Allocated page {}", self.meta.node_count);
        self.meta.node_count
    }

    pub fn set_root(&mut self, root: PageNum) {
        self.meta.root = root;
        self.meta_dirty = true;
    }

    pub fn set_first_leaf(&mut self, first_leaf: PageNum) {
        self.meta.first_leaf = first_leaf;
        self.meta_dirty = true;
    }

    /// Writes the metadata page if anything changed since the last save.
    pub fn save_meta(&mut self) -> Result<()> {
        if !self.meta_dirty {
            return Ok(());
        }
        let bytes = self.meta.encode();
        self.write_page(META_PAGE, &bytes)?;
        self.meta_dirty = false;
        Ok(())
    }

    pub fn meta(&self) -> TreeMeta {
        self.meta
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn stats(&self) -> IoStats {
        self.disk.stats()
    }
}
