use log::{debug, info};

use super::{
    max_cells, read_u32, write_u32, InternalCell, InternalNode, Key, NodeHeader, NodeType,
    PageKind, PageNum, CELLS_OFFSET, KEY_SIZE, NO_PAGE,
};
use crate::{
    error::{Error, FormatError, Result},
    table::btree::Pager,
    Page,
};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LeafCell {
    pub key: Key,
    pub payload: Vec<u8>,
}

/// A leaf page: `(key, payload)` cells in ascending key order, chained to the
/// next leaf on the right.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LeafNode {
    page: PageNum,
    node_type: NodeType,
    parent: PageNum,
    next: PageNum,
    payload_size: usize,
    cells: Vec<LeafCell>,
}

impl LeafNode {
    pub fn new(page: PageNum, payload_size: usize) -> Self {
        Self {
            page,
            node_type: NodeType::Leaf,
            parent: NO_PAGE,
            next: NO_PAGE,
            payload_size,
            cells: Vec::new(),
        }
    }

    /// The first leaf of an empty tree.
    pub fn new_root(page: PageNum, payload_size: usize) -> Self {
        Self {
            node_type: NodeType::Root,
            ..Self::new(page, payload_size)
        }
    }

    pub fn page(&self) -> PageNum {
        self.page
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn parent(&self) -> PageNum {
        self.parent
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        self.parent = parent;
    }

    pub fn next(&self) -> PageNum {
        self.next
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn cell_size(&self) -> usize {
        KEY_SIZE + self.payload_size
    }

    pub fn max_cells(&self) -> usize {
        max_cells(self.cell_size())
    }

    pub fn cells(&self) -> &[LeafCell] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.cells.iter().map(|cell| cell.key)
    }

    /// First index whose key is not smaller than `key`.
    pub fn insertion_index(&self, key: Key) -> usize {
        self.cells.partition_point(|cell| cell.key < key)
    }

    /// Payload of the first cell holding `key`.
    pub fn find(&self, key: Key) -> Option<&[u8]> {
        self.cells
            .get(self.insertion_index(key))
            .filter(|cell| cell.key == key)
            .map(|cell| cell.payload.as_slice())
    }

    /// Places the entry at its sorted position, in front of any equal keys,
    /// and splits as soon as the node reaches its capacity.
    pub fn insert(&mut self, key: Key, payload: &[u8], pager: &mut Pager) -> Result<()> {
        if payload.len() != self.payload_size {
            return Err(Error::PayloadSize {
                expected: self.payload_size,
                actual: payload.len(),
            });
        }
        let max = self.max_cells();
        if self.cells.len() > max {
            return Err(Error::Capacity {
                page: self.page,
                max,
            });
        }

        let idx = self.insertion_index(key);
        self.cells.insert(
            idx,
            LeafCell {
                key,
                payload: payload.to_vec(),
            },
        );

        if self.cells.len() >= max {
            self.split(pager)?;
            Ok(())
        } else {
            pager.write_leaf(self)
        }
    }

    /// Moves the upper half of the cells into a freshly allocated right
    /// sibling and hands the separator to the parent, creating a new root when
    /// this leaf was the root.
    pub fn split(&mut self, pager: &mut Pager) -> Result<LeafNode> {
        if self.cells.len() < 2 {
            return Err(Error::Underflow {
                page: self.page,
                cells: self.cells.len(),
            });
        }
        let right_page = pager.allocate();
        let mid = self.cells.len() / 2;
        let mut right = LeafNode {
            page: right_page,
            node_type: NodeType::Leaf,
            parent: self.parent,
            next: self.next,
            payload_size: self.payload_size,
            cells: self.cells.split_off(mid),
        };
        self.next = right_page;
        self.node_type = NodeType::Leaf;

        let separator = right.cells[0].key;
        let cell = InternalCell {
            key: separator,
            left: self.page,
            right: right_page,
        };
        debug!(
            "Leaf {} split: {} cells stay, {} move to leaf {}, separator {}",
            self.page,
            self.cells.len(),
            right.cells.len(),
            right_page,
            separator
        );

        if self.parent == NO_PAGE {
            let root_page = pager.allocate();
            let max_internal_cells = pager.config().max_internal_cells;
            let root = InternalNode::new_root(root_page, 1, cell, max_internal_cells);
            self.parent = root_page;
            right.parent = root_page;
            pager.write_leaf(self)?;
            pager.write_leaf(&right)?;
            pager.write_internal(&root)?;
            pager.set_root(root_page);
            pager.set_first_leaf(self.page);
            info!("Root leaf {} split, new root is {}", self.page, root_page);
        } else {
            pager.write_leaf(self)?;
            pager.write_leaf(&right)?;
            let mut parent = pager.read_parent(self.parent, 0)?;
            parent.insert_separator(separator, &cell.encode(), pager)?;
        }
        Ok(right)
    }

    pub fn encode(&self) -> Page {
        let mut page = PageKind::Leaf.blank_page();
        let header = NodeHeader {
            node_type: self.node_type,
            parent: self.parent,
            next: self.next,
            cell_size: self.cell_size() as u32,
            height: 0,
            num_cells: self.cells.len() as u8,
        };
        header.write_to(&mut page[..]);

        let cell_size = self.cell_size();
        for (i, cell) in self.cells.iter().enumerate() {
            let offset = CELLS_OFFSET + i * cell_size;
            write_u32(&mut page[..], offset, cell.key);
            page[offset + KEY_SIZE..offset + cell_size].copy_from_slice(&cell.payload);
        }
        page
    }

    pub fn decode(page: PageNum, bytes: &[u8]) -> Result<Self, FormatError> {
        PageKind::Leaf.expect(bytes)?;
        let header = NodeHeader::read_from(bytes)?;
        if header.node_type == NodeType::Internal {
            return Err(FormatError::NodeType(header.node_type.to_u8()));
        }
        let cell_size = header.cell_size as usize;
        if cell_size <= KEY_SIZE {
            return Err(FormatError::CellSize {
                expected: KEY_SIZE + 1,
                found: cell_size,
            });
        }
        let end = header.cells_end()?;

        let cells = bytes[CELLS_OFFSET..end]
            .chunks_exact(cell_size)
            .map(|chunk| LeafCell {
                key: read_u32(chunk, 0),
                payload: chunk[KEY_SIZE..].to_vec(),
            })
            .collect();

        Ok(Self {
            page,
            node_type: header.node_type,
            parent: header.parent,
            next: header.next,
            payload_size: cell_size - KEY_SIZE,
            cells,
        })
    }
}
