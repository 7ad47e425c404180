use std::{collections::BTreeSet, mem::size_of};

use log::{debug, info};

use super::{
    read_u32, write_u32, Key, NodeHeader, NodeType, PageKind, PageNum, CELLS_OFFSET, NO_PAGE,
};
use crate::{
    error::{Error, FormatError, Result},
    table::btree::Pager,
    Page,
};

/// Internal Cell Layout
/// (<offset>, <size>)
const CELL_KEY: (usize, usize) = (0, size_of::<Key>());
/// (<offset>, <size>)
const CELL_LEFT: (usize, usize) = (CELL_KEY.0 + CELL_KEY.1, size_of::<PageNum>());
/// (<offset>, <size>)
const CELL_RIGHT: (usize, usize) = (CELL_LEFT.0 + CELL_LEFT.1, size_of::<PageNum>());

pub const INTERNAL_CELL_SIZE: usize = CELL_RIGHT.0 + CELL_RIGHT.1;

/// Separator with the two subtrees it delimits. Keys below `key` live under
/// `left`, the rest under `right`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct InternalCell {
    pub key: Key,
    pub left: PageNum,
    pub right: PageNum,
}

impl InternalCell {
    pub fn encode(&self) -> [u8; INTERNAL_CELL_SIZE] {
        let mut buf = [0; INTERNAL_CELL_SIZE];
        write_u32(&mut buf, CELL_KEY.0, self.key);
        write_u32(&mut buf, CELL_LEFT.0, self.left);
        write_u32(&mut buf, CELL_RIGHT.0, self.right);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FormatError> {
        if buf.len() != INTERNAL_CELL_SIZE {
            return Err(FormatError::CellSize {
                expected: INTERNAL_CELL_SIZE,
                found: buf.len(),
            });
        }
        Ok(Self {
            key: read_u32(buf, CELL_KEY.0),
            left: read_u32(buf, CELL_LEFT.0),
            right: read_u32(buf, CELL_RIGHT.0),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InternalNode {
    page: PageNum,
    parent: PageNum,
    height: u8,
    max_cells: usize,
    cells: Vec<InternalCell>,
}

impl InternalNode {
    /// A parentless node holding a single separator, `height` levels above the
    /// leaves.
    pub fn new_root(page: PageNum, height: u8, cell: InternalCell, max_cells: usize) -> Self {
        Self {
            page,
            parent: NO_PAGE,
            height,
            max_cells,
            cells: vec![cell],
        }
    }

    pub fn page(&self) -> PageNum {
        self.page
    }

    pub fn parent(&self) -> PageNum {
        self.parent
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        self.parent = parent;
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    pub fn cells(&self) -> &[InternalCell] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Child page owning `key`. A key equal to a separator belongs to its
    /// right subtree.
    pub fn descend(&self, key: Key) -> PageNum {
        let idx = self.cells.partition_point(|cell| cell.key <= key);
        match self.cells.get(idx) {
            Some(cell) => cell.left,
            None => self.cells.last().map_or(NO_PAGE, |cell| cell.right),
        }
    }

    /// Every child page, left to right.
    pub fn children(&self) -> Vec<PageNum> {
        let mut children: Vec<PageNum> = self.cells.iter().map(|cell| cell.left).collect();
        if let Some(last) = self.cells.last() {
            children.push(last.right);
        }
        children
    }

    /// Adds the separator a split child sent up, then splits this node in turn
    /// once it holds more than `max_cells`.
    pub fn insert_separator(&mut self, key: Key, cell: &[u8], pager: &mut Pager) -> Result<()> {
        let cell = InternalCell {
            key,
            ..InternalCell::decode(cell).map_err(Error::format(self.page))?
        };
        if self.cells.len() > self.max_cells {
            return Err(Error::Capacity {
                page: self.page,
                max: self.max_cells,
            });
        }

        let idx = self.cells.partition_point(|existing| existing.key <= key);
        self.cells.insert(idx, cell);
        if let Some(prev) = idx.checked_sub(1) {
            self.cells[prev].right = cell.left;
        }
        if let Some(next) = self.cells.get_mut(idx + 1) {
            next.left = cell.right;
        }

        if self.cells.len() > self.max_cells {
            self.split(pager)?;
            Ok(())
        } else {
            pager.write_internal(self)
        }
    }

    /// Keeps the lower half, moves everything past the middle cell into a new
    /// sibling and sends the middle key up.
    pub fn split(&mut self, pager: &mut Pager) -> Result<InternalNode> {
        if self.cells.len() < 2 {
            return Err(Error::Underflow {
                page: self.page,
                cells: self.cells.len(),
            });
        }
        let right_page = pager.allocate();
        let mid = self.cells.len() / 2;
        let moved = self.cells.split_off(mid + 1);
        let bubble = self.cells.pop().ok_or(Error::Underflow {
            page: self.page,
            cells: 0,
        })?;
        let mut right = InternalNode {
            page: right_page,
            parent: self.parent,
            height: self.height,
            max_cells: self.max_cells,
            cells: moved,
        };
        let cell = InternalCell {
            key: bubble.key,
            left: self.page,
            right: right_page,
        };
        debug!(
            "Internal {} split: {} cells stay, {} move to {}, bubbling {}",
            self.page,
            self.cells.len(),
            right.cells.len(),
            right_page,
            bubble.key
        );

        if self.parent == NO_PAGE {
            let root_page = pager.allocate();
            let root = InternalNode::new_root(root_page, self.height + 1, cell, self.max_cells);
            self.parent = root_page;
            right.parent = root_page;
            pager.write_internal(self)?;
            pager.write_internal(&right)?;
            right.adopt_children(pager)?;
            pager.write_internal(&root)?;
            pager.set_root(root_page);
            info!(
                "Root {} split, new root is {} at height {}",
                self.page,
                root_page,
                root.height()
            );
        } else {
            pager.write_internal(self)?;
            pager.write_internal(&right)?;
            right.adopt_children(pager)?;
            let mut parent = pager.read_parent(self.parent, self.height)?;
            parent.insert_separator(cell.key, &cell.encode(), pager)?;
        }
        Ok(right)
    }

    /// Points the parent field of every child at this node.
    pub fn adopt_children(&self, pager: &mut Pager) -> Result<()> {
        let children: BTreeSet<PageNum> = self.children().into_iter().collect();
        for child in children {
            let mut node = pager.read_node_at(child, self.height - 1)?;
            if node.parent() != self.page {
                node.set_parent(self.page);
                pager.write_node(&node)?;
            }
        }
        Ok(())
    }

    pub fn encode(&self) -> Page {
        let mut page = PageKind::Internal.blank_page();
        let header = NodeHeader {
            node_type: NodeType::Internal,
            parent: self.parent,
            next: NO_PAGE,
            cell_size: INTERNAL_CELL_SIZE as u32,
            height: self.height,
            num_cells: self.cells.len() as u8,
        };
        header.write_to(&mut page[..]);

        for (i, cell) in self.cells.iter().enumerate() {
            let offset = CELLS_OFFSET + i * INTERNAL_CELL_SIZE;
            page[offset..offset + INTERNAL_CELL_SIZE].copy_from_slice(&cell.encode());
        }
        page
    }

    pub fn decode(page: PageNum, bytes: &[u8], max_cells: usize) -> Result<Self, FormatError> {
        PageKind::Internal.expect(bytes)?;
        let header = NodeHeader::read_from(bytes)?;
        if header.node_type != NodeType::Internal {
            return Err(FormatError::NodeType(header.node_type.to_u8()));
        }
        if header.cell_size as usize != INTERNAL_CELL_SIZE {
            return Err(FormatError::CellSize {
                expected: INTERNAL_CELL_SIZE,
                found: header.cell_size as usize,
            });
        }
        if header.num_cells == 0 {
            return Err(FormatError::EmptyInternal);
        }
        if header.height == 0 {
            return Err(FormatError::Height {
                expected: 1,
                found: 0,
            });
        }
        let end = header.cells_end()?;

        let cells = bytes[CELLS_OFFSET..end]
            .chunks_exact(INTERNAL_CELL_SIZE)
            .map(InternalCell::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            page,
            parent: header.parent,
            height: header.height,
            max_cells,
            cells,
        })
    }
}
