mod internal;
mod leaf;


use std::mem::size_of;

use crate::{error::FormatError, Page, PAGE_SIZE};

pub use internal::{InternalCell, InternalNode, INTERNAL_CELL_SIZE};
pub use leaf::{LeafCell, LeafNode};

pub type PageNum = u32;
pub type Key = u32;
pub type CellsCount = u8;

/// Page 0 holds the tree metadata, so as a pointer it means "none".
pub const NO_PAGE: PageNum = 0;

pub const KEY_SIZE: usize = size_of::<Key>();

/// (<offset>, <size>)
pub const KIND_TAG: (usize, usize) = (0, 2);

/// Common Node Header Layout
/// (<offset>, <size>)
const NODE_TYPE: (usize, usize) = (KIND_TAG.0 + KIND_TAG.1, size_of::<u8>());
/// (<offset>, <size>)
const PARENT_POINTER: (usize, usize) = (NODE_TYPE.0 + NODE_TYPE.1, size_of::<PageNum>());
/// (<offset>, <size>)
const NEXT_POINTER: (usize, usize) = (PARENT_POINTER.0 + PARENT_POINTER.1, size_of::<PageNum>());
/// (<offset>, <size>)
const CELL_SIZE: (usize, usize) = (NEXT_POINTER.0 + NEXT_POINTER.1, size_of::<u32>());
/// (<offset>, <size>)
const HEIGHT: (usize, usize) = (CELL_SIZE.0 + CELL_SIZE.1, size_of::<u8>());
/// (<offset>, <size>)
const CELL_NUMS: (usize, usize) = (HEIGHT.0 + HEIGHT.1, size_of::<CellsCount>());

pub const NODE_HEADER_SIZE: usize = CELL_NUMS.0 + CELL_NUMS.1 - NODE_TYPE.0;
pub const CELLS_OFFSET: usize = CELL_NUMS.0 + CELL_NUMS.1;
pub const NODE_BODY_SIZE: usize = PAGE_SIZE - CELLS_OFFSET;
pub const MAX_CELLS_PER_NODE: usize = CellsCount::MAX as usize;

/// How many cells of `cell_size` bytes fit in a node page.
pub const fn max_cells(cell_size: usize) -> usize {
    let fit = NODE_BODY_SIZE / cell_size;
    if fit < MAX_CELLS_PER_NODE {
        fit
    } else {
        MAX_CELLS_PER_NODE
    }
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; size_of::<u32>()];
    bytes.copy_from_slice(&buf[offset..offset + size_of::<u32>()]);
    u32::from_le_bytes(bytes)
}

pub(crate) fn write_u32(buf: &mut [u8], offset: usize, val: u32) {
    buf[offset..offset + size_of::<u32>()].copy_from_slice(&val.to_le_bytes());
}

/// The two leading bytes of every page.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PageKind {
    Meta,
    Leaf,
    Internal,
}

impl PageKind {
    pub const fn tag(self) -> [u8; 2] {
        match self {
            Self::Meta => [0xAB, 0xC0],
            Self::Leaf => [0xAB, 0xC1],
            Self::Internal => [0xAB, 0xC2],
        }
    }

    pub fn from_tag(tag: [u8; 2]) -> Option<Self> {
        [Self::Meta, Self::Leaf, Self::Internal]
            .into_iter()
            .find(|kind| kind.tag() == tag)
    }

    /// Identifies a raw page by its tag alone.
    pub fn of(page: &[u8]) -> Result<Self, FormatError> {
        if page.len() != PAGE_SIZE {
            return Err(FormatError::PageLength(page.len()));
        }
        let tag = [page[KIND_TAG.0], page[KIND_TAG.0 + 1]];
        Self::from_tag(tag).ok_or(FormatError::UnknownTag(tag))
    }

    pub(crate) fn expect(self, page: &[u8]) -> Result<(), FormatError> {
        let found = Self::of(page)?;
        if found != self {
            return Err(FormatError::KindTag {
                expected: self,
                found,
            });
        }
        Ok(())
    }

    /// A zeroed page carrying this kind's tag.
    pub fn blank_page(self) -> Page {
        let mut page = Box::new([0; PAGE_SIZE]);
        page[KIND_TAG.0..KIND_TAG.0 + KIND_TAG.1].copy_from_slice(&self.tag());
        page
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum NodeType {
    Internal,
    Leaf,
    /// The very first leaf, acting as root before the tree ever split.
    Root,
}

impl NodeType {
    pub fn from_u8(byte: u8) -> Result<Self, FormatError> {
        match byte {
            0x0 => Ok(Self::Internal),
            0x1 => Ok(Self::Leaf),
            0x2 => Ok(Self::Root),
            _ => Err(FormatError::NodeType(byte)),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Internal => 0x0,
            Self::Leaf => 0x1,
            Self::Root => 0x2,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub parent: PageNum,
    pub next: PageNum,
    pub cell_size: u32,
    pub height: u8,
    pub num_cells: CellsCount,
}

impl NodeHeader {
    pub fn read_from(page: &[u8]) -> Result<Self, FormatError> {
        if page.len() != PAGE_SIZE {
            return Err(FormatError::PageLength(page.len()));
        }
        Ok(Self {
            node_type: NodeType::from_u8(page[NODE_TYPE.0])?,
            parent: read_u32(page, PARENT_POINTER.0),
            next: read_u32(page, NEXT_POINTER.0),
            cell_size: read_u32(page, CELL_SIZE.0),
            height: page[HEIGHT.0],
            num_cells: page[CELL_NUMS.0],
        })
    }

    pub fn write_to(&self, page: &mut [u8]) {
        page[NODE_TYPE.0] = self.node_type.to_u8();
        write_u32(page, PARENT_POINTER.0, self.parent);
        write_u32(page, NEXT_POINTER.0, self.next);
        write_u32(page, CELL_SIZE.0, self.cell_size);
        page[HEIGHT.0] = self.height;
        page[CELL_NUMS.0] = self.num_cells;
    }

    /// Bytes of the page covered by the populated cells.
    pub(crate) fn cells_end(&self) -> Result<usize, FormatError> {
        let cells = self.num_cells as usize;
        let cell_size = self.cell_size as usize;
        if cell_size == 0 || cells * cell_size > NODE_BODY_SIZE {
            return Err(FormatError::CellCount { cells, cell_size });
        }
        Ok(CELLS_OFFSET + cells * cell_size)
    }
}

/// A decoded node page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    /// Decodes `bytes` according to its kind tag.
    pub fn decode(page: PageNum, bytes: &[u8], max_internal_cells: usize) -> Result<Self, FormatError> {
        match PageKind::of(bytes)? {
            PageKind::Leaf => Ok(Self::Leaf(LeafNode::decode(page, bytes)?)),
            PageKind::Internal => Ok(Self::Internal(InternalNode::decode(
                page,
                bytes,
                max_internal_cells,
            )?)),
            PageKind::Meta => Err(FormatError::KindTag {
                expected: PageKind::Leaf,
                found: PageKind::Meta,
            }),
        }
    }

    pub fn encode(&self) -> Page {
        match self {
            Self::Leaf(leaf) => leaf.encode(),
            Self::Internal(internal) => internal.encode(),
        }
    }

    pub fn page(&self) -> PageNum {
        match self {
            Self::Leaf(leaf) => leaf.page(),
            Self::Internal(internal) => internal.page(),
        }
    }

    pub fn parent(&self) -> PageNum {
        match self {
            Self::Leaf(leaf) => leaf.parent(),
            Self::Internal(internal) => internal.parent(),
        }
    }

    pub fn set_parent(&mut self, parent: PageNum) {
        match self {
            Self::Leaf(leaf) => leaf.set_parent(parent),
            Self::Internal(internal) => internal.set_parent(parent),
        }
    }

    pub fn height(&self) -> u8 {
        match self {
            Self::Leaf(_) => 0,
            Self::Internal(internal) => internal.height(),
        }
    }

    pub fn num_cells(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.num_cells(),
            Self::Internal(internal) => internal.num_cells(),
        }
    }
}
