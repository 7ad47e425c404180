use disk::DiskError;
use thiserror::Error;

use crate::{
    table::btree::{PageKind, PageNum},
    PAGE_SIZE,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Disk(#[from] DiskError),

    #[error("malformed page {page}: {source}")]
    Format {
        page: PageNum,
        #[source]
        source: FormatError,
    },

    #[error("node at page {page} is full ({max} cells)")]
    Capacity { page: PageNum, max: usize },

    #[error("node at page {page} has {cells} cells, too few to split")]
    Underflow { page: PageNum, cells: usize },

    #[error("payload is {actual} bytes, the tree stores {expected} byte payloads")]
    PayloadSize { expected: usize, actual: usize },

    #[error("page {0} is reserved and cannot hold a node")]
    ReservedPage(PageNum),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn format(page: PageNum) -> impl FnOnce(FormatError) -> Error {
        move |source| Error::Format { page, source }
    }
}

/// Ways a page can fail to decode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("page is {0} bytes, expected {}", PAGE_SIZE)]
    PageLength(usize),

    #[error("unknown kind tag {0:02x?}")]
    UnknownTag([u8; 2]),

    #[error("expected a {expected:?} page, found {found:?}")]
    KindTag { expected: PageKind, found: PageKind },

    #[error("unknown node type {0}")]
    NodeType(u8),

    #[error("{cells} cells of {cell_size} bytes do not fit in a page")]
    CellCount { cells: usize, cell_size: usize },

    #[error("cell size {found}, expected {expected}")]
    CellSize { expected: usize, found: usize },

    #[error("internal node has no cells")]
    EmptyInternal,

    #[error("node at height {found}, expected {expected}")]
    Height { expected: u8, found: u8 },
}
