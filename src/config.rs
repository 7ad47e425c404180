use crate::{
    error::{Error, Result},
    table::btree::{max_cells, INTERNAL_CELL_SIZE, KEY_SIZE},
};

/// Smallest leaf fan-out that still leaves both halves of a split non-empty
/// after the entry that triggered it.
const MIN_LEAF_CELLS: usize = 3;
const MIN_INTERNAL_CELLS: usize = 2;

/// Tuning for a single tree file.
///
/// `payload_size` is fixed for the lifetime of the file; opening it again with
/// another size makes every leaf fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Bytes stored next to every key in a leaf.
    pub payload_size: usize,
    /// Internal nodes split once they hold more than this many cells.
    pub max_internal_cells: usize,
    /// `sync_data` after every page write.
    pub sync_writes: bool,
}

impl TreeConfig {
    pub fn new(payload_size: usize) -> Self {
        Self {
            payload_size,
            max_internal_cells: Self::largest_internal_fanout(),
            sync_writes: false,
        }
    }

    pub fn with_max_internal_cells(mut self, max_internal_cells: usize) -> Self {
        self.max_internal_cells = max_internal_cells;
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// One slot stays free for the cell that overflows a node right before it
    /// splits.
    pub fn largest_internal_fanout() -> usize {
        max_cells(INTERNAL_CELL_SIZE) - 1
    }

    pub fn leaf_cell_size(&self) -> usize {
        KEY_SIZE + self.payload_size
    }

    pub fn max_leaf_cells(&self) -> usize {
        max_cells(self.leaf_cell_size())
    }

    pub fn validate(&self) -> Result<()> {
        if self.payload_size == 0 {
            return Err(Error::Config("payload size must be positive".to_string()));
        }
        if self.max_leaf_cells() < MIN_LEAF_CELLS {
            return Err(Error::Config(format!(
                "payload of {} bytes leaves room for {} cells per leaf, need at least {}",
                self.payload_size,
                self.max_leaf_cells(),
                MIN_LEAF_CELLS
            )));
        }
        let largest = Self::largest_internal_fanout();
        if !(MIN_INTERNAL_CELLS..=largest).contains(&self.max_internal_cells) {
            return Err(Error::Config(format!(
                "max internal cells must be between {} and {}, got {}",
                MIN_INTERNAL_CELLS, largest, self.max_internal_cells
            )));
        }
        Ok(())
    }
}
