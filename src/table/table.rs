use std::path::Path;

use log::debug;
use thiserror::Error;

use super::{btree::BTree, Row, RowError, ROW_SIZE};
use crate::{config::TreeConfig, error::Error};

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Storage(#[from] Error),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error("duplicate key {0}")]
    DuplicateKey(u32),
}

/// Rows keyed by their `id`, one row per key.
#[derive(Debug)]
pub struct Table {
    tree: BTree,
}

impl Table {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::open_with(path, TreeConfig::new(ROW_SIZE))
    }

    /// Opens with custom tree tuning. The payload size is always `ROW_SIZE`.
    pub fn open_with(path: impl AsRef<Path>, config: TreeConfig) -> Result<Self, TableError> {
        let config = TreeConfig {
            payload_size: ROW_SIZE,
            ..config
        };
        let tree = BTree::open_or_create(path, config)?;
        Ok(Self { tree })
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), TableError> {
        if self.tree.search(row.id())?.is_some() {
            debug!("Rejecting duplicate id {}", row.id());
            return Err(TableError::DuplicateKey(row.id()));
        }
        self.tree.insert(row.id(), &row.serialize())?;
        Ok(())
    }

    pub fn select(&mut self, id: u32) -> Result<Option<Row>, TableError> {
        match self.tree.search(id)? {
            Some(payload) => Ok(Some(Row::deserialize(&payload)?)),
            None => Ok(None),
        }
    }

    pub fn tree(&mut self) -> &mut BTree {
        &mut self.tree
    }
}
