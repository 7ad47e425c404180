pub mod config;
pub mod error;
pub mod meta_commands;
pub mod repl;
pub mod statement;
pub mod table;

pub const PAGE_SIZE: usize = 1 << 12;

/// One on-disk page, the unit of every read and write.
pub type Page = Box<[u8; PAGE_SIZE]>;

pub use config::TreeConfig;
pub use error::{Error, FormatError, Result};
pub use table::btree::BTree;
