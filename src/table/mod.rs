use std::mem::size_of;

pub mod btree;
mod row;
mod table;

pub use row::{Row, RowError};
pub use table::{Table, TableError};

pub const COLUMN_ID_SIZE: usize = size_of::<u32>();
pub const COLUMN_USERNAME_SIZE: usize = 32;
pub const COLUMN_EMAIL_SIZE: usize = 255;
pub const ROW_SIZE: usize = COLUMN_ID_SIZE + COLUMN_USERNAME_SIZE + COLUMN_EMAIL_SIZE;
