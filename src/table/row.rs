use std::fmt;

use thiserror::Error;

use super::{COLUMN_EMAIL_SIZE, COLUMN_ID_SIZE, COLUMN_USERNAME_SIZE, ROW_SIZE};

/// Row Layout
/// (<offset>, <size>)
const ID: (usize, usize) = (0, COLUMN_ID_SIZE);
/// (<offset>, <size>)
const USERNAME: (usize, usize) = (ID.0 + ID.1, COLUMN_USERNAME_SIZE);
/// (<offset>, <size>)
const EMAIL: (usize, usize) = (USERNAME.0 + USERNAME.1, COLUMN_EMAIL_SIZE);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("{column} is longer than {max} bytes")]
    StringTooLong { column: &'static str, max: usize },
    #[error("row is {0} bytes, expected {}", ROW_SIZE)]
    Length(usize),
    #[error("{0} is not valid UTF-8")]
    Encoding(&'static str),
}

/// Built only through [`Row::new`], so every column fits its width.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Row {
    id: u32,
    username: String,
    email: String,
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, RowError> {
        if username.len() > COLUMN_USERNAME_SIZE {
            return Err(RowError::StringTooLong {
                column: "username",
                max: COLUMN_USERNAME_SIZE,
            });
        }
        if email.len() > COLUMN_EMAIL_SIZE {
            return Err(RowError::StringTooLong {
                column: "email",
                max: COLUMN_EMAIL_SIZE,
            });
        }
        Ok(Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Fixed-width encoding, strings padded with NUL bytes.
    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0; ROW_SIZE];
        buf[ID.0..ID.0 + ID.1].copy_from_slice(&self.id.to_le_bytes());
        write_column(&mut buf[USERNAME.0..USERNAME.0 + USERNAME.1], &self.username);
        write_column(&mut buf[EMAIL.0..EMAIL.0 + EMAIL.1], &self.email);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Result<Self, RowError> {
        if buf.len() != ROW_SIZE {
            return Err(RowError::Length(buf.len()));
        }
        let mut id = [0; COLUMN_ID_SIZE];
        id.copy_from_slice(&buf[ID.0..ID.0 + ID.1]);
        Ok(Self {
            id: u32::from_le_bytes(id),
            username: read_column(&buf[USERNAME.0..USERNAME.0 + USERNAME.1], "username")?,
            email: read_column(&buf[EMAIL.0..EMAIL.0 + EMAIL.1], "email")?,
        })
    }
}

fn write_column(column: &mut [u8], value: &str) {
    column[..value.len()].copy_from_slice(value.as_bytes());
}

fn read_column(bytes: &[u8], column: &'static str) -> Result<String, RowError> {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8(bytes[..end].to_vec()).map_err(|_| RowError::Encoding(column))
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}
