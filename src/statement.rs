use thiserror::Error;

use crate::table::{Row, RowError, Table, TableError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedStatement(String),
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    StringTooLong,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    Insert(Row),
    Select(u32),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ExecuteResult {
    Inserted,
    Found(Row),
    NotFound,
}

impl Statement {
    /// Parses `insert <id> <username> <email>` or `select <id>`.
    pub fn prepare(input: &str) -> Result<Self, PrepareError> {
        let mut args = input.split_whitespace();
        let keyword = args.next().unwrap_or_default();
        let args: Vec<&str> = args.collect();

        match keyword.to_lowercase().as_str() {
            "insert" => {
                let [id, username, email] = args[..] else {
                    return Err(PrepareError::SyntaxError);
                };
                let row = Row::new(parse_id(id)?, username, email).map_err(|err| match err {
                    RowError::StringTooLong { .. } => PrepareError::StringTooLong,
                    _ => PrepareError::SyntaxError,
                })?;
                Ok(Self::Insert(row))
            }
            "select" => {
                let [id] = args[..] else {
                    return Err(PrepareError::SyntaxError);
                };
                Ok(Self::Select(parse_id(id)?))
            }
            _ => Err(PrepareError::UnrecognizedStatement(input.to_string())),
        }
    }

    pub fn execute(&self, table: &mut Table) -> Result<ExecuteResult, TableError> {
        match self {
            Self::Insert(row) => {
                table.insert(row)?;
                Ok(ExecuteResult::Inserted)
            }
            Self::Select(id) => Ok(match table.select(*id)? {
                Some(row) => ExecuteResult::Found(row),
                None => ExecuteResult::NotFound,
            }),
        }
    }
}

fn parse_id(id: &str) -> Result<u32, PrepareError> {
    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    u32::try_from(id).map_err(|_| PrepareError::SyntaxError)
}
