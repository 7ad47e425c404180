use std::io::{self, BufRead, Write};

use log::{debug, error};
use thiserror::Error;

use crate::{
    meta_commands::{handle_meta_command, MetaCommand, HELP},
    statement::{ExecuteResult, Statement},
    table::{Table, TableError},
};

pub const PROMPT: &str = "db > ";

#[derive(Debug, Error)]
pub enum ReplError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Line-oriented command loop over any reader/writer pair.
pub struct Repl<R, W> {
    table: Table,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(table: Table, input: R, output: W) -> Self {
        Self {
            table,
            input,
            output,
        }
    }

    /// Next trimmed line, `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<String>, io::Error> {
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        Ok(Some(buffer.trim().to_string()))
    }

    /// Runs until `.exit` or end of input. Storage errors end the loop.
    pub fn run(&mut self) -> Result<(), ReplError> {
        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }
            debug!("Read command {:?}", line);

            if line.starts_with('.') {
                match handle_meta_command(&line) {
                    Ok(MetaCommand::Exit) => return Ok(()),
                    Ok(MetaCommand::Help) => writeln!(self.output, "{}", HELP)?,
                    Err(err) => writeln!(self.output, "{}", err)?,
                }
                continue;
            }

            let statement = match Statement::prepare(&line) {
                Ok(statement) => statement,
                Err(err) => {
                    writeln!(self.output, "{}", err)?;
                    continue;
                }
            };
            match statement.execute(&mut self.table) {
                Ok(ExecuteResult::Inserted) => writeln!(self.output, "Executed.")?,
                Ok(ExecuteResult::Found(row)) => {
                    writeln!(self.output, "{}", row)?;
                    writeln!(self.output, "Executed.")?;
                }
                Ok(ExecuteResult::NotFound) => writeln!(self.output, "Row not found.")?,
                Err(TableError::DuplicateKey(_)) => {
                    writeln!(self.output, "Error: Duplicate key.")?
                }
                Err(err) => {
                    error!("Failed to execute {:?}: {}", line, err);
                    return Err(err.into());
                }
            }
        }
    }
}
