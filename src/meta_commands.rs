use thiserror::Error;

pub const HELP: &str = "\
commands:
  insert <id> <username> <email>  insert a new row
  select <id>                     print the row with <id>
  .help                           print this help
  .exit                           quit";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MetaCommand {
    Exit,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetaCommandError {
    #[error("Unrecognized command '{0}'.")]
    UnrecognizedCommand(String),
}

pub fn handle_meta_command(input: &str) -> Result<MetaCommand, MetaCommandError> {
    match input {
        ".exit" => Ok(MetaCommand::Exit),
        ".help" => Ok(MetaCommand::Help),
        _ => Err(MetaCommandError::UnrecognizedCommand(input.to_string())),
    }
}
