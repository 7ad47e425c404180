use std::{env, io, process::ExitCode};

use btree_db::{repl::Repl, table::Table};
use log::{error, info};

const DEFAULT_DB_PATH: &str = "my.db";

fn main() -> ExitCode {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    info!("Opening database {}", path);

    let table = match Table::open(&path) {
        Ok(table) => table,
        Err(err) => {
            error!("Failed to open {}: {}", path, err);
            eprintln!("Error: could not open {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut repl = Repl::new(table, io::stdin().lock(), io::stdout());
    match repl.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
