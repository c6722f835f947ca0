//! pipit - Yet another Python dependency manager.

use pipit_cli::{cli, commands, logging, report};
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::init();

    let cli = cli::parse();
    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report::report(&err),
    }
}
