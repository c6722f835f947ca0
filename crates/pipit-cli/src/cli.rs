//! Command-line surface

use crate::help;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "pipit", version)]
#[command(about = "Yet another Python dependency manager.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Settings file to use instead of ~/.pipit/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    #[command(about = "Create a new virtual environment.")]
    New {
        #[arg(help = "Where to install the environment.")]
        path: Option<PathBuf>,

        #[arg(short, long, value_name = "PYTHON", help = "The Python interpreter to use.")]
        python: Option<String>,
    },

    #[command(about = "Install packages and dependencies.")]
    Install {
        #[arg(help = "A list of packages to install.")]
        packages: Vec<String>,

        #[arg(short, long, help = "Install development packages or dependencies.")]
        dev: bool,
    },

    #[command(about = "Uninstall packages and dependencies.")]
    Uninstall {
        #[arg(required = true, help = "A list of packages to uninstall.")]
        packages: Vec<String>,
    },

    #[command(about = "Update installed PyPI dependencies.")]
    Update {
        #[arg(help = "A list of packages to update.")]
        packages: Vec<String>,
    },

    #[command(about = "List installed packages.")]
    List,

    #[command(about = "List outdated packages.")]
    Outdated,
}

/// The full command tree with translated help
pub fn command() -> clap::Command {
    help::localize(Cli::command())
}

/// Parse arguments against the localized command tree
pub fn try_parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Cli::from_arg_matches(&matches)
}

/// Parse the process arguments, exiting on `--help`, `--version` or a usage error
pub fn parse() -> Cli {
    try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}
