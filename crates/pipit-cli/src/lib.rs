//! pipit command-line components.
//!
//! The binary is in `main.rs`; everything here is shared with the tests.

pub mod cli;
pub mod commands;
pub mod help;
pub mod logging;
pub mod process;
pub mod report;

pub use cli::{Cli, Command};
