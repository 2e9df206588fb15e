//! CLI module for rotabot
//!
//! Provides command-line interface for:
//! - init-config: write a config file with defaults
//! - serve: run the bot over stdin/stdout
//! - routes: one-shot route queries
//! - backup: one-shot spreadsheet backup

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RoutesAction, SearchField};
pub use commands::{backup, init_config, routes, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
