//! CLI argument definitions using clap
//!
//! Commands:
//! - rotabot init-config --config <path>
//! - rotabot serve --config <path>
//! - rotabot routes list|get|search --config <path>
//! - rotabot backup --config <path>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::routes::RouteField;

/// rotabot - school bus route registry behind a chat bot
#[derive(Parser, Debug)]
#[command(name = "rotabot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a config file with every default filled in
    InitConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./rotabot.json")]
        config: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run the bot over the console transport (JSON lines on stdin/stdout)
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./rotabot.json")]
        config: PathBuf,
    },

    /// Read the route spreadsheet
    Routes {
        /// Path to configuration file
        #[arg(long, default_value = "./rotabot.json")]
        config: PathBuf,

        #[command(subcommand)]
        action: RoutesAction,
    },

    /// Copy the route spreadsheet to the backup directory
    Backup {
        /// Path to configuration file
        #[arg(long, default_value = "./rotabot.json")]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoutesAction {
    /// Print every route
    List,

    /// Print one route by number
    Get {
        /// Route number
        number: String,
    },

    /// Substring search on one field
    Search {
        #[arg(value_enum)]
        field: SearchField,

        /// Text to look for, case-insensitive
        query: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchField {
    Driver,
    Monitor,
    Company,
}

impl From<SearchField> for RouteField {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Driver => RouteField::Driver,
            SearchField::Monitor => RouteField::Monitor,
            SearchField::Company => RouteField::Company,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
