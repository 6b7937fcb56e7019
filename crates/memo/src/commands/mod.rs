//! Command implementations for the memo CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod completions;
pub mod config;
pub mod facts;
pub mod filter;
pub mod notes;
pub mod parse;
pub mod tags;

use std::path::PathBuf;

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter compilation error.
    #[error("filter error: {0}")]
    Filter(#[from] memo_query_rs::filter::FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A notes file that is not a JSON array of note records.
    #[error("invalid note data in {}: {source}", path.display())]
    NoteData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background parsing task failed.
    #[error("worker error: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Settings loaded from the config file.
    pub config: Config,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments and the loaded config.
    ///
    /// Colors are on unless `--no-color` is given, the config turns them off,
    /// or `NO_COLOR` is set.
    pub fn from_cli(cli: &Cli, config: Config) -> Self {
        let color_allowed = config.output.color.unwrap_or(true) && std::env::var_os("NO_COLOR").is_none();
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && color_allowed,
            quiet: cli.quiet,
            verbose: cli.verbose,
            config,
        }
    }
}
