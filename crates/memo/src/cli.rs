//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the memo CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// memo - parse, analyze and filter markdown notes
#[derive(Parser, Debug)]
#[command(name = "memo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the document tree of a markdown file
    #[command(alias = "p")]
    Parse {
        /// Markdown file to parse
        file: PathBuf,

        /// Show the source text of every leaf
        #[arg(long)]
        text: bool,
    },

    /// Print the tags, code, link and task facts of markdown files
    Facts {
        /// Markdown files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Filter notes with an expression
    #[command(alias = "f")]
    Filter {
        /// Filter expression (e.g., '"work" in tags && !pinned')
        expression: Option<String>,

        /// JSON file holding an array of notes
        #[arg(short, long)]
        notes: PathBuf,

        /// Sort by field
        #[arg(long, value_enum)]
        sort: Option<SortField>,

        /// Oldest first instead of newest first
        #[arg(long)]
        reverse: bool,

        /// Do not put pinned notes first
        #[arg(long)]
        no_pinned_first: bool,

        /// Maximum number of notes to show
        #[arg(long)]
        limit: Option<usize>,

        /// Number of matching notes to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Evaluate now() at this Unix timestamp instead of the current time
        #[arg(long, allow_negative_numbers = true)]
        now: Option<i64>,
    },

    /// Count tags across notes
    #[command(alias = "t")]
    Tags {
        /// JSON file holding an array of notes
        #[arg(short, long)]
        notes: PathBuf,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Sort fields for the filter command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Created,
    Updated,
    Id,
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration (default)
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., parser.tag_word_boundary)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,

    /// Write a commented default config file if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_filter_command() {
        let cli = Cli::try_parse_from([
            "memo",
            "filter",
            "pinned",
            "--notes",
            "notes.json",
            "--sort",
            "updated",
            "--limit",
            "5",
            "--now",
            "-100",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Filter {
                expression,
                notes,
                sort,
                limit,
                offset,
                now,
                reverse,
                ..
            }) => {
                assert_eq!(expression.as_deref(), Some("pinned"));
                assert_eq!(notes, PathBuf::from("notes.json"));
                assert_eq!(sort, Some(SortField::Updated));
                assert_eq!(limit, Some(5));
                assert_eq!(offset, 0);
                assert_eq!(now, Some(-100));
                assert!(!reverse);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_filter_expression_is_optional() {
        let cli = Cli::try_parse_from(["memo", "filter", "--notes", "n.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Filter {
                expression: None,
                ..
            })
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["memo", "facts", "a.md", "--json", "--no-color"]).unwrap();
        assert!(cli.json);
        assert!(cli.no_color);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["memo", "-v", "-q", "tags", "-n", "n.json"]).is_err());
    }

    #[test]
    fn test_facts_requires_a_file() {
        assert!(Cli::try_parse_from(["memo", "facts"]).is_err());
    }
}
