//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands that read markdown or notes files are async; config and
//! completions run synchronously.

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::facts::FactsOptions;
use crate::commands::filter::FilterOptions;
use crate::commands::parse::ParseOptions;
use crate::commands::tags::TagsOptions;
use crate::commands::{self, CommandContext, CommandError, Result};

/// A parsed command, ready to execute.
#[derive(Debug)]
pub enum Dispatch<'a> {
    Parse(ParseOptions),
    Facts(FactsOptions),
    Filter(FilterOptions),
    Tags(TagsOptions),
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> Dispatch<'a> {
    /// Creates the dispatch for the CLI command.
    pub fn from_cli(cli: &'a Cli) -> Self {
        match &cli.command {
            Some(Commands::Parse { file, text }) => Self::Parse(ParseOptions {
                file: file.clone(),
                show_text: *text,
            }),
            Some(Commands::Facts { files }) => Self::Facts(FactsOptions {
                files: files.clone(),
            }),
            Some(Commands::Filter {
                expression,
                notes,
                sort,
                reverse,
                no_pinned_first,
                limit,
                offset,
                now,
            }) => Self::Filter(FilterOptions {
                expression: expression.clone(),
                notes: notes.clone(),
                sort: *sort,
                reverse: *reverse,
                no_pinned_first: *no_pinned_first,
                limit: *limit,
                offset: *offset,
                now: *now,
            }),
            Some(Commands::Tags { notes }) => Self::Tags(TagsOptions {
                notes: notes.clone(),
            }),
            Some(Commands::Config { command }) => Self::Config(command),
            Some(Commands::Completions { shell }) => Self::Completions(shell),
            None => Self::Help,
        }
    }

    /// Whether the command needs a readable config file.
    ///
    /// The rest run on defaults when the config is broken, so `config path`
    /// and `config init` can still help fix it.
    pub fn needs_config(&self) -> bool {
        !matches!(
            self,
            Self::Config(Some(ConfigCommands::Path | ConfigCommands::Init))
                | Self::Completions(_)
                | Self::Help
        )
    }

    /// Executes the command.
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Parse(opts) => commands::parse::execute(ctx, opts).await,
            Self::Facts(opts) => commands::facts::execute(ctx, opts).await,
            Self::Filter(opts) => commands::filter::execute(ctx, opts).await,
            Self::Tags(opts) => commands::tags::execute(ctx, opts).await,
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("memo - markdown note parser and filter");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        Some(ConfigCommands::Init) => commands::config::execute_init(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn dispatch_of(args: &[&str]) -> (Cli, bool) {
        let cli = Cli::try_parse_from(args).unwrap();
        let needs = Dispatch::from_cli(&cli).needs_config();
        (cli, needs)
    }

    #[test]
    fn test_filter_options_carry_over() {
        let cli = Cli::try_parse_from([
            "memo", "f", "has_code", "-n", "n.json", "--offset", "4", "--reverse",
        ])
        .unwrap();
        match Dispatch::from_cli(&cli) {
            Dispatch::Filter(opts) => {
                assert_eq!(opts.expression.as_deref(), Some("has_code"));
                assert_eq!(opts.notes, PathBuf::from("n.json"));
                assert_eq!(opts.offset, 4);
                assert!(opts.reverse);
                assert!(!opts.no_pinned_first);
            }
            other => panic!("expected filter dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_options_carry_over() {
        let cli = Cli::try_parse_from(["memo", "parse", "a.md", "--text"]).unwrap();
        match Dispatch::from_cli(&cli) {
            Dispatch::Parse(opts) => {
                assert_eq!(opts.file, PathBuf::from("a.md"));
                assert!(opts.show_text);
            }
            other => panic!("expected parse dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_no_command_is_help() {
        let cli = Cli::try_parse_from(["memo"]).unwrap();
        assert!(matches!(Dispatch::from_cli(&cli), Dispatch::Help));
    }

    #[test]
    fn test_needs_config() {
        assert!(dispatch_of(&["memo", "tags", "-n", "n.json"]).1);
        assert!(dispatch_of(&["memo", "config"]).1);
        assert!(dispatch_of(&["memo", "config", "set", "query.limit", "3"]).1);
        assert!(!dispatch_of(&["memo", "config", "path"]).1);
        assert!(!dispatch_of(&["memo", "config", "init"]).1);
        assert!(!dispatch_of(&["memo", "completions", "bash"]).1);
        assert!(!dispatch_of(&["memo"]).1);
    }
}
