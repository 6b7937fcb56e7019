use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod logging;
mod output;

use cli::Cli;
use commands::config::{load_config, Config};
use commands::{CommandContext, CommandError};
use dispatch::Dispatch;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let dispatch = Dispatch::from_cli(cli);

    let loaded = load_config();
    let configured_level = loaded
        .as_ref()
        .ok()
        .and_then(|config| config.log_level.as_deref());
    let level = logging::resolve_level(cli.verbose, cli.quiet, configured_level);
    // Keep the handle alive until the command finishes.
    let _logger = match logging::init_logging(level) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: could not start logging: {e}");
            None
        }
    };

    let config = match loaded {
        Ok(config) => config,
        Err(e) if dispatch.needs_config() => return Err(e),
        Err(e) => {
            log::warn!("{e}; using default settings");
            Config::default()
        }
    };

    let ctx = CommandContext::from_cli(cli, config);
    dispatch.execute(&ctx).await
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::NoteData { .. } => "NOTE_DATA_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
        CommandError::Worker(_) => "WORKER_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    ExitCode::from(exit_status(e))
}

fn exit_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Filter(_) => 1,
        CommandError::Config(_) => 5,
        CommandError::Io(_) => 3,
        CommandError::NoteData { .. } => 6,
        CommandError::Json(_) => 1,
        CommandError::Worker(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_query_rs::filter::compile;

    fn filter_error() -> CommandError {
        match compile("pined") {
            Err(e) => CommandError::Filter(e),
            Ok(_) => panic!("expected compile error"),
        }
    }

    fn note_data_error() -> CommandError {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        CommandError::NoteData {
            path: "notes.json".into(),
            source,
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code(&filter_error()), "FILTER_ERROR");
        assert_eq!(error_code(&CommandError::Config("x".into())), "CONFIG_ERROR");
        assert_eq!(
            error_code(&CommandError::Io(std::io::Error::other("x"))),
            "IO_ERROR"
        );
        assert_eq!(error_code(&note_data_error()), "NOTE_DATA_ERROR");
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&filter_error()), 1);
        assert_eq!(exit_status(&CommandError::Config("x".into())), 5);
        assert_eq!(exit_status(&CommandError::Io(std::io::Error::other("x"))), 3);
        assert_eq!(exit_status(&note_data_error()), 6);
    }

    #[test]
    fn test_note_data_message_names_file() {
        let message = note_data_error().to_string();
        assert!(message.starts_with("invalid note data in notes.json: "));
    }

    #[test]
    fn test_filter_error_message() {
        assert_eq!(
            filter_error().to_string(),
            "filter error: unknown field: pined (did you mean 'pinned'?)"
        );
    }
}
