//! Logging setup for the CLI.
//!
//! Logs go to stderr so they never mix with command output on stdout.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Level used when neither flags nor config choose one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Normalizes a level name, accepting `warning` for `warn`.
pub fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

/// Picks the log level: `--verbose` and `--quiet` win over the config.
///
/// An unusable configured level falls back to the default.
pub fn resolve_level(verbose: bool, quiet: bool, configured: Option<&str>) -> &'static str {
    if verbose {
        return "debug";
    }
    if quiet {
        return "error";
    }
    configured
        .and_then(|level| normalize_level(level).ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Starts the stderr logger.
///
/// The returned handle must be kept alive for as long as logging is needed.
pub fn init_logging(level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(level)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), Ok("debug"));
        assert_eq!(normalize_level(" warning "), Ok("warn"));
        assert_eq!(normalize_level("off"), Ok("off"));
        assert!(normalize_level("loud").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        assert_eq!(resolve_level(true, false, Some("error")), "debug");
        assert_eq!(resolve_level(false, true, Some("trace")), "error");
    }

    #[test]
    fn test_configured_level() {
        assert_eq!(resolve_level(false, false, Some("info")), "info");
        assert_eq!(resolve_level(false, false, Some("bogus")), DEFAULT_LOG_LEVEL);
        assert_eq!(resolve_level(false, false, None), DEFAULT_LOG_LEVEL);
    }
}
