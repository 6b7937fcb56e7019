//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/memo/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use memo_markdown_rs::{ParserConfig, Recognizer};
use memo_query_rs::query::SortKey;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};
use crate::logging::normalize_level;

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "MEMO_CONFIG";

const SORT_VALUES: [&str; 3] = ["created", "updated", "id"];
const TIME_FORMAT_VALUES: [&str; 3] = ["relative", "iso", "unix"];

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# memo configuration

# Config schema version (do not modify)
version = 1

# Log level: "error", "warn", "info", "debug" or "trace"
# log_level = "warn"

# Markdown parsing
[parser]
# tag_word_boundary = false  # Reject tags glued to a word, as in issue#12
# disabled = []              # Recognizers to turn off, e.g. ["url", "emphasis"]

# Output preferences
[output]
# color = true               # Enable colors (respects NO_COLOR env)
# time_format = "relative"   # "relative", "iso", "unix"

# Defaults for `memo filter`
[query]
# sort = "created"           # "created", "updated", "id"
# pinned_first = true
# limit = 50
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Log level used unless `--verbose` or `--quiet` is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Markdown parser settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Query defaults.
    #[serde(default)]
    pub query: QueryConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: None,
            parser: ParserConfig::default(),
            output: OutputConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// How timestamps are shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
}

/// Defaults for the filter command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Sort field: "created", "updated" or "id".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Put pinned notes first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_first: Option<bool>,

    /// Maximum number of notes to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl QueryConfig {
    /// The configured sort key, if it names one.
    ///
    /// An unknown name is logged and ignored.
    pub fn sort_key(&self) -> Option<SortKey> {
        let name = self.sort.as_deref()?;
        let key = sort_key(name);
        if key.is_none() {
            log::warn!("ignoring unknown sort '{name}' in query.sort");
        }
        key
    }
}

/// Maps a sort name to its key.
pub fn sort_key(name: &str) -> Option<SortKey> {
    match name {
        "created" => Some(SortKey::CreatedTs),
        "updated" => Some(SortKey::UpdatedTs),
        "id" => Some(SortKey::Id),
        _ => None,
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/memo/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            return Ok(parent.to_path_buf());
        }
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("memo"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("memo"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        log::debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        log::warn!(
            "config version {} is newer than supported version {}",
            config.version,
            CONFIG_VERSION
        );
    }

    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Writes the commented default config if no file exists yet.
///
/// Returns true if a file was created.
pub fn init_config() -> Result<bool> {
    let path = get_config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;
    Ok(true)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = &ctx.config;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if !path.exists() {
            println!("(No config file exists. Run 'memo config set <key> <value>' to create one.)");
            return Ok(());
        }

        println!("Settings:");
        if let Some(ref level) = config.log_level {
            println!("  log_level: {}", level);
        }

        println!("\n[parser]");
        println!("  tag_word_boundary: {}", config.parser.tag_word_boundary);
        if !config.parser.disabled.is_empty() {
            println!("  disabled: {}", config.parser.disabled.join(", "));
        }

        println!("\n[output]");
        if let Some(color) = config.output.color {
            println!("  color: {}", color);
        }
        if let Some(ref format) = config.output.time_format {
            println!("  time_format: {}", format);
        }

        println!("\n[query]");
        if let Some(ref sort) = config.query.sort {
            println!("  sort: {}", sort);
        }
        if let Some(pinned_first) = config.query.pinned_first {
            println!("  pinned_first: {}", pinned_first);
        }
        if let Some(limit) = config.query.limit {
            println!("  limit: {}", limit);
        }
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Applies one `key = value` setting to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let (section, field) = match key.split_once('.') {
        Some((section, field)) => (Some(section), field),
        None => (None, key),
    };

    match (section, field) {
        (None, "log_level") => {
            let level = normalize_level(value).map_err(CommandError::Config)?;
            config.log_level = Some(level.to_string());
        }
        (Some("parser"), "tag_word_boundary") => {
            config.parser.tag_word_boundary = parse_bool(value)?;
        }
        (Some("parser"), "disabled") => {
            config.parser.disabled = parse_recognizer_names(value)?;
        }
        (Some("output"), "color") => {
            config.output.color = Some(parse_bool(value)?);
        }
        (Some("output"), "time_format") => {
            validate_choice("time_format", value, &TIME_FORMAT_VALUES)?;
            config.output.time_format = Some(value.to_string());
        }
        (Some("query"), "sort") => {
            validate_choice("sort", value, &SORT_VALUES)?;
            config.query.sort = Some(value.to_string());
        }
        (Some("query"), "pinned_first") => {
            config.query.pinned_first = Some(parse_bool(value)?);
        }
        (Some("query"), "limit") => {
            let limit = value.parse::<usize>().map_err(|_| {
                CommandError::Config(format!("Invalid limit '{}'. Use a whole number", value))
            })?;
            config.query.limit = Some(limit);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: log_level, parser.tag_word_boundary, parser.disabled, output.color, output.time_format, query.sort, query.pinned_first, query.limit",
                key
            )));
        }
    }

    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    let path = get_config_path()?;

    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext) -> Result<()> {
    let created = init_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": if created { "created" } else { "exists" },
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        if created {
            println!("Created default config at: {}", path.display());
        } else {
            println!("Config already exists at: {}", path.display());
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

fn validate_choice(name: &str, value: &str, valid: &[&str]) -> Result<()> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(CommandError::Config(format!(
            "Invalid {} value '{}'. Valid values: {}",
            name,
            value,
            valid.join(", ")
        )))
    }
}

/// Parses a comma-separated list of recognizer names. An empty value
/// enables every recognizer.
fn parse_recognizer_names(value: &str) -> Result<Vec<String>> {
    let known: Vec<&str> = Recognizer::defaults().iter().map(Recognizer::name).collect();
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            if known.contains(&name) {
                Ok(name.to_string())
            } else {
                Err(CommandError::Config(format!(
                    "Unknown recognizer '{}'. Valid values: {}",
                    name,
                    known.join(", ")
                )))
            }
        })
        .collect()
}
