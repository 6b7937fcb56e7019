//! Facts command implementation.
//!
//! Prints the tags and content flags of markdown files.

use std::path::PathBuf;
use std::sync::Arc;

use super::notes::analyze_files;
use super::{CommandContext, Result};
use crate::output::{format_facts_json, format_facts_table};

/// Options for the facts command.
#[derive(Debug)]
pub struct FactsOptions {
    /// Markdown files to analyze.
    pub files: Vec<PathBuf>,
}

/// Executes the facts command.
///
/// Files are read and analyzed concurrently; output follows argument order.
///
/// # Errors
///
/// Returns an error if any file cannot be read.
pub async fn execute(ctx: &CommandContext, opts: &FactsOptions) -> Result<()> {
    let parser = Arc::new(ctx.config.parser.build());
    let results = analyze_files(&opts.files, parser).await?;

    if ctx.json_output {
        println!("{}", format_facts_json(&results)?);
    } else if !ctx.quiet {
        print!("{}", format_facts_table(&results, ctx.use_colors));
    }

    Ok(())
}
