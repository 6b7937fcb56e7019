//! Tags command implementation.
//!
//! Counts manual and content tags across a notes file.

use std::path::PathBuf;
use std::sync::Arc;

use memo_query_rs::query::tag_counts;

use super::notes::load_analyzed_notes;
use super::{CommandContext, Result};
use crate::output::{format_tag_counts_json, format_tag_counts_table};

/// Options for the tags command.
#[derive(Debug)]
pub struct TagsOptions {
    /// JSON file holding an array of notes.
    pub notes: PathBuf,
}

/// Executes the tags command.
///
/// # Errors
///
/// Returns an error if the notes file cannot be read or is not a JSON array
/// of notes.
pub async fn execute(ctx: &CommandContext, opts: &TagsOptions) -> Result<()> {
    let parser = Arc::new(ctx.config.parser.build());
    let notes = load_analyzed_notes(&opts.notes, parser).await?;
    let counts = tag_counts(&notes);

    if ctx.json_output {
        println!("{}", format_tag_counts_json(&counts)?);
    } else if !ctx.quiet {
        print!("{}", format_tag_counts_table(&counts, ctx.use_colors));
    }

    Ok(())
}
