//! Parse command implementation.
//!
//! Prints the document tree of one markdown file.

use std::path::PathBuf;

use super::notes::read_text;
use super::{CommandContext, Result};
use crate::output::{format_document_json, format_document_outline};

/// Options for the parse command.
#[derive(Debug)]
pub struct ParseOptions {
    /// Markdown file to parse.
    pub file: PathBuf,
    /// Show leaf source text in the outline.
    pub show_text: bool,
}

/// Executes the parse command.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn execute(ctx: &CommandContext, opts: &ParseOptions) -> Result<()> {
    let source = read_text(&opts.file).await?;
    let document = ctx.config.parser.build().parse(&source);
    log::debug!("parsed {} into {} nodes", opts.file.display(), document.len());

    if ctx.json_output {
        println!("{}", format_document_json(&document, &source)?);
    } else if !ctx.quiet {
        print!(
            "{}",
            format_document_outline(&document, &source, opts.show_text, ctx.use_colors)
        );
    }

    Ok(())
}
