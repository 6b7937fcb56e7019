//! Output formatting utilities for the memo CLI.
//!
//! Every command prints either a human-readable table or pretty JSON:
//!
//! - [`document`] - Document trees (parse)
//! - [`facts`] - Per-file facts and tag counts (facts, tags)
//! - [`notes`] - Note lists (filter)
//! - [`helpers`] - Common formatting utilities (timestamps, truncation, tags)

mod document;
mod facts;
pub mod helpers;
mod notes;

pub use document::{format_document_json, format_document_outline};
pub use facts::{
    format_facts_json, format_facts_table, format_tag_counts_json, format_tag_counts_table,
};
pub use notes::{format_notes_json, format_notes_table};
