//! Note records, typed filter expressions and queries over analyzed notes.
//!
//! Notes are analyzed once with [`AnalyzedNote::analyze`], which parses their
//! content and keeps the resulting [`memo_markdown_rs::Facts`] next to the
//! stored fields. Filters written against those fields are compiled by
//! [`filter::FilterParser`] and run by [`query::NoteQuery`].

pub mod filter;
mod note;
pub mod query;

pub use note::{notes_from_json, AnalyzedNote, Note, NoteAttributes, Visibility};
