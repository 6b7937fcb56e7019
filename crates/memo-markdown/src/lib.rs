//! Markdown parsing and content facts for notes.
//!
//! This crate turns note text into a lossless [`Document`] tree and derives
//! [`Facts`] from it (tags, code, links, task lists). Inline syntax is handled
//! by an ordered list of [`Recognizer`]s keyed by trigger character, so the
//! set of constructs can be narrowed per parser without touching the scanner.
//!
//! ```
//! use memo_markdown_rs::analyze;
//!
//! let facts = analyze("Weekly review #work\n- [ ] send report\n");
//! assert!(facts.has_tag("work"));
//! assert!(facts.has_incomplete_tasks);
//! ```

use std::borrow::Cow;

mod ast;
mod block;
mod facts;
pub mod inline;
mod parser;

pub use ast::{Descendants, Document, Node, NodeId, NodeKind};
pub use block::MAX_BLOCK_DEPTH;
pub use facts::{analyze, extract_facts, Facts};
pub use inline::{is_tag_char, Match, Part, Recognizer, TagRecognizer, MAX_INLINE_DEPTH};
pub use parser::{parse, Parser, ParserConfig};

/// Converts raw note bytes to text, replacing each invalid UTF-8 sequence
/// with U+FFFD.
///
/// Valid input is borrowed unchanged.
pub fn sanitize_utf8(bytes: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        log::debug!("replaced invalid UTF-8 in {} byte input", bytes.len());
    }
    text
}
