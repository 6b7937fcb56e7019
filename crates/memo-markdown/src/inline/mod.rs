//! Inline recognizers and the scanner that drives them.
//!
//! Each [`Recognizer`] is bound to one or more trigger characters. When the
//! scanner reaches a trigger it offers the rest of the line to the recognizers
//! registered for it, in list order. A recognizer either describes the
//! construct it found as a [`Match`] or declines; when every recognizer
//! declines, one character is consumed as literal text and scanning resumes at
//! the next character.

mod autolink;
mod code_span;
mod emphasis;
mod link;
mod tag;

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::ops::Range;

use crate::ast::{NodeId, NodeKind, TreeBuilder};

pub use tag::{is_tag_char, TagRecognizer};

/// Maximum nesting of inline containers (links inside emphasis inside ...).
///
/// Deeper content is kept as literal text.
pub const MAX_INLINE_DEPTH: usize = 16;

/// One piece of a matched construct, as a byte range relative to the start of
/// the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Syntax characters, emitted as a `Marker` leaf.
    Marker(Range<usize>),
    /// Content emitted verbatim as a `Text` leaf.
    Text(Range<usize>),
    /// Content scanned again for nested inline constructs.
    Inline(Range<usize>),
}

/// A construct recognized at the scanner's cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Node kind to emit. `NodeKind::Text` claims the bytes as literal text.
    pub kind: NodeKind,
    /// Number of bytes consumed, starting at the trigger.
    pub len: usize,
    /// Contiguous pieces covering `0..len`; empty for leaf kinds.
    pub parts: Vec<Part>,
}

impl Match {
    /// A leaf node covering `len` bytes.
    pub fn leaf(kind: NodeKind, len: usize) -> Self {
        Self {
            kind,
            len,
            parts: Vec::new(),
        }
    }

    /// Claims `len` bytes as literal text so they are not offered to the
    /// recognizers again.
    pub fn literal(len: usize) -> Self {
        Self::leaf(NodeKind::Text, len)
    }

    /// Returns true if this match only claims literal text.
    pub fn is_literal(&self) -> bool {
        self.kind == NodeKind::Text
    }
}

/// The closed set of inline recognizers a [`crate::Parser`] can be built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognizer {
    /// `` `code` ``.
    CodeSpan,
    /// `![alt](src "title")`.
    Image,
    /// `[label](destination "title")`.
    Link,
    /// `<scheme:...>` and `<user@host>`.
    AutoLink,
    /// Bare `http://`, `https://` and `www.` URLs.
    Url,
    /// `*em*`, `_em_`, `**strong**`, `__strong__`.
    Emphasis,
    /// `#tag`.
    Tag(TagRecognizer),
}

impl Recognizer {
    /// The recognizers a default parser is built with, in trigger order.
    pub fn defaults() -> Vec<Recognizer> {
        vec![
            Recognizer::CodeSpan,
            Recognizer::Image,
            Recognizer::Link,
            Recognizer::AutoLink,
            Recognizer::Url,
            Recognizer::Emphasis,
            Recognizer::Tag(TagRecognizer::default()),
        ]
    }

    /// Stable name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Recognizer::CodeSpan => "code_span",
            Recognizer::Image => "image",
            Recognizer::Link => "link",
            Recognizer::AutoLink => "autolink",
            Recognizer::Url => "url",
            Recognizer::Emphasis => "emphasis",
            Recognizer::Tag(_) => "tag",
        }
    }

    /// Characters that make the scanner offer input to this recognizer.
    pub fn triggers(&self) -> &'static [char] {
        match self {
            Recognizer::CodeSpan => &['`'],
            Recognizer::Image => &['!'],
            Recognizer::Link => &['['],
            Recognizer::AutoLink => &['<'],
            Recognizer::Url => &['h', 'w'],
            Recognizer::Emphasis => &['*', '_'],
            Recognizer::Tag(_) => &['#'],
        }
    }

    /// Tries to recognize a construct at the start of `input`.
    ///
    /// `input` is the unconsumed rest of the current line (or of the enclosing
    /// construct) and starts with one of [`Recognizer::triggers`]. `prev` is
    /// the character before the cursor, if any.
    pub fn recognize(&self, prev: Option<char>, input: &str) -> Option<Match> {
        self.recognize_in(prev, input, &ScanIndex::new(input))
    }

    /// Like [`Recognizer::recognize`], with `input` a suffix of the text
    /// `index` was built for.
    pub(crate) fn recognize_in(&self, prev: Option<char>, input: &str, index: &ScanIndex<'_>) -> Option<Match> {
        match self {
            Recognizer::CodeSpan => code_span::recognize(input, index),
            Recognizer::Image => link::recognize_image(input, index),
            Recognizer::Link => link::recognize_link(input, index),
            Recognizer::AutoLink => autolink::recognize_angle(input),
            Recognizer::Url => autolink::recognize_bare(prev, input),
            Recognizer::Emphasis => emphasis::recognize(prev, input, index),
            Recognizer::Tag(tag) => tag.recognize(prev, input),
        }
    }
}

/// Closer lookups shared by every recognizer call within one scanned range.
///
/// Each table is built by a single pass over the range the first time a
/// recognizer needs it. An opener with no closer ahead is then rejected
/// without rescanning the rest of the line, which keeps a line of unclosed
/// openers linear.
pub(crate) struct ScanIndex<'a> {
    text: &'a str,
    /// Backtick run length to the start of the last run of that length.
    code_runs: OnceCell<HashMap<usize, usize>>,
    /// `(delimiter, run length)` to the offset of the last run that closes.
    emphasis_closers: OnceCell<HashMap<(u8, usize), usize>>,
    brackets: OnceCell<link::Brackets>,
    /// Link tails keyed by destination end and whether the destination is empty.
    link_tails: RefCell<HashMap<(usize, bool), Option<link::Tail>>>,
}

impl<'a> ScanIndex<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            code_runs: OnceCell::new(),
            emphasis_closers: OnceCell::new(),
            brackets: OnceCell::new(),
            link_tails: RefCell::new(HashMap::new()),
        }
    }

    /// Byte offset of `input` within the indexed text.
    fn offset(&self, input: &str) -> usize {
        self.text.len() - input.len()
    }
}

/// Builds the trigger table for an ordered recognizer list.
pub(crate) fn trigger_table(recognizers: &[Recognizer]) -> HashMap<char, Vec<usize>> {
    let mut table: HashMap<char, Vec<usize>> = HashMap::new();
    for (index, recognizer) in recognizers.iter().enumerate() {
        for &trigger in recognizer.triggers() {
            table.entry(trigger).or_default().push(index);
        }
    }
    table
}

/// Walks text ranges of one source and emits inline nodes.
pub(crate) struct InlineScanner<'a> {
    pub(crate) source: &'a str,
    pub(crate) recognizers: &'a [Recognizer],
    pub(crate) triggers: &'a HashMap<char, Vec<usize>>,
}

impl InlineScanner<'_> {
    /// Scans `range` and appends the resulting nodes under `parent`.
    pub(crate) fn scan(
        &self,
        tree: &mut TreeBuilder,
        parent: NodeId,
        range: Range<usize>,
        depth: usize,
    ) {
        let end = range.end;
        let mut pos = range.start;
        let index = ScanIndex::new(&self.source[pos..end]);
        let mut text_start = pos;
        let mut prev = self.source[..pos].chars().next_back();

        'outer: while pos < end {
            let rest = &self.source[pos..end];
            let Some(c) = rest.chars().next() else {
                break;
            };

            if depth < MAX_INLINE_DEPTH {
                if let Some(candidates) = self.triggers.get(&c) {
                    for &candidate in candidates {
                        let Some(found) = self.recognizers[candidate].recognize_in(prev, rest, &index) else {
                            continue;
                        };
                        let len = found.len;
                        if len == 0 || !rest.is_char_boundary(len) {
                            continue;
                        }

                        // Literal claims stay in the pending text run.
                        if !found.is_literal() {
                            tree.leaf(parent, NodeKind::Text, text_start..pos);
                            self.emit(tree, parent, pos, found, depth);
                            text_start = pos + len;
                        }
                        pos += len;
                        prev = self.source[..pos].chars().next_back();
                        continue 'outer;
                    }
                }
            }

            pos += c.len_utf8();
            prev = Some(c);
        }

        tree.leaf(parent, NodeKind::Text, text_start..end);
    }

    fn emit(&self, tree: &mut TreeBuilder, parent: NodeId, start: usize, found: Match, depth: usize) {
        let span = start..start + found.len;
        let node = tree.push(parent, found.kind, span);

        for part in found.parts {
            match part {
                Part::Marker(r) => tree.leaf(node, NodeKind::Marker, start + r.start..start + r.end),
                Part::Text(r) => tree.leaf(node, NodeKind::Text, start + r.start..start + r.end),
                Part::Inline(r) => self.scan(tree, node, start + r.start..start + r.end, depth + 1),
            }
        }
    }
}
