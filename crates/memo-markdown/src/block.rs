//! Block structure: splits the source into lines and groups them into
//! paragraphs, headings, fenced code blocks, lists and task items before the
//! inline scanner runs over the text-bearing parts.

use crate::ast::{NodeId, NodeKind, TreeBuilder};
use crate::inline::InlineScanner;

/// Maximum nesting of list items. Deeper items are read as paragraphs.
pub const MAX_BLOCK_DEPTH: usize = 32;

/// One source line as seen by the block level that owns it.
///
/// `start..content` is indentation already claimed by enclosing containers,
/// `content..end` is the text this level parses and `end..next` is the line
/// terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) start: usize,
    pub(crate) content: usize,
    pub(crate) end: usize,
    pub(crate) next: usize,
}

/// Splits `source` into lines, keeping `\n` or `\r\n` apart from the text.
pub(crate) fn split_lines(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = source.as_bytes();

    while start < bytes.len() {
        let (end, next) = match source[start..].find('\n') {
            Some(offset) => {
                let newline = start + offset;
                let end = if newline > start && bytes[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                };
                (end, newline + 1)
            }
            None => (bytes.len(), bytes.len()),
        };
        lines.push(Line {
            start,
            content: start,
            end,
            next,
        });
        start = next;
    }
    lines
}

/// A list item marker found at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListMarker {
    ordered: bool,
    /// Bytes from the line content to the item's text, including bullet,
    /// checkbox and the whitespace after them.
    prefix_len: usize,
    /// Column continuation lines must be indented to.
    content_column: usize,
    task: Option<bool>,
}

/// An opening code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fence {
    fence_char: u8,
    len: usize,
    language: Option<String>,
}

pub(crate) struct BlockParser<'a> {
    pub(crate) source: &'a str,
    pub(crate) inline: InlineScanner<'a>,
}

impl BlockParser<'_> {
    /// Parses `lines` as a sequence of blocks under `parent`.
    pub(crate) fn parse_blocks(&self, tree: &mut TreeBuilder, parent: NodeId, lines: &[Line], depth: usize) {
        let mut index = 0;
        while index < lines.len() {
            index = self.parse_block(tree, parent, lines, index, depth);
        }
    }

    /// Parses the block starting at `lines[index]` and returns the index of
    /// the first line after it.
    fn parse_block(&self, tree: &mut TreeBuilder, parent: NodeId, lines: &[Line], index: usize, depth: usize) -> usize {
        let line = lines[index];
        let text = self.content(&line);

        if is_blank(text) {
            tree.leaf(parent, NodeKind::BlankLine, line.start..line.next);
            return index + 1;
        }

        let indent = leading_indent(text);
        if indent.columns <= 3 {
            let body = &text[indent.bytes..];

            if let Some(fence) = fence_open(body) {
                return self.parse_code_block(tree, parent, lines, index, indent.bytes, fence);
            }
            if let Some(level) = heading_level(body) {
                self.parse_heading(tree, parent, line, indent.bytes, level);
                return index + 1;
            }
            if is_thematic_break(body) {
                self.emit_prefix(tree, parent, &line);
                tree.leaf(parent, NodeKind::ThematicBreak, line.content..line.end);
                tree.leaf(parent, NodeKind::LineBreak, line.end..line.next);
                return index + 1;
            }
            if depth < MAX_BLOCK_DEPTH {
                if let Some(marker) = list_marker(text) {
                    return self.parse_list(tree, parent, lines, index, marker.ordered, depth);
                }
            }
        }

        self.parse_paragraph(tree, parent, lines, index, depth)
    }

    fn content(&self, line: &Line) -> &str {
        &self.source[line.content..line.end]
    }

    fn emit_prefix(&self, tree: &mut TreeBuilder, parent: NodeId, line: &Line) {
        tree.leaf(parent, NodeKind::Marker, line.start..line.content);
    }

    fn starts_block(&self, line: &Line, depth: usize) -> bool {
        let text = self.content(line);
        if is_blank(text) {
            return true;
        }
        let indent = leading_indent(text);
        if indent.columns > 3 {
            return false;
        }
        let body = &text[indent.bytes..];
        fence_open(body).is_some()
            || heading_level(body).is_some()
            || is_thematic_break(body)
            || (depth < MAX_BLOCK_DEPTH && list_marker(text).is_some())
    }

    fn parse_paragraph(&self, tree: &mut TreeBuilder, parent: NodeId, lines: &[Line], index: usize, depth: usize) -> usize {
        let mut last = index + 1;
        while last < lines.len() && !self.starts_block(&lines[last], depth) {
            last += 1;
        }

        let paragraph = tree.push(parent, NodeKind::Paragraph, lines[index].start..lines[last - 1].next);
        for line in &lines[index..last] {
            self.emit_prefix(tree, paragraph, line);
            self.inline.scan(tree, paragraph, line.content..line.end, 0);
            tree.leaf(paragraph, NodeKind::LineBreak, line.end..line.next);
        }
        last
    }

    fn parse_heading(&self, tree: &mut TreeBuilder, parent: NodeId, line: Line, indent: usize, level: u8) {
        let heading = tree.push(parent, NodeKind::Heading { level }, line.start..line.next);
        self.emit_prefix(tree, heading, &line);

        let text = self.content(&line);
        let hashes = indent + usize::from(level);
        let marker_end = hashes
            + text[hashes..]
                .bytes()
                .take_while(|&b| b == b' ' || b == b'\t')
                .count();

        tree.leaf(heading, NodeKind::Marker, line.content..line.content + marker_end);
        self.inline
            .scan(tree, heading, line.content + marker_end..line.end, 0);
        tree.leaf(heading, NodeKind::LineBreak, line.end..line.next);
    }

    fn parse_code_block(
        &self,
        tree: &mut TreeBuilder,
        parent: NodeId,
        lines: &[Line],
        index: usize,
        indent: usize,
        fence: Fence,
    ) -> usize {
        let open = lines[index];
        let close = lines[index + 1..]
            .iter()
            .position(|line| fence_closes(self.content(line), &fence))
            .map(|offset| index + 1 + offset);
        let body_end = close.unwrap_or(lines.len());
        let last = close.unwrap_or(lines.len() - 1);

        let code: String = lines[index + 1..body_end]
            .iter()
            .map(|line| &self.source[line.content..line.next])
            .collect();
        let block = tree.push(
            parent,
            NodeKind::CodeBlock {
                language: fence.language,
                code,
            },
            open.start..lines[last].next,
        );
        self.emit_prefix(tree, block, &open);
        tree.leaf(block, NodeKind::Marker, open.content..open.next);

        for line in &lines[index + 1..body_end] {
            self.emit_prefix(tree, block, line);
            tree.leaf(block, NodeKind::Text, line.content..line.next);
        }
        match close {
            Some(close) => {
                let line = lines[close];
                self.emit_prefix(tree, block, &line);
                tree.leaf(block, NodeKind::Marker, line.content..line.next);
            }
            None => log::trace!("unterminated code fence at byte {}", open.start + indent),
        }
        last + 1
    }

    fn parse_list(
        &self,
        tree: &mut TreeBuilder,
        parent: NodeId,
        lines: &[Line],
        index: usize,
        ordered: bool,
        depth: usize,
    ) -> usize {
        let list = tree.push(parent, NodeKind::List { ordered }, lines[index].start..lines[index].next);
        let mut cursor = index;

        while cursor < lines.len() {
            let line = lines[cursor];
            let text = self.content(&line);
            let Some(marker) = list_marker(text).filter(|m| m.ordered == ordered) else {
                break;
            };
            if leading_indent(text).columns > 3 {
                break;
            }
            cursor = self.parse_item(tree, list, lines, cursor, marker, depth);
        }

        tree.close(list, lines[cursor - 1].next);
        cursor
    }

    fn parse_item(
        &self,
        tree: &mut TreeBuilder,
        list: NodeId,
        lines: &[Line],
        index: usize,
        marker: ListMarker,
        depth: usize,
    ) -> usize {
        let first = lines[index];
        let kind = match marker.task {
            Some(checked) => NodeKind::TaskListItem { checked },
            None => NodeKind::ListItem,
        };
        let item = tree.push(list, kind, first.start..first.next);
        self.emit_prefix(tree, item, &first);

        let body_start = first.content + marker.prefix_len;
        tree.leaf(item, NodeKind::Marker, first.content..body_start);

        let mut child_lines = Vec::new();
        if body_start < first.end {
            child_lines.push(Line {
                start: body_start,
                content: body_start,
                end: first.end,
                next: first.next,
            });
        }

        let mut cursor = index + 1;
        while cursor < lines.len() {
            let line = lines[cursor];
            let text = self.content(&line);
            if is_blank(text) {
                break;
            }
            let Some(stripped) = strip_columns(text, marker.content_column) else {
                break;
            };
            child_lines.push(Line {
                start: line.start,
                content: line.content + stripped,
                end: line.end,
                next: line.next,
            });
            cursor += 1;
        }

        // An item with nothing after its marker still owns its line break.
        if body_start >= first.end {
            tree.leaf(item, NodeKind::LineBreak, first.end..first.next);
        }
        self.parse_blocks(tree, item, &child_lines, depth + 1);

        tree.close(item, lines[cursor - 1].next);
        cursor
    }
}

/// Leading indentation of a line, in bytes and in columns (tab stop 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Indent {
    bytes: usize,
    columns: usize,
}

fn leading_indent(text: &str) -> Indent {
    let mut columns = 0;
    let mut bytes = 0;
    for b in text.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - columns % 4,
            _ => break,
        }
        bytes += 1;
    }
    Indent { bytes, columns }
}

/// Returns the number of bytes to strip so that `columns` of indentation are
/// removed, or `None` if the line is indented less than that.
fn strip_columns(text: &str, columns: usize) -> Option<usize> {
    let mut seen = 0;
    for (index, b) in text.bytes().enumerate() {
        if seen >= columns {
            return Some(index);
        }
        match b {
            b' ' => seen += 1,
            b'\t' => seen += 4 - seen % 4,
            _ => return None,
        }
    }
    (seen >= columns).then_some(text.len())
}

fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| b == b' ' || b == b'\t')
}

fn heading_level(body: &str) -> Option<u8> {
    let hashes = body.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match body.as_bytes().get(hashes) {
        None | Some(b' ') | Some(b'\t') => u8::try_from(hashes).ok(),
        Some(_) => None,
    }
}

fn is_thematic_break(body: &str) -> bool {
    let Some(first) = body.bytes().next().filter(|b| matches!(b, b'-' | b'*' | b'_')) else {
        return false;
    };
    let mut count = 0;
    for b in body.bytes() {
        if b == first {
            count += 1;
        } else if b != b' ' && b != b'\t' {
            return false;
        }
    }
    count >= 3
}

fn fence_open(body: &str) -> Option<Fence> {
    let fence_char = body.bytes().next().filter(|&b| b == b'`' || b == b'~')?;
    let len = body.bytes().take_while(|&b| b == fence_char).count();
    if len < 3 {
        return None;
    }

    let info = body[len..].trim();
    if fence_char == b'`' && info.contains('`') {
        return None;
    }
    let language = info
        .split_whitespace()
        .next()
        .map(str::to_string);

    Some(Fence {
        fence_char,
        len,
        language,
    })
}

fn fence_closes(text: &str, fence: &Fence) -> bool {
    let indent = leading_indent(text);
    if indent.columns > 3 {
        return false;
    }
    let body = &text[indent.bytes..];
    let len = body.bytes().take_while(|&b| b == fence.fence_char).count();
    len >= fence.len && is_blank(&body[len..])
}

fn list_marker(text: &str) -> Option<ListMarker> {
    let indent = leading_indent(text);
    let body = &text[indent.bytes..];
    let bytes = body.as_bytes();

    let (ordered, marker_len) = match bytes.first()? {
        b'-' | b'*' | b'+' => (false, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || !matches!(bytes.get(digits), Some(b'.') | Some(b')')) {
                return None;
            }
            (true, digits + 1)
        }
        _ => return None,
    };

    let after_marker = &body[marker_len..];
    let spaces = after_marker
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count();
    if spaces == 0 && !after_marker.is_empty() {
        return None;
    }

    let marker_column = indent.columns + marker_len;
    let content_column = if spaces == 0 || spaces > 4 {
        marker_column + 1
    } else {
        marker_column + spaces
    };

    let mut prefix_len = indent.bytes + marker_len + spaces;
    let mut task = None;
    let rest = &after_marker[spaces..];
    if let Some(checked) = checkbox(rest) {
        let trailing = rest[3..]
            .bytes()
            .take_while(|&b| b == b' ' || b == b'\t')
            .count();
        task = Some(checked);
        prefix_len += 3 + trailing;
    }

    Some(ListMarker {
        ordered,
        prefix_len,
        content_column,
        task,
    })
}

/// Reads `[ ]`, `[x]` or `[X]` followed by whitespace or the end of the line.
fn checkbox(rest: &str) -> Option<bool> {
    let bytes = rest.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'[' || bytes[2] != b']' {
        return None;
    }
    let checked = match bytes[1] {
        b' ' => false,
        b'x' | b'X' => true,
        _ => return None,
    };
    match bytes.get(3) {
        None | Some(b' ') | Some(b'\t') => Some(checked),
        Some(_) => None,
    }
}
