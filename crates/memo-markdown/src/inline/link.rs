//! Inline links `[label](destination "title")` and images `![alt](src)`.

use std::collections::HashMap;
use std::ops::Range;

use super::{Match, Part, ScanIndex};
use crate::ast::NodeKind;

/// Reads a link whose `[` is at the start of `input`.
pub(crate) fn recognize_link(input: &str, index: &ScanIndex<'_>) -> Option<Match> {
    if !input.starts_with('[') {
        return None;
    }
    let target = parse_target(input, 1, index)?;
    Some(target.into_match(1, |destination, title| NodeKind::Link { destination, title }))
}

/// Reads an image whose `![` is at the start of `input`.
pub(crate) fn recognize_image(input: &str, index: &ScanIndex<'_>) -> Option<Match> {
    if !input.starts_with("![") {
        return None;
    }
    let target = parse_target(input, 2, index)?;
    Some(target.into_match(2, |destination, title| NodeKind::Image { destination, title }))
}

/// The pieces of a bracketed label followed by a parenthesized target.
struct Target {
    /// Byte offset of the `]` closing the label.
    label_end: usize,
    /// Total length, through the closing `)`.
    len: usize,
    destination: String,
    title: Option<String>,
}

impl Target {
    fn into_match(self, open_len: usize, kind: impl FnOnce(String, Option<String>) -> NodeKind) -> Match {
        let mut parts = vec![Part::Marker(0..open_len)];
        if self.label_end > open_len {
            parts.push(Part::Inline(open_len..self.label_end));
        }
        parts.push(Part::Marker(self.label_end..self.len));

        Match {
            kind: kind(self.destination, self.title),
            len: self.len,
            parts,
        }
    }
}

/// What follows a destination: an optional title, then `)`.
///
/// Offsets are relative to the indexed text.
#[derive(Debug, Clone)]
pub(super) struct Tail {
    /// Title text between the quotes.
    title: Option<Range<usize>>,
    /// Offset of the closing `)`.
    close: usize,
}

fn parse_target(input: &str, label_start: usize, index: &ScanIndex<'_>) -> Option<Target> {
    let text = index.text;
    let base = index.offset(input);
    let brackets = index.brackets.get_or_init(|| Brackets::build(text));

    let label_end = brackets.label_end(base + label_start - 1)? - base;
    if !input[label_end + 1..].starts_with('(') {
        return None;
    }

    let dest_start = skip_spaces(text, base + label_end + 2);
    let (dest_end, angle) = if let Some(inner) = text[dest_start..].strip_prefix('<') {
        let close = inner.find(|c: char| c == '>' || c == '<')?;
        if !inner[close..].starts_with('>') {
            return None;
        }
        (dest_start + close + 2, true)
    } else {
        (brackets.destination_end(dest_start)?, false)
    };

    let tail = index
        .link_tails
        .borrow_mut()
        .entry((dest_end, dest_end == dest_start))
        .or_insert_with(|| read_tail(text, dest_end, dest_end == dest_start))
        .clone()?;

    // Strings are only built once the whole target is known to match.
    let raw = &text[dest_start..dest_end];
    let destination = if angle {
        raw[1..raw.len() - 1].to_string()
    } else {
        unescape_destination(raw)
    };
    Some(Target {
        label_end,
        len: tail.close + 1 - base,
        destination,
        title: tail.title.map(|range| unescape_title(&text[range])),
    })
}

/// Bracket and parenthesis structure of one scanned range.
pub(super) struct Brackets {
    /// `[` offset to the offset of the `]` that balances it.
    label_ends: HashMap<usize, usize>,
    /// Unescaped parentheses with the nesting depth after each, in order.
    parens: Vec<(usize, i64)>,
    /// Offsets of unescaped `)`, grouped by the depth after them.
    closes: HashMap<i64, Vec<usize>>,
    /// Characters that end an unbracketed destination, and whether the
    /// destination is still valid when it ends there.
    stops: Vec<(usize, bool)>,
}

impl Brackets {
    fn build(text: &str) -> Self {
        let mut brackets = Self {
            label_ends: label_ends(text),
            parens: Vec::new(),
            closes: HashMap::new(),
            stops: Vec::new(),
        };

        let mut depth = 0i64;
        let mut chars = text.char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            match c {
                ' ' | '\t' => brackets.stops.push((offset, true)),
                '(' => {
                    depth += 1;
                    brackets.parens.push((offset, depth));
                }
                ')' => {
                    depth -= 1;
                    brackets.parens.push((offset, depth));
                    brackets.closes.entry(depth).or_default().push(offset);
                }
                '\\' => {
                    if chars.peek().is_some_and(|&(_, next)| next.is_ascii_punctuation()) {
                        chars.next();
                    }
                }
                c if c.is_control() => brackets.stops.push((offset, false)),
                _ => {}
            }
        }
        brackets
    }

    fn label_end(&self, open: usize) -> Option<usize> {
        self.label_ends.get(&open).copied()
    }

    /// End of an unbracketed destination starting at `start`: the `)` that
    /// closes the target or the first space, whichever comes first.
    fn destination_end(&self, start: usize) -> Option<usize> {
        let before = self.parens.partition_point(|&(at, _)| at < start);
        let depth = before.checked_sub(1).map_or(0, |last| self.parens[last].1);
        let close = self.closes.get(&(depth - 1)).and_then(|closes| {
            closes.get(closes.partition_point(|&at| at < start)).copied()
        });
        let stop = self.stops.get(self.stops.partition_point(|&(at, _)| at < start)).copied();

        match (close, stop) {
            (Some(close), stop) if stop.map_or(true, |(at, _)| close < at) => Some(close),
            (_, Some((at, valid))) => valid.then_some(at),
            _ => None,
        }
    }
}

/// Pairs every `[` in `text` with the `]` that balances it.
///
/// A backslash hides the character after it. An escaped `[` can still start
/// a label, so it is paired too without changing the depth.
fn label_ends(text: &str) -> HashMap<usize, usize> {
    let mut events = Vec::new();
    let mut depth = 0i64;
    let mut chars = text.char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((escaped, '[')) = chars.next() {
                    events.push((escaped, true, depth));
                }
            }
            '[' => {
                depth += 1;
                events.push((offset, true, depth));
            }
            ']' => {
                depth -= 1;
                events.push((offset, false, depth));
            }
            _ => {}
        }
    }

    // Walking backwards, `nearest[d]` is the next `]` that leaves depth `d`.
    let mut nearest: HashMap<i64, usize> = HashMap::new();
    let mut ends = HashMap::new();
    for &(offset, open, depth) in events.iter().rev() {
        if open {
            if let Some(&end) = nearest.get(&(depth - 1)) {
                ends.insert(offset, end);
            }
        } else {
            nearest.insert(depth, offset);
        }
    }
    ends
}

fn skip_spaces(s: &str, from: usize) -> usize {
    from + s[from..]
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count()
}

fn read_tail(text: &str, at: usize, empty_destination: bool) -> Option<Tail> {
    let mut cursor = skip_spaces(text, at);
    let mut title = None;
    if cursor > at || empty_destination {
        if let Some(len) = title_len(&text[cursor..]) {
            title = Some(cursor + 1..cursor + len - 1);
            cursor = skip_spaces(text, cursor + len);
        }
    }
    text[cursor..].starts_with(')').then_some(Tail { title, close: cursor })
}

/// Length of a quoted title at the start of `s`, quotes included.
fn title_len(s: &str) -> Option<usize> {
    let quote = s.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let mut chars = s.char_indices().skip(1);
    while let Some((offset, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(offset + 1);
        }
    }
    None
}

fn unescape_title(raw: &str) -> String {
    let mut title = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            title.extend(chars.next());
        } else {
            title.push(c);
        }
    }
    title
}

/// Resolves backslash escapes of ASCII punctuation; other backslashes stay.
fn unescape_destination(raw: &str) -> String {
    let mut destination = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next_if(char::is_ascii_punctuation) {
                destination.push(escaped);
                continue;
            }
        }
        destination.push(c);
    }
    destination
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize_link(input: &str) -> Option<Match> {
        super::recognize_link(input, &ScanIndex::new(input))
    }

    fn recognize_image(input: &str) -> Option<Match> {
        super::recognize_image(input, &ScanIndex::new(input))
    }

    fn link_parts(found: &Match) -> (&str, Option<&str>) {
        match &found.kind {
            NodeKind::Link { destination, title } | NodeKind::Image { destination, title } => {
                (destination.as_str(), title.as_deref())
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_simple_link() {
        let input = "[memos](https://usememos.com) rest";
        let found = recognize_link(input).unwrap();
        assert_eq!(found.len, 29);
        assert_eq!(link_parts(&found), ("https://usememos.com", None));
        assert_eq!(
            found.parts,
            vec![Part::Marker(0..1), Part::Inline(1..6), Part::Marker(6..29)]
        );
    }

    #[test]
    fn test_link_with_title() {
        let found = recognize_link(r#"[a](/b "The B")"#).unwrap();
        assert_eq!(link_parts(&found), ("/b", Some("The B")));
        assert_eq!(found.len, 15);
    }

    #[test]
    fn test_link_with_angle_destination() {
        let found = recognize_link("[a](<with space>)").unwrap();
        assert_eq!(link_parts(&found), ("with space", None));
    }

    #[test]
    fn test_link_with_balanced_parens_in_destination() {
        let found = recognize_link("[wiki](https://en.wikipedia.org/wiki/Rust_(language))").unwrap();
        assert_eq!(
            link_parts(&found),
            ("https://en.wikipedia.org/wiki/Rust_(language)", None)
        );
    }

    #[test]
    fn test_nested_brackets_in_label() {
        let found = recognize_link("[a [b] c](x)").unwrap();
        assert_eq!(found.parts[1], Part::Inline(1..8));
    }

    #[test]
    fn test_empty_label() {
        let found = recognize_link("[](x)").unwrap();
        assert_eq!(found.parts, vec![Part::Marker(0..1), Part::Marker(1..5)]);
    }

    #[test]
    fn test_empty_destination() {
        let found = recognize_link("[a]()").unwrap();
        assert_eq!(link_parts(&found), ("", None));
    }

    #[test]
    fn test_missing_target_declines() {
        assert!(recognize_link("[x] not a link").is_none());
        assert!(recognize_link("[unclosed").is_none());
        assert!(recognize_link("[a](no-close").is_none());
        assert!(recognize_link("[a](b c d)").is_none());
    }

    #[test]
    fn test_image() {
        let found = recognize_image("![cat](cat.png)").unwrap();
        assert!(matches!(found.kind, NodeKind::Image { .. }));
        assert_eq!(found.parts[0], Part::Marker(0..2));
        assert_eq!(link_parts(&found), ("cat.png", None));
    }

    #[test]
    fn test_bang_without_bracket_declines() {
        assert!(recognize_image("!important").is_none());
    }

    #[test]
    fn test_escaped_bracket_does_not_close_label() {
        let found = recognize_link(r"[a \] b](x)").unwrap();
        assert_eq!(found.parts[1], Part::Inline(1..7));
        assert_eq!(found.len, 11);

        let text = r"\[a](b)";
        let found = super::recognize_link(&text[1..], &ScanIndex::new(text)).unwrap();
        assert_eq!(link_parts(&found), ("b", None));
    }

    #[test]
    fn test_escaped_paren_in_destination() {
        let found = recognize_link(r"[a](x\)y)").unwrap();
        assert_eq!(link_parts(&found), ("x)y", None));
    }

    #[test]
    fn test_only_innermost_target_closes() {
        let text = "[a](x[b](y[c](z) w";
        let index = ScanIndex::new(text);
        assert!(super::recognize_link(text, &index).is_none());
        assert!(super::recognize_link(&text[5..], &index).is_none());
        let found = super::recognize_link(&text[10..], &index).unwrap();
        assert_eq!(found.len, 6);
        assert_eq!(link_parts(&found), ("z", None));
    }

    #[test]
    fn test_unclosed_title_declines() {
        let text = r#"[a](x "never [b](x "never"#;
        let index = ScanIndex::new(text);
        assert!(super::recognize_link(text, &index).is_none());
        assert!(super::recognize_link(&text[13..], &index).is_none());
    }
}
