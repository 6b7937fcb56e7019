//! `*emphasis*`, `_emphasis_`, `**strong**` and `__strong__`.

use std::collections::HashMap;

use super::{Match, Part, ScanIndex};
use crate::ast::NodeKind;

pub(crate) fn recognize(prev: Option<char>, input: &str, index: &ScanIndex<'_>) -> Option<Match> {
    let delimiter = input.bytes().next().filter(|&b| b == b'*' || b == b'_')?;
    let bytes = input.as_bytes();
    let run = run_length(bytes, 0, delimiter);

    if run > 2 {
        return Some(Match::literal(run));
    }

    // Intraword underscores (snake_case) never open emphasis.
    if delimiter == b'_' && prev.is_some_and(char::is_alphanumeric) {
        return Some(Match::literal(run));
    }

    match input[run..].chars().next() {
        Some(c) if !c.is_whitespace() => {}
        _ => return Some(Match::literal(run)),
    }

    let from = index.offset(input) + run;
    let closers = index.emphasis_closers.get_or_init(|| last_closers(index.text));
    if !closers.get(&(delimiter, run)).is_some_and(|&at| at > from) {
        return Some(Match::literal(run));
    }

    let mut index = run + 1;
    while index < bytes.len() {
        if bytes[index] != delimiter {
            index += 1;
            continue;
        }

        let closing = run_length(bytes, index, delimiter);
        if closing == run && closes(input, index, closing, delimiter) {
            let len = index + run;
            let kind = if run == 1 {
                NodeKind::Emphasis
            } else {
                NodeKind::Strong
            };
            return Some(Match {
                kind,
                len,
                parts: vec![
                    Part::Marker(0..run),
                    Part::Inline(run..index),
                    Part::Marker(index..len),
                ],
            });
        }
        index += closing;
    }

    Some(Match::literal(run))
}

/// Offset of the last run of each delimiter and length (1 or 2) in `text`
/// that can close emphasis.
fn last_closers(text: &str) -> HashMap<(u8, usize), usize> {
    let bytes = text.as_bytes();
    let mut closers = HashMap::new();
    let mut index = 0;
    while index < bytes.len() {
        let delimiter = bytes[index];
        if delimiter != b'*' && delimiter != b'_' {
            index += 1;
            continue;
        }
        let run = run_length(bytes, index, delimiter);
        if run <= 2 && closes(text, index, run, delimiter) {
            closers.insert((delimiter, run), index);
        }
        index += run;
    }
    closers
}

/// Returns true if the `len` delimiters at `index` follow a non-space and,
/// for underscores, are not followed by a word character.
fn closes(text: &str, index: usize, len: usize, delimiter: u8) -> bool {
    let before = text[..index].chars().next_back();
    let after = text[index + len..].chars().next();
    before.is_some_and(|c| !c.is_whitespace())
        && (delimiter == b'*' || !after.is_some_and(char::is_alphanumeric))
}

fn run_length(bytes: &[u8], from: usize, delimiter: u8) -> usize {
    bytes[from..].iter().take_while(|&&b| b == delimiter).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize(prev: Option<char>, input: &str) -> Option<Match> {
        super::recognize(prev, input, &ScanIndex::new(input))
    }

    #[test]
    fn test_single_star_emphasis() {
        let found = recognize(None, "*hi* there").unwrap();
        assert_eq!(found.kind, NodeKind::Emphasis);
        assert_eq!(found.len, 4);
        assert_eq!(
            found.parts,
            vec![Part::Marker(0..1), Part::Inline(1..3), Part::Marker(3..4)]
        );
    }

    #[test]
    fn test_strong() {
        let found = recognize(None, "**bold** x").unwrap();
        assert_eq!(found.kind, NodeKind::Strong);
        assert_eq!(found.len, 8);
    }

    #[test]
    fn test_strong_skips_single_delimiter_inside() {
        let found = recognize(None, "**a *b* c**").unwrap();
        assert_eq!(found.kind, NodeKind::Strong);
        assert_eq!(found.len, 11);
    }

    #[test]
    fn test_underscore_emphasis() {
        let found = recognize(Some(' '), "_word_.").unwrap();
        assert_eq!(found.kind, NodeKind::Emphasis);
        assert_eq!(found.len, 6);
    }

    #[test]
    fn test_intraword_underscore_is_literal() {
        let found = recognize(Some('e'), "_case_name").unwrap();
        assert!(found.is_literal());
    }

    #[test]
    fn test_underscore_closer_inside_word_not_accepted() {
        let found = recognize(None, "_snake_case").unwrap();
        assert!(found.is_literal());
    }

    #[test]
    fn test_space_after_opener_is_literal() {
        let found = recognize(None, "* not emphasis*").unwrap();
        assert!(found.is_literal());
        assert_eq!(found.len, 1);
    }

    #[test]
    fn test_space_before_closer_not_accepted() {
        let found = recognize(None, "*a *").unwrap();
        assert!(found.is_literal());
    }

    #[test]
    fn test_unclosed_is_literal() {
        let found = recognize(None, "**open").unwrap();
        assert!(found.is_literal());
        assert_eq!(found.len, 2);
    }

    #[test]
    fn test_triple_run_is_literal() {
        let found = recognize(None, "***x***").unwrap();
        assert!(found.is_literal());
        assert_eq!(found.len, 3);
    }

    #[test]
    fn test_cjk_content() {
        let found = recognize(None, "*重要*").unwrap();
        assert_eq!(found.kind, NodeKind::Emphasis);
        assert_eq!(found.len, "*重要*".len());
    }

    #[test]
    fn test_unclosed_single_does_not_block_strong() {
        let text = "*a **b**";
        let index = ScanIndex::new(text);
        assert!(super::recognize(None, text, &index).unwrap().is_literal());
        let found = super::recognize(Some(' '), &text[3..], &index).unwrap();
        assert_eq!(found.kind, NodeKind::Strong);
        assert_eq!(found.len, 5);
    }

    #[test]
    fn test_closer_behind_opener_is_ignored() {
        let text = "_a_ _b";
        let index = ScanIndex::new(text);
        assert_eq!(super::recognize(None, text, &index).unwrap().kind, NodeKind::Emphasis);
        assert!(super::recognize(Some(' '), &text[4..], &index).unwrap().is_literal());
    }
}
