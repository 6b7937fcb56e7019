//! Backtick code spans.

use std::collections::HashMap;

use super::{Match, ScanIndex};
use crate::ast::NodeKind;

/// Reads a code span opened by the backtick run at the start of `input`.
///
/// An opening run without a closing run of the same length is claimed as
/// literal text in one piece, so its backticks cannot open a shorter span.
pub(crate) fn recognize(input: &str, index: &ScanIndex<'_>) -> Option<Match> {
    let bytes = input.as_bytes();
    let open = run_length(bytes, 0);
    if open == 0 {
        return None;
    }

    let from = index.offset(input) + open;
    let runs = index.code_runs.get_or_init(|| last_runs(index.text));
    if !runs.get(&open).is_some_and(|&start| start >= from) {
        return Some(Match::literal(open));
    }

    let mut index = open;
    while index < bytes.len() {
        if bytes[index] == b'`' {
            let run = run_length(bytes, index);
            if run == open {
                let code = strip_padding(&input[open..index]);
                return Some(Match::leaf(
                    NodeKind::CodeSpan {
                        code: code.to_string(),
                    },
                    index + run,
                ));
            }
            index += run;
        } else {
            index += 1;
        }
    }

    Some(Match::literal(open))
}

/// Start of the last backtick run of each length in `text`.
fn last_runs(text: &str) -> HashMap<usize, usize> {
    let bytes = text.as_bytes();
    let mut runs = HashMap::new();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'`' {
            let run = run_length(bytes, index);
            runs.insert(run, index);
            index += run;
        } else {
            index += 1;
        }
    }
    runs
}

fn run_length(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|&&b| b == b'`').count()
}

/// Strips one leading and one trailing space when both are present and the
/// content is not only spaces.
fn strip_padding(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with(' ') && raw.ends_with(' ') && !raw.bytes().all(|b| b == b' ') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize(input: &str) -> Option<Match> {
        super::recognize(input, &ScanIndex::new(input))
    }

    fn code_of(found: &Match) -> &str {
        match &found.kind {
            NodeKind::CodeSpan { code } => code,
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_single_backtick_span() {
        let found = recognize("`let x = 1;` after").unwrap();
        assert_eq!(found.len, 12);
        assert_eq!(code_of(&found), "let x = 1;");
    }

    #[test]
    fn test_double_backtick_span_contains_single() {
        let found = recognize("`` a ` b ``").unwrap();
        assert_eq!(code_of(&found), "a ` b");
        assert_eq!(found.len, 11);
    }

    #[test]
    fn test_unclosed_run_is_literal() {
        let found = recognize("``foo`").unwrap();
        assert!(found.is_literal());
        assert_eq!(found.len, 2);
    }

    #[test]
    fn test_only_spaces_kept() {
        let found = recognize("`  `").unwrap();
        assert_eq!(code_of(&found), "  ");
    }

    #[test]
    fn test_one_sided_padding_kept() {
        let found = recognize("` a`").unwrap();
        assert_eq!(code_of(&found), " a");
    }

    #[test]
    fn test_non_backtick_declines() {
        assert!(recognize("abc").is_none());
    }

    #[test]
    fn test_exhausted_run_length_does_not_block_other_lengths() {
        let text = "`a ``b``";
        let index = ScanIndex::new(text);
        assert!(super::recognize(text, &index).unwrap().is_literal());
        let found = super::recognize(&text[3..], &index).unwrap();
        assert_eq!(code_of(&found), "b");
        assert_eq!(found.len, 5);
    }

    #[test]
    fn test_closer_before_cursor_does_not_count() {
        let text = "`a` `b";
        let index = ScanIndex::new(text);
        assert_eq!(code_of(&super::recognize(text, &index).unwrap()), "a");
        assert!(super::recognize(&text[4..], &index).unwrap().is_literal());
    }
}
