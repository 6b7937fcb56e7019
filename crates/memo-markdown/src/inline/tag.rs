//! `#tag` recognition.
//!
//! A tag is a `#` followed by one or more Unicode letters, Unicode numbers,
//! `-`, `_` or `/`. A `#` followed by another `#`, by a space, or by nothing
//! is left alone: at the start of a line that is a heading marker, which the
//! block parser has already consumed, and anywhere else it is literal text.

use serde::{Deserialize, Serialize};

use super::Match;
use crate::ast::NodeKind;

/// Returns true if `c` may appear in a tag name.
///
/// The U+FFFD replacement character that stands in for undecodable input is
/// not a tag character, so it ends a tag like any other punctuation.
pub fn is_tag_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || matches!(c, '-' | '_' | '/')
}

/// Recognizer for inline `#tag` syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecognizer {
    /// When set, a `#` directly preceded by a letter or digit (`issue#12`)
    /// does not start a tag.
    pub word_boundary: bool,
}

impl TagRecognizer {
    /// Creates a recognizer with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the word-boundary requirement.
    pub fn with_word_boundary(mut self, enabled: bool) -> Self {
        self.word_boundary = enabled;
        self
    }

    /// Tries to read a tag at the start of `input`.
    pub fn recognize(&self, prev: Option<char>, input: &str) -> Option<Match> {
        let after_hash = input.strip_prefix('#')?;

        if self.word_boundary && prev.is_some_and(char::is_alphanumeric) {
            return None;
        }

        match after_hash.chars().next() {
            None | Some('#') | Some(' ') => return None,
            Some(_) => {}
        }

        let name_len = after_hash
            .char_indices()
            .find(|&(_, c)| !is_tag_char(c))
            .map_or(after_hash.len(), |(index, _)| index);

        if name_len == 0 {
            log::trace!("declined empty tag candidate");
            return None;
        }

        let name = &after_hash[..name_len];
        Some(Match::leaf(
            NodeKind::Tag {
                name: name.to_string(),
            },
            1 + name_len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_name(input: &str) -> Option<String> {
        TagRecognizer::default()
            .recognize(None, input)
            .map(|found| match found.kind {
                NodeKind::Tag { name } => name,
                other => panic!("unexpected kind {other:?}"),
            })
    }

    #[test]
    fn test_simple_tag() {
        assert_eq!(tag_name("#work"), Some("work".to_string()));
    }

    #[test]
    fn test_tag_stops_at_space() {
        let found = TagRecognizer::default().recognize(None, "#work today").unwrap();
        assert_eq!(found.len, 5);
        assert_eq!(found.kind, NodeKind::Tag { name: "work".into() });
    }

    #[test]
    fn test_tag_allows_dash_underscore_slash_digits() {
        assert_eq!(tag_name("#a-b_c/d2"), Some("a-b_c/d2".to_string()));
        assert_eq!(tag_name("#2024"), Some("2024".to_string()));
    }

    #[test]
    fn test_tag_stops_at_punctuation() {
        assert_eq!(tag_name("#done."), Some("done".to_string()));
        assert_eq!(tag_name("#a,b"), Some("a".to_string()));
    }

    #[test]
    fn test_cjk_tag() {
        assert_eq!(tag_name("#机器学习"), Some("机器学习".to_string()));
        assert_eq!(tag_name("#工作 日志"), Some("工作".to_string()));
    }

    #[test]
    fn test_double_hash_declines() {
        assert_eq!(tag_name("##heading"), None);
    }

    #[test]
    fn test_hash_space_declines() {
        assert_eq!(tag_name("# heading"), None);
    }

    #[test]
    fn test_lone_hash_declines() {
        assert_eq!(tag_name("#"), None);
    }

    #[test]
    fn test_hash_followed_by_punctuation_declines() {
        assert_eq!(tag_name("#!"), None);
        assert_eq!(tag_name("#\tx"), None);
    }

    #[test]
    fn test_replacement_character_stops_tag() {
        assert_eq!(tag_name("#ab\u{FFFD}cd"), Some("ab".to_string()));
        assert_eq!(tag_name("#\u{FFFD}"), None);
    }

    #[test]
    fn test_word_boundary_option() {
        let strict = TagRecognizer::new().with_word_boundary(true);
        assert!(strict.recognize(Some('e'), "#12").is_none());
        assert!(strict.recognize(Some(' '), "#12").is_some());
        assert!(strict.recognize(None, "#12").is_some());

        let lenient = TagRecognizer::new();
        assert!(lenient.recognize(Some('e'), "#12").is_some());
    }

    #[test]
    fn test_non_hash_input_declines() {
        assert_eq!(tag_name("tag"), None);
        assert_eq!(tag_name(""), None);
    }
}
