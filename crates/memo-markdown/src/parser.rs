//! The configured parser and its serde-loadable settings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Document, NodeId, TreeBuilder};
use crate::block::{split_lines, BlockParser};
use crate::inline::{trigger_table, InlineScanner, Recognizer, TagRecognizer};

/// Parses note text into a [`Document`].
///
/// A parser owns an ordered list of inline recognizers and the trigger table
/// derived from it. It holds no other state, so one instance can be shared
/// across threads and reused for any number of documents.
///
/// # Example
///
/// ```
/// use memo_markdown_rs::{NodeKind, Parser};
///
/// let source = "Shopping #errands\n- [ ] milk\n";
/// let doc = Parser::default().parse(source);
///
/// let tags = doc.count(|kind| matches!(kind, NodeKind::Tag { .. }));
/// assert_eq!(tags, 1);
/// assert_eq!(doc.reconstruct(source), source);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    recognizers: Vec<Recognizer>,
    triggers: HashMap<char, Vec<usize>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Recognizer::defaults())
    }
}

impl Parser {
    /// Creates a parser that tries `recognizers` in the given order.
    pub fn new(recognizers: Vec<Recognizer>) -> Self {
        let triggers = trigger_table(&recognizers);
        Self {
            recognizers,
            triggers,
        }
    }

    /// Returns the recognizers in trigger order.
    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    /// Parses `source` into a tree.
    ///
    /// This never fails: text that forms no recognizable construct is kept as
    /// literal text.
    pub fn parse(&self, source: &str) -> Document {
        let mut tree = TreeBuilder::new(source.len());
        let blocks = BlockParser {
            source,
            inline: InlineScanner {
                source,
                recognizers: &self.recognizers,
                triggers: &self.triggers,
            },
        };
        let lines = split_lines(source);
        blocks.parse_blocks(&mut tree, NodeId::ROOT, &lines, 0);
        tree.finish()
    }
}

/// Parses `source` with the default recognizers.
pub fn parse(source: &str) -> Document {
    Parser::default().parse(source)
}

/// Parser settings as they appear in a configuration file.
///
/// ```toml
/// [parser]
/// tag_word_boundary = true
/// disabled = ["url"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject `#` directly preceded by a letter or digit as a tag start.
    pub tag_word_boundary: bool,

    /// Names of recognizers to leave out (see [`Recognizer::name`]).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

impl ParserConfig {
    /// Builds a parser from these settings.
    pub fn build(&self) -> Parser {
        let known: Vec<&str> = Recognizer::defaults().iter().map(Recognizer::name).collect();
        for name in &self.disabled {
            if !known.contains(&name.as_str()) {
                log::warn!("ignoring unknown recognizer '{name}' in parser.disabled");
            }
        }

        let recognizers = Recognizer::defaults()
            .into_iter()
            .filter(|r| !self.disabled.iter().any(|name| name == r.name()))
            .map(|r| match r {
                Recognizer::Tag(_) => Recognizer::Tag(
                    TagRecognizer::new().with_word_boundary(self.tag_word_boundary),
                ),
                other => other,
            })
            .collect();

        Parser::new(recognizers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_default_parser_uses_all_recognizers() {
        let parser = Parser::default();
        assert_eq!(parser.recognizers().len(), Recognizer::defaults().len());
    }

    #[test]
    fn test_config_disables_recognizers() {
        let config = ParserConfig {
            tag_word_boundary: false,
            disabled: vec!["tag".to_string(), "nonsense".to_string()],
        };
        let parser = config.build();
        assert!(parser
            .recognizers()
            .iter()
            .all(|r| !matches!(r, Recognizer::Tag(_))));

        let doc = parser.parse("#work");
        assert_eq!(doc.count(|k| matches!(k, NodeKind::Tag { .. })), 0);
    }

    #[test]
    fn test_config_word_boundary() {
        let config = ParserConfig {
            tag_word_boundary: true,
            disabled: Vec::new(),
        };
        let doc = config.build().parse("issue#12 and #real");
        let names: Vec<&str> = doc
            .iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Tag { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_config_from_toml() {
        let config: ParserConfig = toml::from_str("tag_word_boundary = true\ndisabled = [\"url\"]").unwrap();
        assert!(config.tag_word_boundary);
        assert_eq!(config.disabled, vec!["url".to_string()]);

        let empty: ParserConfig = toml::from_str("").unwrap();
        assert_eq!(empty, ParserConfig::default());
    }
}
