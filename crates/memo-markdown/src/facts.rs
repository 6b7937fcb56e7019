//! Facts derived from a parsed note: its tags and whether it contains code,
//! links and task lists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ast::{Document, NodeKind};
use crate::parser::Parser;

/// Properties of a note computed from its content.
///
/// A pure function of the source text, so it can be cached under a hash of
/// the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facts {
    /// Distinct tag names, case-sensitive.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// At least one code span or fenced code block.
    #[serde(default)]
    pub has_code: bool,

    /// At least one link (inline, autolink or bare URL).
    #[serde(default)]
    pub has_link: bool,

    /// At least one task list item.
    #[serde(default)]
    pub has_task_list: bool,

    /// At least one unchecked task list item.
    #[serde(default)]
    pub has_incomplete_tasks: bool,
}

impl Facts {
    /// Extracts facts from a parsed document.
    pub fn from_document(document: &Document) -> Self {
        extract_facts(document)
    }

    /// Returns the tags as a sorted list.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    /// Returns true if the note carries the given tag.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }
}

/// Walks every node of `document` once and collects its [`Facts`].
pub fn extract_facts(document: &Document) -> Facts {
    let mut facts = Facts::default();

    for id in document.descendants(document.root()) {
        match document.kind(id) {
            NodeKind::Tag { name } => {
                if !facts.tags.contains(name) {
                    facts.tags.insert(name.clone());
                }
            }
            NodeKind::CodeSpan { .. } | NodeKind::CodeBlock { .. } if !facts.has_code => {
                facts.has_code = true;
            }
            NodeKind::Link { .. } if !facts.has_link => {
                facts.has_link = true;
            }
            NodeKind::TaskListItem { checked } => {
                facts.has_task_list = true;
                if !checked {
                    facts.has_incomplete_tasks = true;
                }
            }
            _ => {}
        }
    }

    facts
}

/// Parses `source` with the default parser and extracts its facts.
pub fn analyze(source: &str) -> Facts {
    extract_facts(&Parser::default().parse(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(facts: &Facts) -> Vec<&str> {
        facts.tags.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_plain_text_has_no_facts() {
        assert_eq!(analyze("just some words\non two lines"), Facts::default());
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(analyze(""), Facts::default());
    }

    #[test]
    fn test_tags_are_deduplicated_and_case_sensitive() {
        let facts = analyze("#Work #work #work\n#life");
        assert_eq!(tags(&facts), vec!["Work", "life", "work"]);
    }

    #[test]
    fn test_tags_inside_headings_lists_and_emphasis() {
        let source = "## Plan #weekly\n- item #list\n  - nested #deep\n*stress #emph*\n";
        let facts = analyze(source);
        assert_eq!(tags(&facts), vec!["deep", "emph", "list", "weekly"]);
    }

    #[test]
    fn test_tags_inside_link_label() {
        let facts = analyze("[see #ref](https://example.com)");
        assert_eq!(tags(&facts), vec!["ref"]);
        assert!(facts.has_link);
    }

    #[test]
    fn test_no_tags_inside_code() {
        let facts = analyze("`#notatag`\n```\n#nope\n```\n");
        assert!(facts.tags.is_empty());
        assert!(facts.has_code);
    }

    #[test]
    fn test_url_fragment_is_not_a_tag() {
        let facts = analyze("read https://example.com/page#intro now");
        assert!(facts.tags.is_empty());
        assert!(facts.has_link);
    }

    #[test]
    fn test_has_code_from_span_and_block() {
        assert!(analyze("use `cargo test`").has_code);
        assert!(analyze("```rust\nfn main() {}\n```").has_code);
        assert!(!analyze("*only emphasis*").has_code);
    }

    #[test]
    fn test_has_link_variants() {
        assert!(analyze("[a](b)").has_link);
        assert!(analyze("<https://a.b>").has_link);
        assert!(analyze("see www.example.com").has_link);
        assert!(!analyze("![img](a.png)").has_link);
        assert!(!analyze("[just brackets]").has_link);
    }

    #[test]
    fn test_task_flags() {
        let done = analyze("- [x] shipped\n- [X] also");
        assert!(done.has_task_list);
        assert!(!done.has_incomplete_tasks);

        let open = analyze("- [x] shipped\n- [ ] pending");
        assert!(open.has_task_list);
        assert!(open.has_incomplete_tasks);

        let plain = analyze("- one\n- two");
        assert!(!plain.has_task_list);
        assert!(!plain.has_incomplete_tasks);
    }

    #[test]
    fn test_nested_incomplete_task() {
        let facts = analyze("- [x] parent\n  - [ ] child\n");
        assert!(facts.has_incomplete_tasks);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let source = "#b #a\n- [ ] x #c\n`code` [l](u)";
        let first = analyze(source);
        let second = analyze(source);
        assert_eq!(first, second);
        assert_eq!(Facts::from_document(&Parser::default().parse(source)), first);
    }

    #[test]
    fn test_tag_list_sorted() {
        let facts = analyze("#zeta #alpha");
        assert_eq!(facts.tag_list(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert!(facts.has_tag("zeta"));
        assert!(!facts.has_tag("beta"));
    }

    #[test]
    fn test_facts_serde_roundtrip() {
        let facts = analyze("#x\n- [ ] y");
        let json = serde_json::to_string(&facts).unwrap();
        let back: Facts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, facts);
    }
}
