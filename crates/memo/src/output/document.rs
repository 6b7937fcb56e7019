//! Document tree output formatting.

use memo_markdown_rs::{Document, NodeId, NodeKind};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for one node and its subtree.
#[derive(Serialize)]
pub struct NodeOutput<'a> {
    #[serde(flatten)]
    pub kind: &'a NodeKind,
    pub start: usize,
    pub end: usize,
    /// Source text, leaves only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeOutput<'a>>,
}

fn node_output<'a>(document: &'a Document, source: &'a str, id: NodeId) -> NodeOutput<'a> {
    let node = document.get(id);
    NodeOutput {
        kind: &node.kind,
        start: node.span.start,
        end: node.span.end,
        text: node.kind.is_leaf().then(|| document.text(id, source)),
        children: node
            .children
            .iter()
            .map(|&child| node_output(document, source, child))
            .collect(),
    }
}

/// Formats a document tree as JSON.
pub fn format_document_json(document: &Document, source: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&node_output(document, source, document.root()))
}

/// Formats a document tree as an indented outline, one node per line.
///
/// With `show_text`, leaves are followed by their source text.
pub fn format_document_outline(
    document: &Document,
    source: &str,
    show_text: bool,
    use_colors: bool,
) -> String {
    let mut output = String::new();
    write_outline(document, source, document.root(), 0, show_text, use_colors, &mut output);
    output
}

fn write_outline(
    document: &Document,
    source: &str,
    id: NodeId,
    depth: usize,
    show_text: bool,
    use_colors: bool,
    output: &mut String,
) {
    let node = document.get(id);
    let name = node.kind.name();
    let span = format!("[{}..{}]", node.span.start, node.span.end);

    output.push_str(&"  ".repeat(depth));
    if use_colors {
        output.push_str(&format!("{} {}", name.cyan(), span.dimmed()));
    } else {
        output.push_str(&format!("{name} {span}"));
    }
    if let Some(detail) = kind_detail(&node.kind) {
        output.push(' ');
        output.push_str(&detail);
    }
    if show_text && node.kind.is_leaf() {
        output.push_str(&format!(" {:?}", document.text(id, source)));
    }
    output.push('\n');

    for &child in &node.children {
        write_outline(document, source, child, depth + 1, show_text, use_colors, output);
    }
}

/// The attributes worth showing next to a node's kind.
fn kind_detail(kind: &NodeKind) -> Option<String> {
    match kind {
        NodeKind::Heading { level } => Some(format!("level={level}")),
        NodeKind::CodeBlock {
            language: Some(language),
            ..
        } => Some(format!("language={language}")),
        NodeKind::List { ordered } => Some(format!("ordered={ordered}")),
        NodeKind::TaskListItem { checked } => Some(format!("checked={checked}")),
        NodeKind::Link { destination, .. } | NodeKind::Image { destination, .. } => {
            Some(format!("destination={destination}"))
        }
        NodeKind::Tag { name } => Some(format!("name={name}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_markdown_rs::parse;

    #[test]
    fn test_outline() {
        let source = "# Hi #tag\n";
        let document = parse(source);
        let outline = format_document_outline(&document, source, false, false);
        let lines: Vec<&str> = outline.lines().collect();

        assert_eq!(lines[0], "document [0..10]");
        assert_eq!(lines[1], "  heading [0..10] level=1");
        assert!(lines.iter().any(|line| line.trim() == "tag [5..9] name=tag"));
        assert!(lines.iter().all(|line| !line.contains('"')));
    }

    #[test]
    fn test_outline_with_text() {
        let source = "hello";
        let document = parse(source);
        let outline = format_document_outline(&document, source, true, false);
        assert!(outline.contains("text [0..5] \"hello\""));
    }

    #[test]
    fn test_json_tree() {
        let source = "- [ ] todo";
        let document = parse(source);
        let json: serde_json::Value =
            serde_json::from_str(&format_document_json(&document, source).unwrap()).unwrap();

        assert_eq!(json["type"], "document");
        assert_eq!(json["start"], 0);
        assert_eq!(json["end"], 10);
        let list = &json["children"][0];
        assert_eq!(list["type"], "list");
        assert_eq!(list["ordered"], false);
        let item = &list["children"][0];
        assert_eq!(item["type"], "task_list_item");
        assert_eq!(item["checked"], false);
        assert!(json.get("text").is_none());
    }
}
