//! Arena-backed document tree produced by the parser.
//!
//! Every node lives in a single `Vec<Node>` owned by the [`Document`]; parents
//! reference their children by [`NodeId`]. The tree never borrows the source
//! text: nodes carry byte ranges, and callers pass the source back in to read
//! the text a node covers.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The root `Document` node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The kind of a node, with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    // ==================== Blocks ====================
    /// The root of the tree.
    Document,

    /// A run of text lines that starts no other block.
    Paragraph,

    /// An ATX heading (`#` to `######`).
    Heading {
        /// Heading level (1-6).
        level: u8,
    },

    /// A fenced code block.
    CodeBlock {
        /// First word of the info string, if any.
        language: Option<String>,
        /// The block body, without the fences.
        code: String,
    },

    /// A run of list items sharing the same marker family.
    List {
        /// True for `1.` / `1)` lists.
        ordered: bool,
    },

    /// A list item without a checkbox.
    ListItem,

    /// A list item starting with `[ ]`, `[x]` or `[X]`.
    TaskListItem {
        /// Whether the checkbox is ticked.
        checked: bool,
    },

    /// A `---`, `***` or `___` line.
    ThematicBreak,

    /// A line containing only spaces or tabs.
    BlankLine,

    // ==================== Inlines ====================
    /// `*text*` or `_text_`.
    Emphasis,

    /// `**text**` or `__text__`.
    Strong,

    /// `` `code` ``.
    CodeSpan {
        /// The code, with one padding space stripped from each side.
        code: String,
    },

    /// An inline link, autolink or bare URL.
    Link {
        /// Link target.
        destination: String,
        /// Optional link title.
        title: Option<String>,
    },

    /// `![alt](src)`.
    Image {
        /// Image source.
        destination: String,
        /// Optional image title.
        title: Option<String>,
    },

    /// `#tag`.
    Tag {
        /// Tag name without the leading `#`.
        name: String,
    },

    /// Literal text.
    Text,

    /// Syntax consumed by a construct: heading hashes, list bullets,
    /// checkboxes, fences, brackets, delimiters, container indentation.
    Marker,

    /// A line terminator (`\n` or `\r\n`).
    LineBreak,
}

impl NodeKind {
    /// Returns the snake_case name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::CodeBlock { .. } => "code_block",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem => "list_item",
            NodeKind::TaskListItem { .. } => "task_list_item",
            NodeKind::ThematicBreak => "thematic_break",
            NodeKind::BlankLine => "blank_line",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strong => "strong",
            NodeKind::CodeSpan { .. } => "code_span",
            NodeKind::Link { .. } => "link",
            NodeKind::Image { .. } => "image",
            NodeKind::Tag { .. } => "tag",
            NodeKind::Text => "text",
            NodeKind::Marker => "marker",
            NodeKind::LineBreak => "line_break",
        }
    }

    /// Returns true for kinds that never have children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::ThematicBreak
                | NodeKind::BlankLine
                | NodeKind::CodeSpan { .. }
                | NodeKind::Tag { .. }
                | NodeKind::Text
                | NodeKind::Marker
                | NodeKind::LineBreak
        )
    }
}

/// A single node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Byte range of the source covered by the node.
    pub span: Range<usize>,
    /// The containing node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Children in source order.
    pub children: Vec<NodeId>,
}

/// A parsed note.
///
/// Nodes are stored in pre-order, so iterating the arena visits them in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Returns the id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this document.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the kind of the node with the given id.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    /// Returns the children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Returns the parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always holds its root, so this is always false.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Iterates the leaf nodes in document order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.children.is_empty() && node.parent.is_some())
            .map(|(id, _)| id)
    }

    /// Returns the source text covered by a node.
    ///
    /// Returns an empty string if `source` is not the text this document was
    /// parsed from and the span does not fit it.
    pub fn text<'s>(&self, id: NodeId, source: &'s str) -> &'s str {
        source.get(self.get(id).span.clone()).unwrap_or("")
    }

    /// Concatenates the text of all leaves.
    ///
    /// For a document parsed from `source` this always returns `source`.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        for leaf in self.leaves() {
            out.push_str(self.text(leaf, source));
        }
        out
    }

    /// Counts nodes matching a predicate.
    pub fn count(&self, predicate: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.iter().filter(|node| predicate(&node.kind)).count()
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Appends nodes to an arena while the parser walks the source.
pub(crate) struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Starts a tree whose root covers `len` bytes.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                span: 0..len,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Appends a node under `parent` and returns its id.
    pub(crate) fn push(&mut self, parent: NodeId, kind: NodeKind, span: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Appends a leaf unless its span is empty.
    pub(crate) fn leaf(&mut self, parent: NodeId, kind: NodeKind, span: Range<usize>) {
        if !span.is_empty() {
            self.push(parent, kind, span);
        }
    }

    /// Sets the end of a container once its last line is known.
    pub(crate) fn close(&mut self, id: NodeId, end: usize) {
        self.nodes[id.0].span.end = end;
    }

    pub(crate) fn finish(self) -> Document {
        Document { nodes: self.nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, &'static str) {
        // "ab\n" -> paragraph(text "ab", line break)
        let source = "ab\n";
        let mut builder = TreeBuilder::new(source.len());
        let para = builder.push(NodeId::ROOT, NodeKind::Paragraph, 0..3);
        builder.leaf(para, NodeKind::Text, 0..2);
        builder.leaf(para, NodeKind::LineBreak, 2..3);
        builder.leaf(para, NodeKind::Text, 3..3);
        (builder.finish(), source)
    }

    #[test]
    fn test_builder_skips_empty_leaves() {
        let (doc, _) = sample();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.children(NodeId(1)).len(), 2);
    }

    #[test]
    fn test_parent_links() {
        let (doc, _) = sample();
        assert_eq!(doc.parent(NodeId::ROOT), None);
        assert_eq!(doc.parent(NodeId(1)), Some(NodeId::ROOT));
        assert_eq!(doc.parent(NodeId(2)), Some(NodeId(1)));
    }

    #[test]
    fn test_descendants_pre_order() {
        let (doc, _) = sample();
        let order: Vec<usize> = doc.descendants(doc.root()).map(NodeId::index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_text_and_reconstruct() {
        let (doc, source) = sample();
        assert_eq!(doc.text(NodeId(2), source), "ab");
        assert_eq!(doc.reconstruct(source), source);
    }

    #[test]
    fn test_text_with_foreign_source_is_empty() {
        let (doc, _) = sample();
        assert_eq!(doc.text(NodeId(1), "x"), "");
    }

    #[test]
    fn test_kind_names_and_leaves() {
        assert_eq!(NodeKind::TaskListItem { checked: false }.name(), "task_list_item");
        assert!(NodeKind::Tag { name: "a".into() }.is_leaf());
        assert!(!NodeKind::Paragraph.is_leaf());
    }

    #[test]
    fn test_node_kind_serializes_with_type_tag() {
        let json = serde_json::to_string(&NodeKind::Heading { level: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"heading","level":2}"#);
    }
}
