//! HTML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Nodes keep
//! source spans into the document text so clean subtrees serialize as exact
//! slices of the input; any mutation flips the `changed` flag up the ancestor
//! chain and switches serialization to regeneration.

use crate::dom::attribute::Attribute;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// A byte range in the document text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Type of HTML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// Comment (also doctype and other bang tags)
    Comment,
}

/// An HTML node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root and detached nodes)
    pub parent: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Ordered child list
    pub children: Vec<NodeId>,
    /// Attributes in document order
    pub attributes: Vec<Attribute>,
    /// Lowercase canonical name ("#text", "#comment", "#document" for
    /// non-elements)
    pub(crate) name: String,
    /// Name exactly as written in the source
    pub(crate) original_name: String,
    /// Full markup span (start tag through end tag)
    pub(crate) outer: Span,
    /// Content span (between start and end tag)
    pub(crate) inner: Span,
    /// 1-based source line of the node start
    pub line: u32,
    /// Source column within the line
    pub column: u32,
    /// Absolute character offset of the node start
    pub stream_position: usize,
    /// Set by any mutation of this node or a descendant; while unset, the
    /// source spans above are authoritative
    pub(crate) changed: bool,
    /// An end tag was found (or synthesized) for this element
    pub(crate) closed: bool,
    /// End-tag shell node recorded when this element was closed
    pub(crate) end_node: Option<NodeId>,
    /// Closed implicitly by a sibling start tag: no end tag on output
    pub(crate) implicit_end: bool,
    /// Raw text of a script/style element, hidden from inner-text extraction
    pub(crate) hide_inner_text: bool,
    /// Owned content override for text/comment nodes created or edited
    /// through the API
    pub(crate) text: Option<String>,
    /// Element with the same name opened before this one, for nesting repair
    pub(crate) prev_with_same_name: Option<NodeId>,
    /// False for the shell node of an end tag
    pub(crate) start_tag: bool,
    /// Nesting depth while attached (root children are depth 1)
    pub(crate) depth: u32,
}

impl Node {
    fn base(kind: NodeKind, name: &str) -> Self {
        Node {
            kind,
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            children: Vec::new(),
            attributes: Vec::new(),
            name: name.to_string(),
            original_name: name.to_string(),
            outer: Span::default(),
            inner: Span::default(),
            line: 0,
            column: 0,
            stream_position: 0,
            changed: false,
            closed: false,
            end_node: None,
            implicit_end: false,
            hide_inner_text: false,
            text: None,
            prev_with_same_name: None,
            start_tag: true,
            depth: 0,
        }
    }

    /// Create the document root node
    pub(crate) fn document() -> Self {
        let mut node = Node::base(NodeKind::Document, "#document");
        node.closed = true;
        node
    }

    /// Create a detached element node
    pub(crate) fn element(name: &str) -> Self {
        let mut node = Node::base(NodeKind::Element, &name.to_ascii_lowercase());
        node.original_name = name.to_string();
        // A node built through the API has no source span to fall back on
        node.changed = true;
        node.closed = true;
        node
    }

    /// Create a detached text node with owned content
    pub(crate) fn text(content: &str) -> Self {
        let mut node = Node::base(NodeKind::Text, "#text");
        node.text = Some(content.to_string());
        node.changed = true;
        node.closed = true;
        node
    }

    /// Create a detached comment node with owned content
    pub(crate) fn comment(content: &str) -> Self {
        let mut node = Node::base(NodeKind::Comment, "#comment");
        node.text = Some(content.to_string());
        node.changed = true;
        node.closed = true;
        node
    }

    /// Create a node shell during parsing, positioned at its source location
    pub(crate) fn parsed(
        kind: NodeKind,
        start: usize,
        line: u32,
        column: u32,
    ) -> Self {
        let name = match kind {
            NodeKind::Document => "#document",
            NodeKind::Element => "",
            NodeKind::Text => "#text",
            NodeKind::Comment => "#comment",
        };
        let mut node = Node::base(kind, name);
        node.outer = Span::new(start, 0);
        node.line = line;
        node.column = column;
        node.stream_position = start;
        node
    }

    /// Lowercase canonical name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as written in the source
    #[inline]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this node has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// An end tag was found or synthesized for this element
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closed implicitly by a sibling start tag
    #[inline]
    pub fn is_implicit_end(&self) -> bool {
        self.implicit_end
    }

    /// This node or a descendant was mutated since parsing
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// First child, if any
    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    /// Last child, if any
    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }
}
