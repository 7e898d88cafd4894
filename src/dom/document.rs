//! Arena-based HTML Document
//!
//! `Document` owns everything: the text buffer, the node arena, the options,
//! the parse-error log and the id index. Nodes are addressed by `NodeId` and
//! all reads and mutations go through the document.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use log::debug;

use crate::core::elements::ElementFlagsTable;
use crate::core::encoding::{self, StreamEncoding};
use crate::dom::attribute::Attribute;
use crate::dom::node::{Node, NodeId, NodeKind};
use crate::error::{HtmlError, ParseError};

/// Parsing and output options
///
/// Owned by the document; the element-flags table lives here so two documents
/// can disagree about element behavior without global state.
#[derive(Debug, Clone)]
pub struct Options {
    /// Leave children of a force-closed node open instead of closing them
    pub auto_close_on_end: bool,
    /// Record unclosed tags in the error log after parsing
    pub check_syntax: bool,
    /// Compute a rolling CRC32 over the consumed input
    pub compute_checksum: bool,
    /// Attach a source excerpt to each parse error
    pub extract_error_source_text: bool,
    /// Cap on the extracted excerpt length
    pub extract_error_source_text_max_length: usize,
    /// Repair mis-nested list/table end tags using resetter containers
    pub fix_nested_tags: bool,
    /// Drop quotes around attribute values that contain no whitespace
    pub output_optimize_attribute_values: bool,
    /// Serialize names in their original case
    pub output_original_case: bool,
    /// Serialize names in upper case
    pub output_upper_case: bool,
    /// Scan meta tags for a declared charset while parsing
    pub read_encoding: bool,
    /// Stop parsing after this element closes; the rest becomes the remainder
    pub stopper_node_name: Option<String>,
    /// Maintain the id attribute index
    pub use_id_attribute: bool,
    /// Serialize void elements as `<br />` instead of `<br>`
    pub write_empty_nodes: bool,
    /// Abort parsing past this nesting depth (0 = unlimited)
    pub max_nested_child_nodes: usize,
    /// Recursion guard for traversal and close cascades
    pub max_depth_level: usize,
    /// Treat `<%` as literal text instead of server-side code
    pub disable_server_side_code: bool,
    /// Legacy mode: `p` is a void element
    pub p_as_empty: bool,
    /// Element behavior registry
    pub element_flags: ElementFlagsTable,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            auto_close_on_end: false,
            check_syntax: true,
            compute_checksum: false,
            extract_error_source_text: false,
            extract_error_source_text_max_length: 100,
            fix_nested_tags: false,
            output_optimize_attribute_values: false,
            output_original_case: false,
            output_upper_case: false,
            read_encoding: true,
            stopper_node_name: None,
            use_id_attribute: true,
            write_empty_nodes: false,
            max_nested_child_nodes: 0,
            max_depth_level: 1024,
            disable_server_side_code: false,
            p_as_empty: false,
            element_flags: ElementFlagsTable::new(false),
        }
    }
}

impl Options {
    /// Default options with the legacy void-`p` behavior enabled
    pub fn with_p_as_empty() -> Self {
        Options {
            p_as_empty: true,
            element_flags: ElementFlagsTable::new(true),
            ..Options::default()
        }
    }
}

/// Unparsed input left over after a stopper node closed
#[derive(Debug, Clone)]
pub struct Remainder {
    /// Offset in the document text where parsing stopped
    pub offset: usize,
    /// The unparsed tail
    pub text: String,
}

/// A parsed, mutable HTML document
pub struct Document {
    pub(crate) text: String,
    pub(crate) nodes: Vec<Node>,
    pub options: Options,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) ids: HashMap<String, NodeId>,
    pub(crate) remainder: Option<Remainder>,
    pub(crate) checksum: Option<u32>,
    pub(crate) declared_encoding: Option<String>,
    pub(crate) stream_encoding: Option<StreamEncoding>,
}

impl Document {
    /// Create an empty document with the given options
    pub fn new(options: Options) -> Self {
        Document {
            text: String::new(),
            nodes: vec![Node::document()],
            options,
            errors: Vec::new(),
            ids: HashMap::new(),
            remainder: None,
            checksum: None,
            declared_encoding: None,
            stream_encoding: None,
        }
    }

    /// Parse a string with default options
    pub fn from_html(html: &str) -> Result<Self, HtmlError> {
        let mut doc = Document::new(Options::default());
        doc.load_html(html)?;
        Ok(doc)
    }

    /// Parse a string into this document, replacing any previous content
    pub fn load_html(&mut self, html: &str) -> Result<(), HtmlError> {
        self.reset();
        self.text = html.to_string();
        self.run_parse()?;
        debug!(
            "loaded {} bytes: {} nodes, {} parse errors",
            self.text.len(),
            self.nodes.len(),
            self.errors.len()
        );
        Ok(())
    }

    /// Parse raw bytes, detecting BOM and converting UTF-16 input
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), HtmlError> {
        let (text, stream) = encoding::to_utf8(bytes)?;
        self.reset();
        self.stream_encoding = Some(stream);
        self.text = text;
        self.run_parse()?;
        debug!(
            "loaded {} bytes ({}): {} nodes, {} parse errors",
            self.text.len(),
            stream.label(),
            self.nodes.len(),
            self.errors.len()
        );
        Ok(())
    }

    /// Scan the input only far enough to find a declared charset
    ///
    /// Parses until a `<meta>` charset declaration is seen, then stops
    /// without building the rest of the tree. Returns the normalized charset
    /// label, if any was declared.
    pub fn detect_encoding(html: &str) -> Result<Option<String>, HtmlError> {
        let mut doc = Document::new(Options::default());
        doc.text = html.to_string();
        doc.run_detect_encoding()?;
        Ok(doc.declared_encoding)
    }

    fn reset(&mut self) {
        self.text.clear();
        self.nodes.clear();
        self.nodes.push(Node::document());
        self.errors.clear();
        self.ids.clear();
        self.remainder = None;
        self.checksum = None;
        self.declared_encoding = None;
        self.stream_encoding = None;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The document root node
    #[inline]
    pub fn root(&self) -> NodeId {
        0
    }

    /// The raw document text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse errors recorded while loading
    #[inline]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// CRC32 of the consumed input, when `compute_checksum` was on
    #[inline]
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    /// Unparsed tail after a stopper node, when one was configured and hit
    #[inline]
    pub fn remainder(&self) -> Option<&Remainder> {
        self.remainder.as_ref()
    }

    /// Charset declared by a meta tag, normalized
    #[inline]
    pub fn declared_encoding(&self) -> Option<&str> {
        self.declared_encoding.as_deref()
    }

    /// Shared node access
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Lowercase name of a node
    #[inline]
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Children of a node, in order
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Content of a text or comment node
    ///
    /// Comment content excludes the `<!--`/`-->` markers. Elements and the
    /// document node yield an empty string.
    pub fn text_content(&self, id: NodeId) -> Cow<'_, str> {
        let node = self.node(id);
        if let Some(text) = &node.text {
            return Cow::Borrowed(text.as_str());
        }
        let raw = &self.text[node.outer.start..node.outer.end()];
        match node.kind {
            NodeKind::Text => Cow::Borrowed(raw),
            NodeKind::Comment => Cow::Borrowed(strip_comment_markers(raw)),
            _ => Cow::Borrowed(""),
        }
    }

    /// Replace the content of a text or comment node
    pub fn set_text_content(&mut self, id: NodeId, content: &str) -> Result<(), HtmlError> {
        match self.node(id).kind {
            NodeKind::Text | NodeKind::Comment => {
                self.node_mut(id).text = Some(content.to_string());
                self.mark_changed(id);
                Ok(())
            }
            _ => Err(HtmlError::WrongNodeKind {
                expected: "text or comment",
            }),
        }
    }

    // ========================================================================
    // Node factories
    // ========================================================================

    /// Create a detached element node
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push_node(Node::text(content))
    }

    /// Create a detached comment node (content without markers)
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push_node(Node::comment(content))
    }

    /// Create a detached attribute
    pub fn create_attribute(&self, name: &str, value: &str) -> Attribute {
        Attribute::new(name, value)
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Attributes of a node, in document order
    #[inline]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        &self.node(id).attributes
    }

    /// Value of the named attribute
    ///
    /// Duplicate names keep every occurrence in the list, the last one wins
    /// here. `None` means absent or valueless.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        self.node(id)
            .attributes
            .iter()
            .rev()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.resolve_value(&self.text))
    }

    /// Value of the named attribute, or a default
    pub fn get_attribute_or(&self, id: NodeId, name: &str, default: &str) -> String {
        match self.get_attribute(id, name) {
            Some(v) => v.into_owned(),
            None => default.to_string(),
        }
    }

    /// Value of the named attribute parsed to a target type, or a default
    /// when absent or unparseable
    pub fn get_attribute_parsed<T: FromStr>(&self, id: NodeId, name: &str, default: T) -> T {
        match self.get_attribute(id, name) {
            Some(v) => v.parse().unwrap_or(default),
            None => default,
        }
    }

    /// All attributes matching a name, in document order
    pub fn attributes_with_name<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.node(id)
            .attributes
            .iter()
            .filter(move |a| a.name.eq_ignore_ascii_case(name))
    }

    /// Set or append an attribute; `None` makes it valueless
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: Option<&str>) {
        let lower = name.to_ascii_lowercase();
        if lower == "id" && self.options.use_id_attribute {
            self.unregister_id(id);
        }
        let node = self.node_mut(id);
        if let Some(attr) = node.attributes.iter_mut().rev().find(|a| a.name == lower) {
            attr.set_value(value);
        } else {
            let attr = match value {
                Some(v) => Attribute::new(name, v),
                None => Attribute::valueless(name),
            };
            node.attributes.push(attr);
        }
        if lower == "id" && self.options.use_id_attribute {
            self.register_id(id);
        }
        self.mark_changed(id);
    }

    /// Remove every attribute matching a name
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let lower = name.to_ascii_lowercase();
        if lower == "id" && self.options.use_id_attribute {
            self.unregister_id(id);
        }
        self.node_mut(id).attributes.retain(|a| a.name != lower);
        self.mark_changed(id);
    }

    // ========================================================================
    // Id index
    // ========================================================================

    /// Look up an element by its id attribute
    ///
    /// Errors when id indexing was disabled in the options.
    pub fn get_element_by_id(&self, id_value: &str) -> Result<Option<NodeId>, HtmlError> {
        if !self.options.use_id_attribute {
            return Err(HtmlError::IdIndexingDisabled);
        }
        Ok(self.ids.get(&id_value.to_ascii_lowercase()).copied())
    }

    pub(crate) fn register_id(&mut self, id: NodeId) {
        if !self.options.use_id_attribute {
            return;
        }
        if let Some(value) = self.get_attribute(id, "id") {
            let key = value.to_ascii_lowercase();
            self.ids.insert(key, id);
        }
    }

    pub(crate) fn unregister_id(&mut self, id: NodeId) {
        if !self.options.use_id_attribute {
            return;
        }
        if let Some(value) = self.get_attribute(id, "id") {
            let key = value.to_ascii_lowercase();
            if self.ids.get(&key) == Some(&id) {
                self.ids.remove(&key);
            }
        }
    }

    /// Register the id attributes of a whole subtree (used after attaching)
    pub(crate) fn register_ids_deep(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_element() {
                self.register_id(current);
            }
            stack.extend(self.node(current).children.iter().copied());
        }
    }

    pub(crate) fn unregister_ids_deep(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_element() {
                self.unregister_id(current);
            }
            stack.extend(self.node(current).children.iter().copied());
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first descendants of a node (excluding the node itself)
    ///
    /// Guarded by `max_depth_level`.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, HtmlError> {
        let max = self.options.max_depth_level;
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .node(id)
            .children
            .iter()
            .rev()
            .map(|&c| (c, 1))
            .collect();

        while let Some((current, depth)) = stack.pop() {
            if depth > max {
                return Err(HtmlError::DepthExceeded(max));
            }
            out.push(current);
            for &child in self.node(current).children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        Ok(out)
    }

    /// Descendant elements with a given name
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Result<Vec<NodeId>, HtmlError> {
        Ok(self
            .descendants(id)?
            .into_iter()
            .filter(|&n| self.node(n).is_element() && self.name(n).eq_ignore_ascii_case(name))
            .collect())
    }

    /// Ancestors from the parent up to the document root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            current: self.node(id).parent,
        }
    }

    /// Child elements of a node (text and comments filtered out)
    pub fn child_elements<'a>(&'a self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(move |&c| self.node(c).is_element())
    }

    /// First node with a given name, searching this subtree depth-first
    pub fn find_first(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.name(current).eq_ignore_ascii_case(name) {
                return Some(current);
            }
            for &child in self.node(current).children.iter().rev() {
                stack.push(child);
            }
        }
        None
    }

    /// Location path of a node, e.g. `/html[1]/body[1]/div[2]`
    ///
    /// Position counts same-named element siblings (or same-kind siblings for
    /// text and comments).
    pub fn path(&self, id: NodeId) -> String {
        let node = self.node(id);
        if node.kind == NodeKind::Document {
            return "/".to_string();
        }
        let base = match node.parent {
            Some(parent) => {
                let p = self.path(parent);
                if p == "/" {
                    p
                } else {
                    p + "/"
                }
            }
            None => String::new(),
        };
        base + &self.relative_path_step(id)
    }

    fn relative_path_step(&self, id: NodeId) -> String {
        let node = self.node(id);
        let label = match node.kind {
            NodeKind::Element => node.name().to_string(),
            NodeKind::Text => "text()".to_string(),
            NodeKind::Comment => "comment()".to_string(),
            NodeKind::Document => return String::new(),
        };

        let position = match node.parent {
            Some(parent) => {
                let mut i = 1;
                for &sibling in &self.node(parent).children {
                    if sibling == id {
                        break;
                    }
                    let s = self.node(sibling);
                    let same = match node.kind {
                        NodeKind::Element => s.is_element() && s.name() == node.name(),
                        kind => s.kind == kind,
                    };
                    if same {
                        i += 1;
                    }
                }
                i
            }
            None => 1,
        };

        format!("{}[{}]", label, position)
    }

    // ========================================================================
    // Clone
    // ========================================================================

    /// Copy a node (optionally with its subtree) into a new detached node
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let mut copy = self.node(id).clone();
        copy.parent = None;
        copy.prev_sibling = None;
        copy.next_sibling = None;
        copy.end_node = None;
        copy.prev_with_same_name = None;
        let children = std::mem::take(&mut copy.children);
        let new_id = self.push_node(copy);

        if deep {
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.node_mut(child_copy).parent = Some(new_id);
                self.node_mut(new_id).children.push(child_copy);
            }
            // relink sibling pointers inside the copy
            let ids: Vec<NodeId> = self.node(new_id).children.clone();
            for (i, &c) in ids.iter().enumerate() {
                self.node_mut(c).prev_sibling = if i > 0 { Some(ids[i - 1]) } else { None };
                self.node_mut(c).next_sibling = ids.get(i + 1).copied();
            }
        }
        new_id
    }

    /// Copy an element under a different element name
    ///
    /// The renamed copy no longer matches its source slice, so it always
    /// serializes by regeneration; its subtree still slices where clean.
    pub fn clone_node_renamed(
        &mut self,
        id: NodeId,
        name: &str,
        deep: bool,
    ) -> Result<NodeId, HtmlError> {
        if self.node(id).kind != NodeKind::Element {
            return Err(HtmlError::WrongNodeKind {
                expected: "element",
            });
        }
        let copy = self.clone_node(id, deep);
        let node = self.node_mut(copy);
        node.name = name.to_ascii_lowercase();
        node.original_name = name.to_string();
        node.changed = true;
        Ok(copy)
    }

    // ========================================================================
    // Class helpers
    // ========================================================================

    /// Classes listed in the class attribute
    pub fn get_classes(&self, id: NodeId) -> Vec<String> {
        match self.get_attribute(id, "class") {
            Some(value) => value.split_whitespace().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Check for a class name
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_classes(id).iter().any(|c| c == class)
    }

    /// Add a class; `strict` errors when the class is already present
    pub fn add_class(&mut self, id: NodeId, class: &str, strict: bool) -> Result<(), HtmlError> {
        let mut classes = self.get_classes(id);
        if classes.iter().any(|c| c == class) {
            if strict {
                return Err(HtmlError::ClassExists(class.to_string()));
            }
            return Ok(());
        }
        classes.push(class.to_string());
        self.set_attribute(id, "class", Some(&classes.join(" ")));
        Ok(())
    }

    /// Remove a class; `strict` errors when the class is absent
    pub fn remove_class(&mut self, id: NodeId, class: &str, strict: bool) -> Result<(), HtmlError> {
        let classes = self.get_classes(id);
        if !classes.iter().any(|c| c == class) {
            if strict {
                return Err(HtmlError::ClassMissing(class.to_string()));
            }
            return Ok(());
        }
        let remaining: Vec<String> = classes.into_iter().filter(|c| c != class).collect();
        if remaining.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            self.set_attribute(id, "class", Some(&remaining.join(" ")));
        }
        Ok(())
    }

    /// Replace one class name with another
    pub fn replace_class(
        &mut self,
        id: NodeId,
        new_class: &str,
        old_class: &str,
        strict: bool,
    ) -> Result<(), HtmlError> {
        if new_class.is_empty() {
            return self.remove_class(id, old_class, strict);
        }
        if old_class.is_empty() {
            return self.add_class(id, new_class, strict);
        }
        let classes = self.get_classes(id);
        if !classes.iter().any(|c| c == old_class) {
            if strict {
                return Err(HtmlError::ClassMissing(old_class.to_string()));
            }
            return Ok(());
        }
        let replaced: Vec<String> = classes
            .into_iter()
            .map(|c| {
                if c == old_class {
                    new_class.to_string()
                } else {
                    c
                }
            })
            .collect();
        self.set_attribute(id, "class", Some(&replaced.join(" ")));
        Ok(())
    }

    // ========================================================================
    // Change tracking
    // ========================================================================

    /// Mark a node and all its ancestors as changed
    pub(crate) fn mark_changed(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node_mut(c);
            node.changed = true;
            current = node.parent;
        }
    }
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a> {
    doc: &'a Document,
    current: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.doc.node(id).parent;
        Some(id)
    }
}

/// Strip `<!-- -->` (or `<! >`) markers from raw comment markup
fn strip_comment_markers(raw: &str) -> &str {
    if let Some(inner) = raw.strip_prefix("<!--") {
        inner.strip_suffix("-->").unwrap_or(inner)
    } else if let Some(inner) = raw.strip_prefix("<!") {
        inner.strip_suffix('>').unwrap_or(inner)
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let doc = Document::new(Options::default());
        assert_eq!(doc.root(), 0);
        assert_eq!(doc.children(doc.root()), &[]);
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn test_factories_are_detached() {
        let mut doc = Document::new(Options::default());
        let div = doc.create_element("div");
        assert!(doc.node(div).parent.is_none());
        assert_eq!(doc.name(div), "div");
        let text = doc.create_text("hi");
        assert_eq!(doc.text_content(text).as_ref(), "hi");
    }

    #[test]
    fn test_set_and_get_attribute() {
        let mut doc = Document::new(Options::default());
        let div = doc.create_element("div");
        doc.set_attribute(div, "Data-X", Some("1"));
        assert_eq!(doc.get_attribute(div, "data-x").as_deref(), Some("1"));
        doc.set_attribute(div, "data-x", Some("2"));
        assert_eq!(doc.get_attribute(div, "DATA-X").as_deref(), Some("2"));
        assert_eq!(doc.attributes(div).len(), 1);
    }

    #[test]
    fn test_valueless_attribute_lookup() {
        let mut doc = Document::new(Options::default());
        let input = doc.create_element("input");
        doc.set_attribute(input, "disabled", None);
        assert_eq!(doc.get_attribute(input, "disabled"), None);
        assert_eq!(doc.attributes(input).len(), 1);
        assert!(!doc.attributes(input)[0].has_value());
    }

    #[test]
    fn test_typed_attribute_helpers() {
        let mut doc = Document::new(Options::default());
        let div = doc.create_element("div");
        doc.set_attribute(div, "tabindex", Some("3"));
        assert_eq!(doc.get_attribute_parsed(div, "tabindex", 0i32), 3);
        assert_eq!(doc.get_attribute_parsed(div, "missing", 7i32), 7);
        assert_eq!(doc.get_attribute_or(div, "missing", "d"), "d");
    }

    #[test]
    fn test_id_index_disabled() {
        let mut options = Options::default();
        options.use_id_attribute = false;
        let doc = Document::new(options);
        assert!(matches!(
            doc.get_element_by_id("x"),
            Err(HtmlError::IdIndexingDisabled)
        ));
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = Document::new(Options::default());
        let div = doc.create_element("div");
        doc.add_class(div, "a", false).unwrap();
        doc.add_class(div, "b", false).unwrap();
        assert!(doc.has_class(div, "a"));
        assert_eq!(doc.get_classes(div), vec!["a", "b"]);
        assert!(matches!(
            doc.add_class(div, "a", true),
            Err(HtmlError::ClassExists(_))
        ));
        doc.replace_class(div, "c", "a", false).unwrap();
        assert!(doc.has_class(div, "c"));
        doc.remove_class(div, "b", false).unwrap();
        doc.remove_class(div, "c", false).unwrap();
        assert_eq!(doc.get_attribute(div, "class"), None);
        assert!(matches!(
            doc.remove_class(div, "zzz", true),
            Err(HtmlError::ClassMissing(_))
        ));
    }

    #[test]
    fn test_strip_comment_markers() {
        assert_eq!(strip_comment_markers("<!-- hi -->"), " hi ");
        assert_eq!(strip_comment_markers("<!doctype html>"), "doctype html");
    }

    #[test]
    fn test_clone_node_renamed() {
        let mut doc = Document::from_html("<div class=\"box\">x</div>").unwrap();
        let root = doc.root();
        let div = doc.children(root)[0];

        let section = doc.clone_node_renamed(div, "section", true).unwrap();
        doc.append_child(root, section).unwrap();
        assert_eq!(doc.name(section), "section");
        assert_eq!(doc.outer_html(section), "<section class=\"box\">x</section>");
        // the source element is untouched
        assert_eq!(doc.name(div), "div");

        let text = doc.children(div)[0];
        assert!(doc.clone_node_renamed(text, "b", true).is_err());
    }
}
