//! Serialization
//!
//! Clean nodes (never mutated since parsing) serialize as exact slices of the
//! source text, so a parse/save round trip is byte-identical. Changed nodes
//! are regenerated from the tree, honoring the output options.

use std::borrow::Cow;

use crate::dom::attribute::{Attribute, QuoteStyle};
use crate::dom::document::Document;
use crate::dom::node::{Node, NodeId, NodeKind};

/// Clean nodes serialize as source slices. An element left without an end tag
/// in the source is the exception: regenerating it synthesizes the end tag.
fn writes_as_slice(node: &Node) -> bool {
    !node.changed && (node.kind != NodeKind::Element || node.closed)
}

impl Document {
    /// Full markup of a node
    ///
    /// Returns a borrowed source slice while the node is unchanged.
    pub fn outer_html(&self, id: NodeId) -> Cow<'_, str> {
        let node = self.node(id);
        if node.kind == NodeKind::Document {
            if !node.changed {
                return Cow::Borrowed(&self.text);
            }
            let mut out = String::new();
            self.write_content_to(id, &mut out);
            return Cow::Owned(out);
        }
        if writes_as_slice(node) {
            return Cow::Borrowed(&self.text[node.outer.start..node.outer.end()]);
        }
        let mut out = String::new();
        self.write_to(id, &mut out);
        Cow::Owned(out)
    }

    /// Markup of a node's content, between its start and end tags
    pub fn inner_html(&self, id: NodeId) -> Cow<'_, str> {
        let node = self.node(id);
        if node.kind == NodeKind::Document {
            if !node.changed {
                return Cow::Borrowed(&self.text);
            }
        } else if writes_as_slice(node) {
            return Cow::Borrowed(&self.text[node.inner.start..node.inner.end()]);
        }
        let mut out = String::new();
        self.write_content_to(id, &mut out);
        Cow::Owned(out)
    }

    /// Serialize the whole document
    pub fn save(&self) -> String {
        self.outer_html(self.root()).into_owned()
    }

    /// Serialize the document content wrapped in a standard XHTML shell
    ///
    /// The tree becomes the body of a fixed frame: an `html` element with the
    /// XHTML namespace, a `head` declaring UTF-8, and a `body` holding the
    /// parsed content.
    pub fn save_structured(&self) -> String {
        let mut out = String::new();
        self.write_structured_to(&mut out);
        out
    }

    /// Write the XHTML-framed form of the document to a buffer
    pub fn write_structured_to(&self, out: &mut String) {
        out.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">");
        out.push_str("<head>");
        out.push_str(
            "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\" />",
        );
        out.push_str("</head>");
        out.push_str("<body>");
        self.write_content_to(self.root(), out);
        out.push_str("</body>");
        out.push_str("</html>");
    }

    /// Concatenated text of the subtree
    ///
    /// Strips newlines and tabs outside `pre` content; skips the raw text of
    /// script and style elements.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_inner_text(id, &mut out, false);
        out
    }

    /// Like `inner_text`, but the raw content of script and style elements is
    /// included
    pub fn inner_text_with_scripts(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_inner_text(id, &mut out, true);
        out
    }

    fn collect_inner_text(&self, id: NodeId, out: &mut String, include_hidden: bool) {
        let node = self.node(id);
        if node.hide_inner_text && !include_hidden {
            return;
        }
        if node.kind == NodeKind::Text {
            let text = self.text_content(id);
            let in_pre = node
                .parent
                .is_some_and(|p| self.name(p) == "pre");
            if in_pre {
                out.push_str(&text);
            } else {
                for c in text.chars() {
                    if !matches!(c, '\n' | '\r' | '\t') {
                        out.push(c);
                    }
                }
            }
            return;
        }
        for &child in &node.children {
            self.collect_inner_text(child, out, include_hidden);
        }
    }

    /// Write a node's markup to a buffer
    pub fn write_to(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if writes_as_slice(node) && node.kind != NodeKind::Document && !node.outer.is_empty() {
            out.push_str(&self.text[node.outer.start..node.outer.end()]);
            return;
        }

        match node.kind {
            NodeKind::Document => self.write_content_to(id, out),
            NodeKind::Text => out.push_str(&self.text_content(id)),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&self.text_content(id));
                out.push_str("-->");
            }
            NodeKind::Element => self.write_element_to(id, out),
        }
    }

    /// Write the markup of a node's children to a buffer
    pub fn write_content_to(&self, id: NodeId, out: &mut String) {
        for &child in &self.node(id).children {
            self.write_to(child, out);
        }
    }

    fn write_element_to(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        let name = self.output_name(id);

        out.push('<');
        out.push_str(&name);
        self.write_attributes(&node.attributes, out);

        if node.has_children() {
            out.push('>');

            if self.options.element_flags.is_cdata_element(&node.name) {
                // old-browser-friendly raw block: the only child is text
                out.push_str("\r\n//<![CDATA[\r\n");
                if let Some(first) = node.first_child() {
                    self.write_to(first, out);
                }
                out.push_str("\r\n//]]>//\r\n");
            } else {
                self.write_content_to(id, out);
            }

            if !node.implicit_end {
                out.push_str("</");
                out.push_str(&name);
                if let Some(end) = node.end_node {
                    if end != id {
                        self.write_attributes(&self.node(end).attributes, out);
                    }
                }
                out.push('>');
            }
        } else if self.options.element_flags.is_empty_element(&node.name) {
            if self.options.write_empty_nodes {
                out.push_str(" />");
            } else {
                if node.name.starts_with('?') {
                    out.push('?');
                }
                out.push('>');
            }
        } else if !node.implicit_end {
            out.push_str("></");
            out.push_str(&name);
            out.push('>');
        } else {
            out.push('>');
        }
    }

    fn output_name(&self, id: NodeId) -> String {
        let node = self.node(id);
        if self.options.output_original_case {
            node.original_name.clone()
        } else if self.options.output_upper_case {
            node.name.to_ascii_uppercase()
        } else {
            node.name.clone()
        }
    }

    fn write_attributes(&self, attributes: &[Attribute], out: &mut String) {
        for attr in attributes {
            self.write_attribute(attr, out);
        }
    }

    fn write_attribute(&self, attr: &Attribute, out: &mut String) {
        let name = if self.options.output_original_case {
            attr.original_name.clone()
        } else if self.options.output_upper_case {
            attr.name.to_ascii_uppercase()
        } else {
            attr.name.clone()
        };

        // server-side blocks parsed as attribute names pass through bare
        if name.starts_with("<%") && name.ends_with("%>") {
            out.push(' ');
            out.push_str(&name);
            return;
        }

        let value = match attr.resolve_value(&self.text) {
            Some(v) => v,
            None => {
                out.push(' ');
                out.push_str(&name);
                return;
            }
        };

        out.push(' ');
        out.push_str(&name);
        out.push('=');

        let has_whitespace = value.contains([' ', '\t', '\n', '\r']);
        if self.options.output_optimize_attribute_values && !has_whitespace {
            out.push_str(&value);
            return;
        }

        match attr.quote {
            QuoteStyle::Single => {
                out.push('\'');
                out.push_str(&value.replace('\'', "&#39;"));
                out.push('\'');
            }
            QuoteStyle::Unquoted if !has_whitespace => {
                out.push_str(&value);
            }
            _ => {
                out.push('"');
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
        }
    }
}
