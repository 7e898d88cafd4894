//! Streaming HTML parser
//!
//! A single-pass state machine over the document text that folds tags into
//! the arena tree as they complete. Malformed markup never fails the parse:
//! problems are recorded in the document's error log and recovery rules
//! (implicit ends, explicit ends, resetters, retroactive void tags) keep
//! producing a tree.
//!
//! The machine tracks:
//! - `lastnodes`: per-name most recently opened element, for end-tag matching
//! - `openednodes`: all still-open start tags by source offset, for
//!   unclosed-tag reporting and nesting repair
//! - `last_parent`: the insertion point for completed nodes

use std::collections::HashMap;

use log::trace;

use crate::core::crc32::Crc32;
use crate::core::elements;
use crate::core::encoding;
use crate::core::scanner::{self, Scanner};
use crate::dom::attribute::{AttrValue, Attribute, QuoteStyle};
use crate::dom::document::{Document, Remainder};
use crate::dom::node::{Node, NodeId, NodeKind, Span};
use crate::error::{HtmlError, ParseError, ParseErrorKind};

/// States of the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Text,
    WhichTag,
    Tag,
    BetweenAttributes,
    EmptyTag,
    AttributeName,
    AttributeBeforeEquals,
    AttributeAfterEquals,
    AttributeValue,
    Comment,
    QuotedAttributeValue,
    ServerSideCode,
    PcData,
}

/// Why a parse run stopped before consuming all input
enum Halt {
    /// Detection-only run found a declared charset
    EncodingFound,
    /// A hard resource limit was hit
    Fatal(HtmlError),
}

impl From<HtmlError> for Halt {
    fn from(err: HtmlError) -> Self {
        Halt::Fatal(err)
    }
}

impl Document {
    pub(crate) fn run_parse(&mut self) -> Result<(), HtmlError> {
        Parser::new(self, false).run()
    }

    pub(crate) fn run_detect_encoding(&mut self) -> Result<(), HtmlError> {
        Parser::new(self, true).run()
    }
}

struct Parser<'d> {
    doc: &'d mut Document,
    state: ParseState,
    oldstate: ParseState,
    /// Position just past the character currently being processed
    index: usize,
    c: u8,
    line: u32,
    line_position: u32,
    max_line_position: u32,
    fullcomment: bool,
    lastquote: u8,
    /// Node being assembled
    current: NodeId,
    /// Name start offset of the current node (0 = no name started)
    name_start: usize,
    attr_name_start: usize,
    attr_line: u32,
    attr_column: u32,
    attr_value_start: usize,
    /// The pending attribute was accepted onto the current node
    attr_active: bool,
    lastnodes: HashMap<String, NodeId>,
    openednodes: HashMap<usize, NodeId>,
    last_parent: NodeId,
    crc: Option<Crc32>,
    only_detect_encoding: bool,
    /// The stopper node ended parsing early
    stopped: bool,
}

impl<'d> Parser<'d> {
    fn new(doc: &'d mut Document, only_detect_encoding: bool) -> Self {
        Parser {
            doc,
            state: ParseState::Text,
            oldstate: ParseState::Text,
            index: 0,
            c: 0,
            line: 1,
            line_position: 0,
            max_line_position: 0,
            fullcomment: false,
            lastquote: 0,
            current: 0,
            name_start: 0,
            attr_name_start: 0,
            attr_line: 0,
            attr_column: 0,
            attr_value_start: 0,
            attr_active: false,
            lastnodes: HashMap::new(),
            openednodes: HashMap::new(),
            last_parent: 0,
            crc: None,
            only_detect_encoding,
            stopped: false,
        }
    }

    fn run(mut self) -> Result<(), HtmlError> {
        match self.parse_all() {
            Ok(()) | Err(Halt::EncodingFound) => {}
            Err(Halt::Fatal(err)) => return Err(err),
        }
        // an element with no end tag in the source cannot round-trip as a
        // slice; flag the document so serialization synthesizes the end tag
        if self
            .openednodes
            .values()
            .any(|&id| self.doc.node(id).start_tag && !self.doc.node(id).closed)
        {
            let root = self.doc.root();
            self.doc.mark_changed(root);
        }
        if self.doc.options.check_syntax && !self.only_detect_encoding {
            self.report_unclosed();
        }
        self.doc.checksum = self.crc.take().map(|crc| crc.checksum());
        Ok(())
    }

    // ========================================================================
    // Main loop
    // ========================================================================

    fn parse_all(&mut self) -> Result<(), Halt> {
        let len = self.len();
        if self.doc.options.compute_checksum {
            self.crc = Some(Crc32::new());
        }
        let root = self.doc.root();
        self.doc.node_mut(root).outer = Span::new(0, len);
        self.doc.node_mut(root).inner = Span::new(0, len);
        self.last_parent = root;

        self.push_node_start(NodeKind::Text, 0, self.line_position);
        while self.index < len {
            self.c = self.byte(self.index);
            self.increment_position();

            match self.state {
                ParseState::Text => {
                    if self.new_check()? {
                        continue;
                    }
                    self.skip_text_run();
                }

                ParseState::WhichTag => {
                    if self.new_check()? {
                        continue;
                    }
                    if self.c == b'/' {
                        self.push_node_name_start(false, self.index);
                    } else {
                        self.push_node_name_start(true, self.index - 1);
                        self.decrement_position();
                    }
                    self.state = ParseState::Tag;
                }

                ParseState::Tag => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        self.close_parent_implicit_explicit_node()?;
                        self.push_node_name_end(self.index - 1)?;
                        if self.state != ParseState::Tag {
                            continue;
                        }
                        self.state = ParseState::BetweenAttributes;
                        continue;
                    }
                    if self.c == b'/' {
                        self.close_parent_implicit_explicit_node()?;
                        self.push_node_name_end(self.index - 1)?;
                        if self.state != ParseState::Tag {
                            continue;
                        }
                        self.state = ParseState::EmptyTag;
                        continue;
                    }
                    if self.c == b'>' {
                        self.close_parent_implicit_explicit_node()?;
                        self.push_node_name_end(self.index - 1)?;
                        if self.state != ParseState::Tag {
                            continue;
                        }
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::Tag {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                    }
                }

                ParseState::BetweenAttributes => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        continue;
                    }
                    if self.c == b'/' || self.c == b'?' {
                        self.state = ParseState::EmptyTag;
                        continue;
                    }
                    if self.c == b'>' {
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::BetweenAttributes {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                        continue;
                    }
                    self.push_attribute_name_start(
                        self.index - 1,
                        self.line_position.saturating_sub(1),
                    );
                    self.state = ParseState::AttributeName;
                }

                ParseState::EmptyTag => {
                    if self.new_check()? {
                        continue;
                    }
                    if self.c == b'>' {
                        if !self.push_node_end(self.index, true)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::EmptyTag {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                        continue;
                    }
                    // a stray '/' between attributes: resume attribute parsing
                    if !scanner::is_whitespace(self.c) {
                        self.decrement_position();
                    }
                    self.state = ParseState::BetweenAttributes;
                }

                ParseState::AttributeName => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        self.push_attribute_name_end(self.index - 1);
                        self.state = ParseState::AttributeBeforeEquals;
                        continue;
                    }
                    if self.c == b'=' {
                        self.push_attribute_name_end(self.index - 1);
                        self.state = ParseState::AttributeAfterEquals;
                        continue;
                    }
                    if self.c == b'>' {
                        self.push_attribute_name_end(self.index - 1);
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::AttributeName {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                    }
                }

                ParseState::AttributeBeforeEquals => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        continue;
                    }
                    if self.c == b'>' {
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::AttributeBeforeEquals {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                        continue;
                    }
                    if self.c == b'=' {
                        self.state = ParseState::AttributeAfterEquals;
                        continue;
                    }
                    // no equals: a new attribute starts here
                    self.state = ParseState::BetweenAttributes;
                    self.decrement_position();
                }

                ParseState::AttributeAfterEquals => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        continue;
                    }
                    if self.c == b'\'' || self.c == b'"' {
                        self.state = ParseState::QuotedAttributeValue;
                        self.push_attribute_value_start(self.index, self.c);
                        self.lastquote = self.c;
                        continue;
                    }
                    if self.c == b'>' {
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::AttributeAfterEquals {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                        continue;
                    }
                    self.push_attribute_value_start(self.index - 1, 0);
                    self.state = ParseState::AttributeValue;
                }

                ParseState::AttributeValue => {
                    if self.new_check()? {
                        continue;
                    }
                    if scanner::is_whitespace(self.c) {
                        self.push_attribute_value_end(self.index - 1);
                        self.state = ParseState::BetweenAttributes;
                        continue;
                    }
                    if self.c == b'>' {
                        self.push_attribute_value_end(self.index - 1);
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        if self.state != ParseState::AttributeValue {
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                    }
                }

                ParseState::QuotedAttributeValue => {
                    if self.c == self.lastquote {
                        self.push_attribute_value_end(self.index - 1);
                        self.state = ParseState::BetweenAttributes;
                        continue;
                    }
                    if self.c == b'<' && self.scan().byte_at(self.index) == Some(b'%') {
                        self.oldstate = self.state;
                        self.state = ParseState::ServerSideCode;
                    }
                }

                ParseState::Comment => {
                    if self.c == b'>' {
                        if self.fullcomment && !self.comment_ends_here() {
                            continue;
                        }
                        if !self.push_node_end(self.index, false)? {
                            self.index = len;
                            continue;
                        }
                        self.state = ParseState::Text;
                        self.push_node_start(NodeKind::Text, self.index, self.line_position);
                    }
                }

                ParseState::ServerSideCode => {
                    if self.c == b'%' {
                        if self.scan().byte_at(self.index) == Some(b'>') {
                            match self.oldstate {
                                ParseState::AttributeAfterEquals => {
                                    self.state = ParseState::AttributeValue;
                                }
                                ParseState::BetweenAttributes => {
                                    self.push_attribute_name_end(self.index + 1);
                                    self.state = ParseState::BetweenAttributes;
                                }
                                _ => self.state = self.oldstate,
                            }
                            self.increment_position();
                        }
                    } else if self.oldstate == ParseState::QuotedAttributeValue
                        && self.c == self.lastquote
                    {
                        self.state = self.oldstate;
                        self.decrement_position();
                    }
                }

                ParseState::PcData => {
                    if self.c != b'<' {
                        self.skip_text_run();
                        continue;
                    }
                    self.check_raw_text_end()?;
                }
            }
        }

        // finish whatever the input was cut off in the middle of
        if !self.stopped {
            if self.name_start > 0 {
                self.push_node_name_end(self.index)?;
            }
            self.push_node_end(self.index, false)?;
        }

        trace!(
            "parsed {} chars into {} nodes, {} still open",
            len,
            self.doc.nodes.len(),
            self.openednodes.len()
        );
        Ok(())
    }

    // ========================================================================
    // Tag recognition
    // ========================================================================

    fn is_valid_tag(&self) -> bool {
        self.c == b'<' && self.scan().byte_at(self.index).is_some_and(scanner::opens_markup)
    }

    /// Called on `<` from most states: starts a new tag, comment or
    /// server-side block. Returns true when the state machine switched.
    fn new_check(&mut self) -> Result<bool, Halt> {
        if self.c != b'<' || !self.is_valid_tag() {
            return Ok(false);
        }

        if self.scan().byte_at(self.index) == Some(b'%') {
            if self.doc.options.disable_server_side_code {
                return Ok(false);
            }
            match self.state {
                ParseState::AttributeAfterEquals => {
                    self.push_attribute_value_start(self.index - 1, 0);
                }
                ParseState::BetweenAttributes => {
                    self.push_attribute_name_start(
                        self.index - 1,
                        self.line_position.saturating_sub(1),
                    );
                }
                ParseState::WhichTag => {
                    self.push_node_name_start(true, self.index - 1);
                    self.state = ParseState::Tag;
                }
                _ => {}
            }
            self.oldstate = self.state;
            self.state = ParseState::ServerSideCode;
            return Ok(true);
        }

        if !self.push_node_end(self.index - 1, true)? {
            self.index = self.len();
            return Ok(true);
        }

        self.state = ParseState::WhichTag;
        if self.index < self.len() {
            let next = self.scan().byte_at(self.index);
            if next == Some(b'!') || next == Some(b'?') {
                self.push_node_start(
                    NodeKind::Comment,
                    self.index - 1,
                    self.line_position.saturating_sub(1),
                );
                self.push_node_name_start(true, self.index);
                self.push_node_name_end(self.index + 1)?;
                self.state = ParseState::Comment;
                // byte_at clamps at the buffer end, so a comment opened in the
                // last bytes of input cannot inherit a stale classification
                self.fullcomment = self.scan().byte_at(self.index + 1) == Some(b'-')
                    && self.scan().byte_at(self.index + 2) == Some(b'-');
                return Ok(true);
            }
        }

        self.push_node_start(
            NodeKind::Element,
            self.index - 1,
            self.line_position.saturating_sub(1),
        );
        Ok(true)
    }

    /// A `>` inside a `<!--` comment only ends it after `--` (or `--!`)
    fn comment_ends_here(&self) -> bool {
        let scan = self.scan();
        let i = self.index;
        if i >= 3 && scan.byte_at(i - 2) == Some(b'-') && scan.byte_at(i - 3) == Some(b'-') {
            return true;
        }
        i >= 4
            && scan.byte_at(i - 2) == Some(b'!')
            && scan.byte_at(i - 3) == Some(b'-')
            && scan.byte_at(i - 4) == Some(b'-')
    }

    /// Raw-text content scan: look for `</name` followed by `>` or whitespace
    fn check_raw_text_end(&mut self) -> Result<(), Halt> {
        let name = self.doc.node(self.current).name.clone();
        let name_len = name.len();
        if name_len + 3 > self.len() - (self.index - 1) {
            return Ok(());
        }

        let mut needle = Vec::with_capacity(name_len + 2);
        needle.extend_from_slice(b"</");
        needle.extend_from_slice(name.as_bytes());
        let scan = self.scan();
        if !scan.matches_ignore_case_at(self.index - 1, &needle) {
            return Ok(());
        }
        let after = scan.byte_at(self.index - 1 + 2 + name_len);
        if after != Some(b'>') && !after.is_some_and(scanner::is_whitespace) {
            return Ok(());
        }

        // everything between the start tag and here is one text child
        let (start, elem_line, elem_column) = {
            let node = self.doc.node(self.current);
            (node.outer.end(), node.line, node.column)
        };
        let mut raw = Node::parsed(
            NodeKind::Text,
            start,
            elem_line,
            elem_column + name_len as u32 + 2,
        );
        raw.outer.len = (self.index - 1) - start;
        raw.inner = raw.outer;
        let raw_id = self.doc.push_node(raw);
        self.parse_append(self.current, raw_id)?;

        // script and style content is invisible to inner-text extraction
        if name == "script" || name == "style" {
            self.doc.node_mut(self.current).hide_inner_text = true;
        }

        self.push_node_start(
            NodeKind::Element,
            self.index - 1,
            self.line_position.saturating_sub(1),
        );
        self.push_node_name_start(false, self.index - 1 + 2);
        self.state = ParseState::Tag;
        self.increment_position();
        Ok(())
    }

    // ========================================================================
    // Node assembly
    // ========================================================================

    fn push_node_start(&mut self, kind: NodeKind, index: usize, lineposition: u32) {
        let node = Node::parsed(kind, index, self.line, lineposition);
        let id = self.doc.push_node(node);
        self.current = id;
        self.name_start = 0;
        if kind == NodeKind::Element {
            self.openednodes.insert(index, id);
        }
    }

    fn push_node_name_start(&mut self, starttag: bool, index: usize) {
        self.doc.node_mut(self.current).start_tag = starttag;
        self.name_start = index;
    }

    fn push_node_name_end(&mut self, index: usize) -> Result<(), Halt> {
        if self.doc.node(self.current).kind == NodeKind::Element {
            let raw = self.doc.text[self.name_start..index].to_string();
            let node = self.doc.node_mut(self.current);
            node.name = raw.to_ascii_lowercase();
            node.original_name = raw;
        }
        if self.doc.options.fix_nested_tags {
            self.fix_nested_tag()?;
        }
        Ok(())
    }

    /// Seal the current node at `index` and fold it into the tree.
    /// Returns false when the stopper node ended parsing.
    fn push_node_end(&mut self, index: usize, close: bool) -> Result<bool, Halt> {
        let mut close = close;
        let current = self.current;
        {
            let node = self.doc.node_mut(current);
            // a stopper or EOF re-flush must not stretch an already sealed tag
            if !(node.kind == NodeKind::Element && node.closed) {
                node.outer.len = index - node.outer.start;
            }
        }

        let kind = self.doc.node(current).kind;
        if kind == NodeKind::Text || kind == NodeKind::Comment {
            if self.doc.node(current).outer.len > 0 {
                {
                    let node = self.doc.node_mut(current);
                    node.inner = node.outer;
                }
                self.parse_append(self.last_parent, current)?;
            }
        } else if self.doc.node(current).start_tag
            && self.last_parent != current
            && self.doc.node(current).parent.is_none()
        {
            self.parse_append(self.last_parent, current)?;
            self.read_document_encoding(current)?;

            let name = self.doc.node(current).name.clone();
            let prev = self.lastnodes.get(&name).copied();
            self.doc.node_mut(current).prev_with_same_name = prev;
            self.lastnodes.insert(name.clone(), current);

            if matches!(kind, NodeKind::Document | NodeKind::Element) {
                self.last_parent = current;
            }

            if self.doc.options.element_flags.is_cdata_element(&name) {
                self.state = ParseState::PcData;
                return Ok(true);
            }
            if self.doc.options.element_flags.is_closed_element(&name)
                || self.doc.options.element_flags.is_empty_element(&name)
            {
                close = true;
            }
        }

        if close || !self.doc.node(current).start_tag {
            let stopper = self.doc.options.stopper_node_name.clone();
            if let Some(stopper) = stopper {
                if self.doc.remainder.is_none()
                    && self.doc.node(current).name.eq_ignore_ascii_case(&stopper)
                {
                    self.doc.remainder = Some(Remainder {
                        offset: index,
                        text: self.doc.text[index..].to_string(),
                    });
                    self.stopped = true;
                    self.close_current_node()?;
                    return Ok(false);
                }
            }
            self.close_current_node()?;
        }
        Ok(true)
    }

    /// Resolve the node just sealed against the open-element bookkeeping
    fn close_current_node(&mut self) -> Result<(), Halt> {
        let current = self.current;
        if self.doc.node(current).kind != NodeKind::Element {
            return Ok(());
        }
        if self.doc.node(current).closed {
            return Ok(());
        }

        let name = self.doc.node(current).name.clone();
        let is_closed = self.doc.options.element_flags.is_closed_element(&name);
        let can_overlap = self.doc.options.element_flags.can_overlap_element(&name);
        let is_empty = self.doc.options.element_flags.is_empty_element(&name);
        let mut error = false;

        match self.lastnodes.get(&name).copied() {
            None => {
                if is_closed {
                    // a stray end tag of a void element stands in for the
                    // start tag: splice it in before its former next siblings
                    self.close_node(current, current, 0)?;
                    let last_parent = self.last_parent;
                    let mut found = None;
                    let mut future = Vec::new();
                    let mut walk = self.doc.node(last_parent).last_child();
                    while let Some(id) = walk {
                        let node = self.doc.node(id);
                        if node.name == name && (!node.is_element() || !node.has_children()) {
                            found = Some(id);
                            break;
                        }
                        future.push(id);
                        walk = node.prev_sibling;
                    }
                    match found {
                        Some(found) => {
                            while let Some(id) = future.pop() {
                                self.doc
                                    .remove_child(last_parent, id)
                                    .map_err(Halt::from)?;
                                self.doc.append_child(found, id).map_err(Halt::from)?;
                            }
                        }
                        None => {
                            self.doc
                                .append_child(last_parent, current)
                                .map_err(Halt::from)?;
                        }
                    }
                } else if can_overlap {
                    // tolerated overlap: keep the stray end tag as text
                    let (start, outer_len, line, column) = {
                        let node = self.doc.node(current);
                        (node.outer.start, node.outer.len, node.line, node.column)
                    };
                    let mut stray = Node::parsed(NodeKind::Text, start, line, column);
                    stray.outer.len = outer_len;
                    stray.inner = stray.outer;
                    stray.text = Some(self.doc.text[start..start + outer_len].to_ascii_lowercase());
                    let stray_id = self.doc.push_node(stray);
                    let last_parent = self.last_parent;
                    self.doc
                        .append_child(last_parent, stray_id)
                        .map_err(Halt::from)?;
                } else if is_empty {
                    self.add_error(
                        ParseErrorKind::EndTagNotRequired,
                        current,
                        format!("End tag </{}> is not required", name),
                    );
                } else {
                    // no open element to match: drop the end tag
                    self.add_error(
                        ParseErrorKind::TagNotOpened,
                        current,
                        format!("Start tag <{}> was not found", name),
                    );
                    error = true;
                }
            }
            Some(prev) => {
                if self.doc.options.fix_nested_tags
                    && self.find_resetter_nodes(prev, elements::resetters(&name))
                {
                    self.add_error(
                        ParseErrorKind::EndTagInvalidHere,
                        current,
                        format!("End tag </{}> invalid here", name),
                    );
                    error = true;
                }
                if !error {
                    match self.doc.node(prev).prev_with_same_name {
                        Some(older) => {
                            self.lastnodes.insert(name.clone(), older);
                        }
                        None => {
                            self.lastnodes.remove(&name);
                        }
                    }
                    if self.doc.node(prev).is_element() {
                        self.close_node(prev, current, 0)?;
                    }
                }
            }
        }

        if !error && (!is_closed || self.doc.node(current).start_tag) {
            self.update_last_parent_node();
        }
        Ok(())
    }

    /// Close `node` with `endnode` as its end tag (`endnode == node` means a
    /// synthesized close with no source extent)
    fn close_node(&mut self, node: NodeId, endnode: NodeId, level: usize) -> Result<(), Halt> {
        let end_span = if endnode == node {
            None
        } else {
            Some(self.doc.node(endnode).outer)
        };
        self.close_node_at(node, endnode, end_span, level)
    }

    fn close_node_at(
        &mut self,
        node: NodeId,
        endnode: NodeId,
        end_span: Option<Span>,
        level: usize,
    ) -> Result<(), Halt> {
        let max = self.doc.options.max_depth_level;
        if level > max {
            return Err(Halt::Fatal(HtmlError::DepthExceeded(max)));
        }

        if !self.doc.options.auto_close_on_end {
            // children left open get a synthesized close at the parent's end
            let child_end = end_span.map(|span| Span::new(span.start, 0));
            for child in self.doc.node(node).children.clone() {
                let c = self.doc.node(child);
                if c.is_element() && !c.closed {
                    self.close_node_at(child, child, child_end, level + 1)?;
                }
            }
        }

        if self.doc.node(node).closed {
            return Ok(());
        }
        let outer_start = self.doc.node(node).outer.start;
        {
            let n = self.doc.node_mut(node);
            n.end_node = Some(endnode);
            n.closed = true;
        }
        self.openednodes.remove(&outer_start);

        let name = self.doc.node(node).name.clone();
        if self.lastnodes.get(&name) == Some(&node) {
            self.lastnodes.remove(&name);
            self.update_last_parent_node();
            if self.doc.node(node).start_tag && !name.is_empty() {
                self.update_last_node(node);
            }
        }

        if let Some(span) = end_span {
            let n = self.doc.node_mut(node);
            n.inner.start = n.outer.end();
            n.inner.len = span.start.saturating_sub(n.inner.start);
            n.outer.len = span.end() - n.outer.start;
        }
        Ok(())
    }

    // ========================================================================
    // Open-element bookkeeping
    // ========================================================================

    /// Move the insertion point up past closed elements
    fn update_last_parent_node(&mut self) {
        let mut node = self.last_parent;
        while self.doc.node(node).closed {
            match self.doc.node(node).parent {
                Some(parent) => node = parent,
                None => {
                    node = self.doc.root();
                    break;
                }
            }
        }
        self.last_parent = node;
    }

    /// After closing `node`, find the next candidate for its name
    fn update_last_node(&mut self, node: NodeId) {
        let prev = self.doc.node(node).prev_with_same_name;
        let new_last = match prev {
            Some(p) if self.doc.node(p).start_tag => Some(p),
            _ => {
                let outer = self.doc.node(node).outer;
                let original = self.doc.node(node).original_name.clone();
                let mut best: Option<(usize, NodeId)> = None;
                for (&start, &open) in &self.openednodes {
                    if start >= outer.start && start <= outer.end() {
                        continue;
                    }
                    let candidate = self.doc.node(open);
                    if !candidate.start_tag || candidate.original_name != original {
                        continue;
                    }
                    if best.is_none_or(|(s, _)| start > s) {
                        best = Some((start, open));
                    }
                }
                best.map(|(_, id)| id)
            }
        };
        if let Some(new_last) = new_last {
            let name = self.doc.node(new_last).name.clone();
            self.lastnodes.insert(name, new_last);
        }
    }

    fn find_resetter_node(&self, node: NodeId, name: &str) -> Option<NodeId> {
        let resetter = self.lastnodes.get(name).copied()?;
        if self.doc.node(resetter).closed {
            return None;
        }
        if self.doc.node(resetter).stream_position < self.doc.node(node).stream_position {
            return None;
        }
        Some(resetter)
    }

    fn find_resetter_nodes(&self, node: NodeId, names: Option<&'static [&'static str]>) -> bool {
        match names {
            Some(names) => names
                .iter()
                .any(|name| self.find_resetter_node(node, name).is_some()),
            None => false,
        }
    }

    /// With nesting repair on, a repeated unclosed list/table cell closes its
    /// predecessor unless a resetter container was opened in between
    fn fix_nested_tag(&mut self) -> Result<(), Halt> {
        if !self.doc.node(self.current).start_tag {
            return Ok(());
        }
        let name = self.doc.node(self.current).name.clone();
        let resetters = match elements::resetters(&name) {
            Some(r) => r,
            None => return Ok(()),
        };
        let prev = match self.lastnodes.get(&name).copied() {
            Some(p) => p,
            None => return Ok(()),
        };
        if self.doc.node(prev).closed {
            return Ok(());
        }
        if self.find_resetter_nodes(prev, Some(resetters)) {
            return Ok(());
        }
        let pos = self.doc.node(self.current).outer.start;
        self.close_node_at(prev, prev, Some(Span::new(pos, 0)), 0)
    }

    // ========================================================================
    // Implicit and explicit parent closing
    // ========================================================================

    /// Name of the start tag currently being read (before its name end)
    fn incoming_name(&self) -> String {
        self.doc.text[self.name_start..self.index - 1].to_ascii_lowercase()
    }

    fn is_parent_implicit_end(&self) -> bool {
        if !self.doc.node(self.current).start_tag {
            return false;
        }
        let parent = self.doc.node(self.last_parent).name();
        elements::parent_implicit_end(parent, &self.incoming_name(), self.doc.options.p_as_empty)
    }

    fn is_parent_explicit_end(&self) -> bool {
        if !self.doc.node(self.current).start_tag {
            return false;
        }
        let parent = self.doc.node(self.last_parent).name();
        elements::parent_explicit_end(parent, &self.incoming_name())
    }

    fn close_parent_implicit_explicit_node(&mut self) -> Result<(), Halt> {
        loop {
            if self.doc.node(self.last_parent).closed {
                break;
            }
            let mut closed_one = false;
            if self.is_parent_implicit_end() {
                self.close_parent_implicit_end()?;
                closed_one = true;
            }
            if !self.doc.node(self.last_parent).closed && self.is_parent_explicit_end() {
                self.close_parent_explicit_end()?;
                closed_one = true;
            }
            if !closed_one {
                break;
            }
        }
        Ok(())
    }

    /// Close the insertion parent just before the incoming tag, suppressing
    /// its end tag on output
    fn close_parent_implicit_end(&mut self) -> Result<(), Halt> {
        let parent = self.last_parent;
        let pos = self.doc.node(self.current).outer.start;
        self.doc.node_mut(parent).implicit_end = true;
        self.close_node_at(parent, parent, Some(Span::new(pos, 0)), 0)
    }

    /// Close the insertion parent as if its end tag had been written
    fn close_parent_explicit_end(&mut self) -> Result<(), Halt> {
        let parent = self.last_parent;
        let pos = self.doc.node(self.current).outer.start;
        self.close_node_at(parent, parent, Some(Span::new(pos, 0)), 0)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    fn push_attribute_name_start(&mut self, index: usize, lineposition: u32) {
        self.attr_name_start = index;
        self.attr_line = self.line;
        self.attr_column = lineposition;
        self.attr_active = false;
    }

    fn push_attribute_name_end(&mut self, index: usize) {
        let raw = self.doc.text[self.attr_name_start..index].to_string();
        // stray quote characters are not attribute names
        if raw == "\"" || raw == "'" {
            return;
        }
        let attr = Attribute {
            name: raw.to_ascii_lowercase(),
            original_name: raw,
            value: AttrValue::Missing,
            quote: QuoteStyle::Double,
            line: self.attr_line,
            column: self.attr_column,
            stream_position: self.attr_name_start,
        };
        self.doc.node_mut(self.current).attributes.push(attr);
        self.attr_active = true;
    }

    fn push_attribute_value_start(&mut self, index: usize, quote: u8) {
        self.attr_value_start = index;
        if self.attr_active {
            if let Some(attr) = self.doc.node_mut(self.current).attributes.last_mut() {
                attr.quote = match quote {
                    b'\'' => QuoteStyle::Single,
                    b'"' => QuoteStyle::Double,
                    _ => QuoteStyle::Unquoted,
                };
            }
        }
    }

    fn push_attribute_value_end(&mut self, index: usize) {
        if self.attr_active {
            let span = Span::new(self.attr_value_start, index - self.attr_value_start);
            if let Some(attr) = self.doc.node_mut(self.current).attributes.last_mut() {
                attr.value = AttrValue::Spanned(span);
            }
        }
    }

    // ========================================================================
    // Tree plumbing
    // ========================================================================

    /// Attach a parsed node without marking anything changed: the source
    /// spans stay authoritative
    fn parse_append(&mut self, parent: NodeId, child: NodeId) -> Result<(), Halt> {
        let depth = self.doc.node(parent).depth + 1;
        let max = self.doc.options.max_nested_child_nodes;
        if max > 0 && depth as usize > max {
            return Err(Halt::Fatal(HtmlError::TooManyNestedChildren(max)));
        }

        let last = self.doc.node(parent).last_child();
        if let Some(last) = last {
            self.doc.node_mut(last).next_sibling = Some(child);
        }
        {
            let node = self.doc.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
            node.depth = depth;
        }
        self.doc.node_mut(parent).children.push(child);
        if self.doc.node(child).is_element() {
            self.doc.register_id(child);
        }
        Ok(())
    }

    // ========================================================================
    // Declared encoding
    // ========================================================================

    fn read_document_encoding(&mut self, node: NodeId) -> Result<(), Halt> {
        if !self.doc.options.read_encoding {
            return Ok(());
        }
        if self.doc.node(node).name != "meta" {
            return Ok(());
        }

        // <meta http-equiv="content-type" content="text/html; charset=x">
        // or <meta charset="x">
        let charset: Option<String> = match self.doc.get_attribute(node, "http-equiv") {
            Some(http_equiv) => {
                if !http_equiv.eq_ignore_ascii_case("content-type") {
                    return Ok(());
                }
                self.doc
                    .get_attribute(node, "content")
                    .and_then(|content| encoding::charset_from_content(&content))
            }
            None => self
                .doc
                .get_attribute(node, "charset")
                .map(|v| v.into_owned()),
        };
        let charset = match charset {
            Some(c) if !c.is_empty() => c,
            _ => return Ok(()),
        };

        let declared = encoding::normalize_charset(&charset);
        self.doc.declared_encoding = Some(declared.clone());
        if self.only_detect_encoding {
            return Err(Halt::EncodingFound);
        }

        if let Some(stream) = self.doc.stream_encoding {
            if !declared.eq_ignore_ascii_case(stream.label()) {
                let span = self.doc.node(node).outer;
                self.add_error_at(
                    ParseErrorKind::CharsetMismatch,
                    self.line,
                    self.line_position,
                    self.index,
                    span,
                    format!(
                        "Encoding mismatch between stream encoding {} and declared encoding {}",
                        stream.label(),
                        declared
                    ),
                );
            }
        }
        Ok(())
    }

    // ========================================================================
    // Errors
    // ========================================================================

    fn error_excerpt(&self, span: Span) -> String {
        if !self.doc.options.extract_error_source_text {
            return String::new();
        }
        let end = span.end().min(self.doc.text.len());
        let raw = &self.doc.text[span.start..end];
        let max = self.doc.options.extract_error_source_text_max_length;
        match raw.char_indices().nth(max) {
            Some((cut, _)) => raw[..cut].to_string(),
            None => raw.to_string(),
        }
    }

    fn add_error(&mut self, kind: ParseErrorKind, node: NodeId, reason: String) {
        let (line, column, stream_position, span) = {
            let n = self.doc.node(node);
            (n.line, n.column, n.stream_position, n.outer)
        };
        self.add_error_at(kind, line, column, stream_position, span, reason);
    }

    fn add_error_at(
        &mut self,
        kind: ParseErrorKind,
        line: u32,
        column: u32,
        stream_position: usize,
        span: Span,
        reason: String,
    ) {
        let source = self.error_excerpt(span);
        self.doc
            .errors
            .push(ParseError::new(kind, line, column, stream_position, source, reason));
    }

    /// Record every start tag still open at end of input
    fn report_unclosed(&mut self) {
        let mut unclosed: Vec<NodeId> = self
            .openednodes
            .values()
            .copied()
            .filter(|&id| self.doc.node(id).start_tag)
            .collect();
        unclosed.sort_by_key(|&id| self.doc.node(id).stream_position);
        for id in unclosed {
            let name = self.doc.node(id).name.clone();
            self.add_error(
                ParseErrorKind::TagNotClosed,
                id,
                format!("End tag </{}> was not found", name),
            );
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    #[inline]
    fn scan(&self) -> Scanner<'_> {
        Scanner::new(self.doc.text.as_bytes())
    }

    #[inline]
    fn len(&self) -> usize {
        self.doc.text.len()
    }

    #[inline]
    fn byte(&self, index: usize) -> u8 {
        self.doc.text.as_bytes()[index]
    }

    fn increment_position(&mut self) {
        if let Some(crc) = &mut self.crc {
            crc.update(self.c);
        }
        self.index += 1;
        self.max_line_position = self.line_position;
        if self.c == b'\n' {
            self.line_position = 0;
            self.line += 1;
        } else {
            self.line_position += 1;
        }
    }

    fn decrement_position(&mut self) {
        self.index -= 1;
        if self.line_position == 0 {
            self.line_position = self.max_line_position;
            self.line = self.line.saturating_sub(1);
        } else {
            self.line_position -= 1;
        }
    }

    /// SIMD skip over plain text: jump to the next `<`, keeping the line
    /// counter and checksum fed
    fn skip_text_run(&mut self) {
        let next = match self.scan().find_tag_start_from(self.index) {
            Some(pos) => pos,
            None => self.len(),
        };
        while self.index < next {
            self.c = self.byte(self.index);
            self.increment_position();
        }
    }
}
