//! Error types
//!
//! Two layers of error reporting:
//! - `HtmlError`: hard failures returned from API calls (resource limits,
//!   misuse of the node API, invalid input bytes). Parsing itself never
//!   returns these for malformed markup.
//! - `ParseError`: recoverable markup problems recorded in the document's
//!   error log during parsing. The parser always produces a tree.

use thiserror::Error;

/// Hard errors returned by document and node operations.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// The document has more nested tags than `max_nested_child_nodes` allows.
    #[error("document has more than {0} nested tags, parsing aborted")]
    TooManyNestedChildren(usize),

    /// A recursive traversal exceeded `max_depth_level`.
    #[error("maximum depth level of {0} exceeded")]
    DepthExceeded(usize),

    /// A reference node passed to an insert/replace/remove operation is not a
    /// child of the target node.
    #[error("node is not a child of this node")]
    NotAChild,

    /// The node id does not refer to a node of the expected kind.
    #[error("operation requires a {expected} node")]
    WrongNodeKind { expected: &'static str },

    /// `get_element_by_id` was called with id indexing disabled.
    #[error("id attribute indexing is disabled (enable use_id_attribute before loading)")]
    IdIndexingDisabled,

    /// `add_class` in strict mode: the class is already present.
    #[error("class name already exists: {0}")]
    ClassExists(String),

    /// `remove_class`/`replace_class` in strict mode: the class is absent.
    #[error("class name doesn't exist: {0}")]
    ClassMissing(String),

    /// Input bytes could not be decoded to text.
    #[error("invalid input encoding: {0}")]
    InvalidEncoding(String),
}

/// Classification of a recoverable parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A start tag was never closed before end of input.
    TagNotClosed,
    /// An end tag had no matching start tag.
    TagNotOpened,
    /// An end tag for a void element that needs no end tag.
    EndTagNotRequired,
    /// An end tag found in an invalid position (nesting repair).
    EndTagInvalidHere,
    /// The charset declared in a meta tag differs from the stream encoding.
    CharsetMismatch,
}

/// A recoverable parse problem, recorded in the document error log.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line of the offending markup.
    pub line: u32,
    /// Source column within the line.
    pub column: u32,
    /// Absolute character offset in the document text.
    pub stream_position: usize,
    /// Excerpt of the offending source, capped by
    /// `extract_error_source_text_max_length` (empty unless extraction is on).
    pub source_text: String,
    /// Human-readable description.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(
        kind: ParseErrorKind,
        line: u32,
        column: u32,
        stream_position: usize,
        source_text: String,
        reason: impl Into<String>,
    ) -> Self {
        ParseError {
            kind,
            line,
            column,
            stream_position,
            source_text,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HtmlError::TooManyNestedChildren(5000);
        assert_eq!(
            err.to_string(),
            "document has more than 5000 nested tags, parsing aborted"
        );
    }

    #[test]
    fn test_parse_error_fields() {
        let err = ParseError::new(ParseErrorKind::TagNotOpened, 3, 7, 42, String::new(), "x");
        assert_eq!(err.kind, ParseErrorKind::TagNotOpened);
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 7);
        assert_eq!(err.stream_position, 42);
    }
}
