//! HTML attribute representation
//!
//! Attributes parsed from source keep only a value span; the value is
//! entity-decoded on demand. Values set through the API are stored owned.
//! A valueless attribute (`<input disabled>`) is distinct from an empty one
//! (`<input value="">`).

use std::borrow::Cow;

use crate::core::entities;
use crate::dom::node::Span;

/// Quoting used around an attribute value, round-tripped on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    #[default]
    Double,
    Single,
    /// Value was written without quotes
    Unquoted,
}

/// Where the attribute value lives
#[derive(Debug, Clone)]
pub(crate) enum AttrValue {
    /// No value at all (boolean attribute)
    Missing,
    /// Byte range in the document text, decoded lazily
    Spanned(Span),
    /// Set through the API
    Owned(String),
}

/// A single attribute of an element node
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Lowercase canonical name
    pub(crate) name: String,
    /// Name exactly as written in the source
    pub(crate) original_name: String,
    pub(crate) value: AttrValue,
    pub quote: QuoteStyle,
    /// 1-based source line (0 for attributes created through the API)
    pub line: u32,
    /// Source column within the line
    pub column: u32,
    /// Absolute character offset in the document text
    pub stream_position: usize,
}

impl Attribute {
    /// Create a detached attribute with an owned value
    pub fn new(name: &str, value: &str) -> Self {
        Attribute {
            name: name.to_ascii_lowercase(),
            original_name: name.to_string(),
            value: AttrValue::Owned(value.to_string()),
            quote: QuoteStyle::Double,
            line: 0,
            column: 0,
            stream_position: 0,
        }
    }

    /// Create a detached valueless attribute
    pub fn valueless(name: &str) -> Self {
        Attribute {
            name: name.to_ascii_lowercase(),
            original_name: name.to_string(),
            value: AttrValue::Missing,
            quote: QuoteStyle::Double,
            line: 0,
            column: 0,
            stream_position: 0,
        }
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

    /// True when the attribute carries a value (possibly empty)
    #[inline]
    pub fn has_value(&self) -> bool {
        !matches!(self.value, AttrValue::Missing)
    }

    /// Resolve the value against the document text
    ///
    /// Spanned values are entity-decoded here; `None` means the attribute is
    /// valueless.
    pub fn resolve_value<'a>(&'a self, text: &'a str) -> Option<Cow<'a, str>> {
        match &self.value {
            AttrValue::Missing => None,
            AttrValue::Owned(v) => Some(Cow::Borrowed(v.as_str())),
            AttrValue::Spanned(span) => Some(entities::decode(&text[span.start..span.end()])),
        }
    }

    /// Replace the value; `None` makes the attribute valueless
    pub fn set_value(&mut self, value: Option<&str>) {
        self.value = match value {
            Some(v) => AttrValue::Owned(v.to_string()),
            None => AttrValue::Missing,
        };
    }
}
