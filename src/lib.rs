//! rustyhtml - tolerant HTML parsing with a mutable DOM
//!
//! Parses real-world HTML the way browsers tolerate it: malformed markup is
//! repaired (implicit ends, retroactive void tags, nesting resets) and the
//! problems are recorded as parse errors rather than failures. The resulting
//! tree is mutable, and any subtree left untouched serializes back as the
//! exact bytes it was parsed from.
//!
//! ```
//! use rustyhtml::Document;
//!
//! let doc = Document::from_html("<ul><li>one<li>two</ul>").unwrap();
//! let ul = doc.children(doc.root())[0];
//! let items: Vec<_> = doc.child_elements(ul).collect();
//! assert_eq!(items.len(), 2);
//! assert_eq!(doc.inner_html(items[0]), "one");
//! assert_eq!(doc.save(), "<ul><li>one<li>two</ul>");
//! ```

mod core;
mod dom;
mod error;

pub use crate::core::elements::{
    parent_explicit_end, parent_implicit_end, resetters, ElementFlags, ElementFlagsTable,
};
pub use crate::core::entities;
pub use crate::core::encoding::StreamEncoding;
pub use crate::dom::{
    Ancestors, Attribute, Document, Node, NodeId, NodeKind, Options, QuoteStyle, Remainder, Span,
};
pub use crate::error::{HtmlError, ParseError, ParseErrorKind};
