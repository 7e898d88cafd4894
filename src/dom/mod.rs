//! DOM Module - Arena-based HTML Document
//!
//! Implements an efficient DOM representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - Source spans for lazy, zero-copy serialization of clean subtrees

pub mod attribute;
pub mod collection;
pub mod document;
pub mod node;
pub mod serialize;

pub use attribute::{Attribute, QuoteStyle};
pub use document::{Ancestors, Document, Options, Remainder};
pub use node::{Node, NodeId, NodeKind, Span};
