//! Core parsing primitives
//!
//! The building blocks the document parser is made of:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Parser: state machine folding tags into the document tree
//! - Elements: element flags and close-behavior tables
//! - Entities: HTML entity decoding with Cow (zero-copy when possible)
//! - Encoding: BOM/UTF-16 detection, conversion and meta charset labels
//! - Crc32: rolling checksum over the consumed input

pub mod crc32;
pub mod elements;
pub mod encoding;
pub mod entities;
pub mod parser;
pub mod scanner;
