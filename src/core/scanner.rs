//! SIMD-accelerated HTML scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)
//!
//! The parser walks markup one byte at a time and reaches for this scanner
//! for lookahead and for SIMD jumps across plain text and raw-text
//! (script/style) content.

use memchr::memchr;

/// Read-only view over the document bytes with fast delimiter search
pub struct Scanner<'a> {
    input: &'a [u8],
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input }
    }

    /// Byte at an absolute position
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.input.get(pos).copied()
    }

    /// Find next '<' (tag start) at or after an absolute position, using SIMD
    #[inline]
    pub fn find_tag_start_from(&self, from: usize) -> Option<usize> {
        if from >= self.input.len() {
            return None;
        }
        memchr(b'<', &self.input[from..]).map(|i| from + i)
    }

    /// Check if input matches a byte sequence at an absolute position,
    /// ignoring ASCII case
    #[inline]
    pub fn matches_ignore_case_at(&self, pos: usize, needle: &[u8]) -> bool {
        match self.input.get(pos..pos + needle.len()) {
            Some(hay) => hay.eq_ignore_ascii_case(needle),
            None => false,
        }
    }
}

/// HTML whitespace: space, tab, line feed, carriage return
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if a byte can open a tag name after '<'
/// Letters open tags; '/', '!', '?' and '%' open end tags, bang tags and
/// server-side blocks
#[inline]
pub fn opens_markup(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'/' | b'?' | b'!' | b'%')
}
