//! HTML Entity Decoding
//!
//! Handles decoding of HTML entities:
//! - Named entities: &lt; &gt; &amp; &quot; &apos; &nbsp; and the rest of the
//!   common HTML set
//! - Numeric character references: &#123; &#x7B;
//!
//! Unknown or malformed references pass through literally, as browsers do.
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode entity references in text
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode(input: &str) -> Cow<'_, str> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    // Slow path: decode entities
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
fn decode_entities(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(amp_pos) = memchr(b'&', &bytes[pos..]) {
            // Copy everything before the entity
            result.push_str(&input[pos..pos + amp_pos]);
            pos += amp_pos;

            // Find the semicolon; entity names are short, so bound the search
            let end = (pos + 32).min(bytes.len());
            if let Some(semi_offset) = memchr(b';', &bytes[pos..end]) {
                let entity = &input[pos + 1..pos + semi_offset];

                if let Some(decoded) = decode_entity(entity) {
                    result.push(decoded);
                    pos += semi_offset + 1;
                } else {
                    // Unknown entity, keep as-is
                    result.push('&');
                    pos += 1;
                }
            } else {
                // No semicolon nearby, keep the ampersand
                result.push('&');
                pos += 1;
            }
        } else {
            // No more entities, copy the rest
            result.push_str(&input[pos..]);
            break;
        }
    }

    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    if entity.is_empty() {
        return None;
    }

    // Numeric character reference
    if entity.as_bytes()[0] == b'#' {
        return decode_numeric_entity(&entity[1..]);
    }

    // Named entity (case-sensitive, per HTML)
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "iexcl" => Some('\u{00A1}'),
        "cent" => Some('\u{00A2}'),
        "pound" => Some('\u{00A3}'),
        "curren" => Some('\u{00A4}'),
        "yen" => Some('\u{00A5}'),
        "sect" => Some('\u{00A7}'),
        "copy" => Some('\u{00A9}'),
        "laquo" => Some('\u{00AB}'),
        "raquo" => Some('\u{00BB}'),
        "reg" => Some('\u{00AE}'),
        "deg" => Some('\u{00B0}'),
        "plusmn" => Some('\u{00B1}'),
        "sup2" => Some('\u{00B2}'),
        "sup3" => Some('\u{00B3}'),
        "micro" => Some('\u{00B5}'),
        "para" => Some('\u{00B6}'),
        "middot" => Some('\u{00B7}'),
        "frac14" => Some('\u{00BC}'),
        "frac12" => Some('\u{00BD}'),
        "frac34" => Some('\u{00BE}'),
        "iquest" => Some('\u{00BF}'),
        "times" => Some('\u{00D7}'),
        "divide" => Some('\u{00F7}'),
        "eacute" => Some('\u{00E9}'),
        "egrave" => Some('\u{00E8}'),
        "agrave" => Some('\u{00E0}'),
        "ccedil" => Some('\u{00E7}'),
        "uuml" => Some('\u{00FC}'),
        "ouml" => Some('\u{00F6}'),
        "auml" => Some('\u{00E4}'),
        "szlig" => Some('\u{00DF}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201C}'),
        "rdquo" => Some('\u{201D}'),
        "bull" => Some('\u{2022}'),
        "hellip" => Some('\u{2026}'),
        "prime" => Some('\u{2032}'),
        "Prime" => Some('\u{2033}'),
        "euro" => Some('\u{20AC}'),
        "trade" => Some('\u{2122}'),
        "larr" => Some('\u{2190}'),
        "uarr" => Some('\u{2191}'),
        "rarr" => Some('\u{2192}'),
        "darr" => Some('\u{2193}'),
        _ => None,
    }
}

/// Decode a numeric character reference (after the '#')
fn decode_numeric_entity(entity: &str) -> Option<char> {
    if entity.is_empty() {
        return None;
    }

    let codepoint = if entity.starts_with('x') || entity.starts_with('X') {
        // Hexadecimal: &#xHHHH;
        u32::from_str_radix(&entity[1..], 16).ok()?
    } else {
        // Decimal: &#DDDD;
        entity.parse::<u32>().ok()?
    };

    char::from_u32(codepoint)
}

/// Encode text for HTML output (escape special characters)
pub fn encode(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"')) {
        return Cow::Borrowed(input);
    }

    // Slow path: escape
    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode("Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode("&lt;hello&gt; &amp; &quot;world&quot;");
        assert_eq!(result.as_ref(), "<hello> & \"world\"");
    }

    #[test]
    fn test_nbsp() {
        let result = decode("a&nbsp;b");
        assert_eq!(result.as_ref(), "a\u{00A0}b");
    }

    #[test]
    fn test_numeric_decimal() {
        assert_eq!(decode("&#65;&#66;&#67;").as_ref(), "ABC");
    }

    #[test]
    fn test_numeric_hex() {
        assert_eq!(decode("&#x41;&#x42;&#x43;").as_ref(), "ABC");
    }

    #[test]
    fn test_unicode_entity() {
        assert_eq!(decode("&#x1F600;").as_ref(), "😀");
    }

    #[test]
    fn test_unknown_entity_passthrough() {
        assert_eq!(decode("&unknown;").as_ref(), "&unknown;");
        assert_eq!(decode("a & b").as_ref(), "a & b");
    }

    #[test]
    fn test_bare_ampersand_at_end() {
        assert_eq!(decode("ben & jerry &").as_ref(), "ben & jerry &");
    }

    #[test]
    fn test_encode() {
        let result = encode("<hello> & \"world\"");
        assert_eq!(result.as_ref(), "&lt;hello&gt; &amp; &quot;world&quot;");
    }

    #[test]
    fn test_encode_no_specials_is_borrowed() {
        assert!(matches!(encode("plain text"), Cow::Borrowed(_)));
    }
}
