//! Encoding Detection and Conversion
//!
//! Handles detection of UTF-16 and BOM-marked input and conversion to UTF-8
//! for parsing, plus the charset labels found in `<meta>` declarations.

use crate::error::HtmlError;

/// Encoding of the raw input stream, detected from BOM or byte patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl StreamEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return StreamEncoding::Utf8;
        }

        // Check for BOM
        match (input[0], input[1]) {
            // UTF-16 LE BOM: 0xFF 0xFE
            (0xFF, 0xFE) => StreamEncoding::Utf16Le,
            // UTF-16 BE BOM: 0xFE 0xFF
            (0xFE, 0xFF) => StreamEncoding::Utf16Be,
            // UTF-8 BOM: 0xEF 0xBB 0xBF (detected but treated as UTF-8)
            (0xEF, 0xBB) if input.len() >= 3 && input[2] == 0xBF => StreamEncoding::Utf8,
            // No BOM - check for UTF-16 pattern (< followed by null or null followed by <)
            (0x00, b'<') => StreamEncoding::Utf16Be,
            (b'<', 0x00) => StreamEncoding::Utf16Le,
            _ => StreamEncoding::Utf8,
        }
    }

    /// Canonical charset label, comparable against meta declarations
    pub fn label(self) -> &'static str {
        match self {
            StreamEncoding::Utf8 => "utf-8",
            StreamEncoding::Utf16Le | StreamEncoding::Utf16Be => "utf-16",
        }
    }
}

/// Convert raw input bytes to UTF-8 text
///
/// Strips any BOM and converts UTF-16 LE/BE input. Returns the detected
/// stream encoding alongside the text.
pub fn to_utf8(input: &[u8]) -> Result<(String, StreamEncoding), HtmlError> {
    let encoding = StreamEncoding::detect(input);

    let text = match encoding {
        StreamEncoding::Utf8 => {
            // Skip UTF-8 BOM if present
            let bytes = input
                .strip_prefix([0xEF_u8, 0xBB, 0xBF].as_slice())
                .unwrap_or(input);
            String::from_utf8(bytes.to_vec())
                .map_err(|e| HtmlError::InvalidEncoding(e.to_string()))?
        }
        StreamEncoding::Utf16Le => convert_utf16(input, &[0xFF, 0xFE], u16::from_le_bytes)?,
        StreamEncoding::Utf16Be => convert_utf16(input, &[0xFE, 0xFF], u16::from_be_bytes)?,
    };

    Ok((text, encoding))
}

/// Convert UTF-16 bytes (either endianness) to a String
fn convert_utf16(
    input: &[u8],
    bom: &[u8],
    combine: fn([u8; 2]) -> u16,
) -> Result<String, HtmlError> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);

    if bytes.len() % 2 != 0 {
        return Err(HtmlError::InvalidEncoding(
            "odd number of bytes in UTF-16 input".into(),
        ));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| combine([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| HtmlError::InvalidEncoding(e.to_string()))
}

/// Normalize a charset label from a meta declaration
///
/// Browsers accept the bare "utf8" spelling; map it to its canonical form.
/// Labels are compared case-insensitively.
pub fn normalize_charset(label: &str) -> String {
    let trimmed = label.trim().to_ascii_lowercase();
    if trimmed == "utf8" {
        "utf-8".to_string()
    } else {
        trimmed
    }
}

/// Extract the charset parameter from a meta content value such as
/// `text/html; charset=ISO-8859-1`
///
/// Splits on ';' into name=value pairs and returns the charset value, if any.
pub fn charset_from_content(content: &str) -> Option<String> {
    for part in content.split(';') {
        let mut kv = part.splitn(2, '=');
        let name = kv.next()?.trim();
        if name.eq_ignore_ascii_case("charset") {
            let value = kv.next().unwrap_or("").trim().trim_matches(['"', '\'']);
            if !value.is_empty() {
                return Some(normalize_charset(value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8() {
        assert_eq!(StreamEncoding::detect(b"<html>"), StreamEncoding::Utf8);
    }

    #[test]
    fn test_detect_utf8_bom() {
        assert_eq!(
            StreamEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']),
            StreamEncoding::Utf8
        );
    }

    #[test]
    fn test_detect_utf16_le_bom() {
        assert_eq!(
            StreamEncoding::detect(&[0xFF, 0xFE, b'<', 0x00]),
            StreamEncoding::Utf16Le
        );
    }

    #[test]
    fn test_detect_utf16_be_bom() {
        assert_eq!(
            StreamEncoding::detect(&[0xFE, 0xFF, 0x00, b'<']),
            StreamEncoding::Utf16Be
        );
    }

    #[test]
    fn test_convert_utf16_le() {
        // "<p>" in UTF-16 LE with BOM
        let bytes = [0xFF, 0xFE, b'<', 0x00, b'p', 0x00, b'>', 0x00];
        let (text, enc) = to_utf8(&bytes).unwrap();
        assert_eq!(text, "<p>");
        assert_eq!(enc, StreamEncoding::Utf16Le);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let bytes = [0xEF, 0xBB, 0xBF, b'<', b'p', b'>'];
        let (text, _) = to_utf8(&bytes).unwrap();
        assert_eq!(text, "<p>");
    }

    #[test]
    fn test_normalize_charset() {
        assert_eq!(normalize_charset("UTF8"), "utf-8");
        assert_eq!(normalize_charset("  ISO-8859-1 "), "iso-8859-1");
    }

    #[test]
    fn test_charset_from_content() {
        assert_eq!(
            charset_from_content("text/html; charset=ISO-8859-1"),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(
            charset_from_content("text/html;charset=utf8"),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_content("text/html"), None);
    }
}
