//! Element metadata
//!
//! Per-document table of element flags (void elements, raw-text elements,
//! overlap tolerance) plus the static close-behavior tables the parser uses
//! for error recovery:
//! - resetters: list containers that invalidate a stray end tag
//! - implicit end: elements auto-closed by a following sibling start tag
//! - explicit end: elements force-closed by specific start tags

use std::collections::HashMap;
use std::ops::BitOr;

/// Behavior flags attached to an element name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementFlags(u8);

impl ElementFlags {
    /// Raw-text content: child text is scanned without markup interpretation
    pub const CDATA: ElementFlags = ElementFlags(1);
    /// Void element: never has children, needs no end tag
    pub const EMPTY: ElementFlags = ElementFlags(2);
    /// A stray end tag produces a retroactive element instead of an error
    pub const CLOSED: ElementFlags = ElementFlags(4);
    /// Overlapping close tags are tolerated (form)
    pub const CAN_OVERLAP: ElementFlags = ElementFlags(8);

    #[inline]
    pub fn contains(self, other: ElementFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ElementFlags {
    type Output = ElementFlags;

    fn bitor(self, rhs: ElementFlags) -> ElementFlags {
        ElementFlags(self.0 | rhs.0)
    }
}

/// Mutable per-document registry of element flags
#[derive(Debug, Clone)]
pub struct ElementFlagsTable {
    map: HashMap<String, ElementFlags>,
}

impl ElementFlagsTable {
    /// Build the default table
    ///
    /// `p_as_empty` restores the legacy treatment of `p` as a void element;
    /// when off (the default), `p` participates in block-level implicit
    /// closing instead.
    pub fn new(p_as_empty: bool) -> Self {
        let mut map = HashMap::new();

        for name in ["script", "style", "noxhtml", "textarea", "title"] {
            map.insert(name.to_string(), ElementFlags::CDATA);
        }

        for name in [
            "base", "link", "meta", "isindex", "hr", "col", "img", "param", "embed", "frame",
            "wbr", "bgsound", "spacer", "keygen", "area", "input", "basefont", "source",
        ] {
            map.insert(name.to_string(), ElementFlags::EMPTY);
        }

        map.insert("br".to_string(), ElementFlags::EMPTY | ElementFlags::CLOSED);
        map.insert("form".to_string(), ElementFlags::CAN_OVERLAP);

        if p_as_empty {
            map.insert("p".to_string(), ElementFlags::EMPTY | ElementFlags::CLOSED);
        }

        ElementFlagsTable { map }
    }

    /// Flags registered for a name (lowercase lookup)
    pub fn get(&self, name: &str) -> Option<ElementFlags> {
        self.map.get(name).copied()
    }

    /// Register or override flags for an element name
    pub fn insert(&mut self, name: impl Into<String>, flags: ElementFlags) {
        self.map.insert(name.into(), flags);
    }

    /// Remove an element name from the table
    pub fn remove(&mut self, name: &str) {
        self.map.remove(name);
    }

    fn has_flag(&self, name: &str, flag: ElementFlags) -> bool {
        self.map
            .get(&name.to_ascii_lowercase())
            .is_some_and(|f| f.contains(flag))
    }

    /// Element content is raw text (script, style, textarea, title)
    pub fn is_cdata_element(&self, name: &str) -> bool {
        self.has_flag(name, ElementFlags::CDATA)
    }

    /// Element is void: no children, no end tag
    ///
    /// Bang and question tags (`<!doctype>`, `<?xml>`) are always void.
    pub fn is_empty_element(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        if matches!(name.as_bytes()[0], b'!' | b'?') {
            return true;
        }
        self.has_flag(name, ElementFlags::EMPTY)
    }

    /// A stray end tag of this element is spliced in retroactively
    pub fn is_closed_element(&self, name: &str) -> bool {
        self.has_flag(name, ElementFlags::CLOSED)
    }

    /// Overlapping close tags of this element are tolerated
    pub fn can_overlap_element(&self, name: &str) -> bool {
        self.has_flag(name, ElementFlags::CAN_OVERLAP)
    }
}

/// Containers that invalidate a stray end tag for `name`
///
/// An `</li>` with no open `li` is only an error if an enclosing `ul`/`ol`
/// was opened more recently than the candidate `li`.
pub fn resetters(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "li" => Some(&["ul", "ol"]),
        "tr" => Some(&["table"]),
        "th" | "td" => Some(&["tr", "table"]),
        _ => None,
    }
}

/// Block-level names that implicitly close an open `p`
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dir", "div", "dl", "fieldset", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "menu", "nav", "ol", "p",
    "pre", "section", "table", "ul",
];

/// Does a start tag `child` implicitly close an open `parent`?
///
/// The closed parent keeps no end tag on output (implicit end).
pub fn parent_implicit_end(parent: &str, child: &str, p_as_empty: bool) -> bool {
    match parent {
        "a" => child == "a",
        "dd" | "dt" => child == "dt" || child == "dd",
        "li" => child == "li",
        "option" => child == "option",
        "p" => {
            if p_as_empty {
                child == "p"
            } else {
                P_CLOSERS.contains(&child)
            }
        }
        _ => false,
    }
}

/// Does a start tag `child` explicitly close an open `parent`?
///
/// Unlike the implicit case, the parent is closed as if its end tag had been
/// seen, so serialization still emits one.
pub fn parent_explicit_end(parent: &str, child: &str) -> bool {
    match parent {
        "title" => child == "title",
        "p" => child == "div",
        "table" => child == "table",
        "tr" => child == "tr",
        "td" | "th" => matches!(child, "td" | "th" | "tr"),
        "h1" => matches!(child, "h2" | "h3" | "h4" | "h5"),
        "h2" => matches!(child, "h1" | "h3" | "h4" | "h5"),
        "h3" => matches!(child, "h1" | "h2" | "h4" | "h5"),
        "h4" => matches!(child, "h1" | "h2" | "h3" | "h5"),
        "h5" => matches!(child, "h1" | "h2" | "h3" | "h4"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let table = ElementFlagsTable::new(false);
        assert!(table.is_cdata_element("script"));
        assert!(table.is_cdata_element("SCRIPT"));
        assert!(table.is_empty_element("img"));
        assert!(table.is_empty_element("br"));
        assert!(table.is_closed_element("br"));
        assert!(table.can_overlap_element("form"));
        assert!(!table.is_empty_element("div"));
        assert!(!table.is_empty_element("p"));
    }

    #[test]
    fn test_p_as_empty() {
        let table = ElementFlagsTable::new(true);
        assert!(table.is_empty_element("p"));
        assert!(table.is_closed_element("p"));
    }

    #[test]
    fn test_bang_tags_are_empty() {
        let table = ElementFlagsTable::new(false);
        assert!(table.is_empty_element("!doctype"));
        assert!(table.is_empty_element("?xml"));
    }

    #[test]
    fn test_custom_registration() {
        let mut table = ElementFlagsTable::new(false);
        table.insert("widget", ElementFlags::EMPTY);
        assert!(table.is_empty_element("widget"));
        table.remove("widget");
        assert!(!table.is_empty_element("widget"));
    }

    #[test]
    fn test_implicit_end() {
        assert!(parent_implicit_end("li", "li", false));
        assert!(parent_implicit_end("dd", "dt", false));
        assert!(parent_implicit_end("dt", "dd", false));
        assert!(parent_implicit_end("a", "a", false));
        assert!(parent_implicit_end("p", "div", false));
        assert!(parent_implicit_end("p", "p", false));
        assert!(!parent_implicit_end("p", "span", false));
        assert!(parent_implicit_end("p", "p", true));
        assert!(!parent_implicit_end("p", "div", true));
    }

    #[test]
    fn test_explicit_end() {
        assert!(parent_explicit_end("td", "tr"));
        assert!(parent_explicit_end("tr", "tr"));
        assert!(parent_explicit_end("h1", "h2"));
        assert!(!parent_explicit_end("h1", "h1"));
        assert!(parent_explicit_end("p", "div"));
        assert!(!parent_explicit_end("div", "div"));
    }

    #[test]
    fn test_resetters() {
        assert_eq!(resetters("li"), Some(&["ul", "ol"][..]));
        assert_eq!(resetters("td"), Some(&["tr", "table"][..]));
        assert_eq!(resetters("div"), None);
    }
}
