//! End-to-end coverage: parse a realistic page, navigate it, mutate it,
//! serialize it.

use rustyhtml::{Document, Options};

const PAGE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<title>Demo</title>\n\
<meta charset=\"utf-8\">\n\
</head>\n\
<body id=\"top\" class=\"page dark\">\n\
<h1>Header</h1>\n\
<p>First\n\
<p>Second\n\
<ul>\n\
<li>one\n\
<li>two\n\
</ul>\n\
</body>\n\
</html>\n";

#[test]
fn test_page_round_trip() {
    let doc = Document::from_html(PAGE).unwrap();
    assert!(doc.errors().is_empty());
    assert_eq!(doc.save(), PAGE);
}

#[test]
fn test_page_structure() {
    let doc = Document::from_html(PAGE).unwrap();
    let root = doc.root();

    let html = doc.find_first(root, "html").unwrap();
    let body = doc.find_first(root, "body").unwrap();
    assert_eq!(doc.node(body).parent, Some(html));

    assert_eq!(doc.descendants_named(root, "p").unwrap().len(), 2);
    let items = doc.descendants_named(root, "li").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(doc.path(items[0]), "/html[1]/body[1]/ul[1]/li[1]");
    assert_eq!(doc.path(items[1]), "/html[1]/body[1]/ul[1]/li[2]");

    // every implicit closer leaves the paragraph without an end tag
    let paragraphs = doc.descendants_named(root, "p").unwrap();
    assert!(doc.node(paragraphs[0]).is_implicit_end());
    assert_eq!(doc.inner_html(paragraphs[0]), "First\n");
}

#[test]
fn test_page_lookups() {
    let doc = Document::from_html(PAGE).unwrap();
    let root = doc.root();

    let body = doc.get_element_by_id("top").unwrap().unwrap();
    assert_eq!(doc.name(body), "body");
    assert!(doc.has_class(body, "page"));
    assert!(doc.has_class(body, "dark"));
    assert_eq!(doc.declared_encoding(), Some("utf-8"));

    let title = doc.find_first(root, "title").unwrap();
    assert_eq!(doc.inner_html(title), "Demo");
    let h1 = doc.find_first(root, "h1").unwrap();
    assert_eq!(doc.inner_text(h1), "Header");
}

#[test]
fn test_mutation_switches_to_regeneration() {
    let mut doc = Document::from_html(PAGE).unwrap();
    let root = doc.root();
    let h1 = doc.find_first(root, "h1").unwrap();
    let head = doc.find_first(root, "head").unwrap();
    let html = doc.find_first(root, "html").unwrap();

    assert!(!doc.node(h1).is_changed());
    doc.set_attribute(h1, "class", Some("x"));
    assert!(doc.node(h1).is_changed());
    // the change propagates up, but not sideways
    assert!(doc.node(html).is_changed());
    assert!(doc.node(root).is_changed());
    assert!(!doc.node(head).is_changed());

    assert_eq!(doc.outer_html(h1), "<h1 class=\"x\">Header</h1>");
    // untouched siblings still serialize as source slices
    let head_html = doc.outer_html(head);
    assert!(matches!(head_html, std::borrow::Cow::Borrowed(_)));
    assert_eq!(
        head_html,
        "<head>\n<title>Demo</title>\n<meta charset=\"utf-8\">\n</head>"
    );
}

#[test]
fn test_append_and_clone() {
    let mut doc = Document::from_html(PAGE).unwrap();
    let root = doc.root();
    let body = doc.find_first(root, "body").unwrap();

    let div = doc.create_element("div");
    let text = doc.create_text("added");
    doc.append_child(body, div).unwrap();
    doc.append_child(div, text).unwrap();
    assert!(doc.outer_html(body).contains("<div>added</div>"));

    let ul = doc.find_first(root, "ul").unwrap();
    let copy = doc.clone_node(ul, true);
    assert!(doc.node(copy).parent.is_none());
    assert_eq!(doc.child_elements(copy).count(), 2);
}

#[test]
fn test_unwrap_element_keeps_grandchildren() {
    let mut doc = Document::from_html("<div><b>x</b><i>y</i></div>").unwrap();
    let root = doc.root();
    let div = doc.children(root)[0];
    doc.remove_child_keep_grandchildren(root, div).unwrap();
    let names: Vec<_> = doc.child_elements(root).map(|c| doc.name(c).to_string()).collect();
    assert_eq!(names, ["b", "i"]);
    assert_eq!(doc.save(), "<b>x</b><i>y</i>");
}

#[test]
fn test_attribute_values_entity_decoded() {
    let doc = Document::from_html("<a href=\"a&amp;b\" title=\"x&#33;\">go</a>").unwrap();
    let a = doc.children(doc.root())[0];
    assert_eq!(doc.get_attribute(a, "href").as_deref(), Some("a&b"));
    assert_eq!(doc.get_attribute(a, "title").as_deref(), Some("x!"));
}

#[test]
fn test_entities_module() {
    use rustyhtml::entities;
    assert_eq!(entities::decode("&lt;b&gt;").as_ref(), "<b>");
    assert_eq!(entities::encode("<b>").as_ref(), "&lt;b&gt;");
}

#[test]
fn test_typed_attribute_access() {
    let doc = Document::from_html("<input tabindex=4 disabled>").unwrap();
    let input = doc.children(doc.root())[0];
    assert_eq!(doc.get_attribute_parsed(input, "tabindex", 0i32), 4);
    assert_eq!(doc.get_attribute_or(input, "missing", "d"), "d");
    // disabled is valueless, distinct from empty
    assert_eq!(doc.get_attribute(input, "disabled"), None);
    assert!(!doc.attributes(input)[1].has_value());
}

#[test]
fn test_load_utf16_bytes() {
    let html = "<p>h\u{e9}llo</p>";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in html.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut doc = Document::new(Options::default());
    doc.load_bytes(&bytes).unwrap();
    assert!(doc.errors().is_empty());
    assert_eq!(doc.save(), html);
}

#[test]
fn test_detect_encoding() {
    assert_eq!(
        Document::detect_encoding(PAGE).unwrap().as_deref(),
        Some("utf-8")
    );
    assert_eq!(Document::detect_encoding("<p>no meta</p>").unwrap(), None);
}

#[test]
fn test_custom_element_flags() {
    use rustyhtml::ElementFlags;
    let mut options = Options::default();
    options.element_flags.insert("widget", ElementFlags::EMPTY);
    let mut doc = Document::new(options);
    doc.load_html("<widget><span>x</span>").unwrap();
    let root = doc.root();
    let names: Vec<_> = doc.child_elements(root).map(|c| doc.name(c).to_string()).collect();
    assert_eq!(names, ["widget", "span"]);
    let widget = doc.find_first(root, "widget").unwrap();
    assert!(doc.children(widget).is_empty());
}

#[test]
fn test_stopper_skips_tail() {
    let mut options = Options::default();
    options.stopper_node_name = Some("head".to_string());
    let mut doc = Document::new(options);
    doc.load_html("<head><title>t</title></head><body>skipped</body>").unwrap();
    let remainder = doc.remainder().unwrap();
    assert_eq!(remainder.text, "<body>skipped</body>");
    assert!(doc.find_first(doc.root(), "body").is_none());
    assert!(doc.find_first(doc.root(), "title").is_some());
}
