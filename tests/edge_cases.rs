//! Malformed-markup recovery: every input here produces a tree, never a
//! failure.

use rustyhtml::{Document, HtmlError, Options, ParseErrorKind};

#[test]
fn test_empty_and_whitespace_input() {
    let doc = Document::from_html("").unwrap();
    assert!(doc.children(doc.root()).is_empty());
    assert_eq!(doc.save(), "");

    let doc = Document::from_html("   \n  ").unwrap();
    assert_eq!(doc.children(doc.root()).len(), 1);
    assert_eq!(doc.save(), "   \n  ");
}

#[test]
fn test_text_around_markup_preserved() {
    let doc = Document::from_html("pre <b>x</b> post").unwrap();
    let root = doc.root();
    assert_eq!(doc.children(root).len(), 3);
    assert!(doc.node(doc.children(root)[0]).is_text());
    assert_eq!(doc.name(doc.children(root)[1]), "b");
    assert_eq!(doc.text_content(doc.children(root)[2]), " post");
}

#[test]
fn test_literal_angle_bracket() {
    let doc = Document::from_html("<p>1 < 2 and 3 <= 4</p>").unwrap();
    let p = doc.children(doc.root())[0];
    assert_eq!(doc.inner_html(p), "1 < 2 and 3 <= 4");
    assert!(doc.errors().is_empty());
}

#[test]
fn test_self_closing_non_void() {
    let doc = Document::from_html("<div/>x").unwrap();
    let root = doc.root();
    assert_eq!(doc.children(root).len(), 2);
    let div = doc.children(root)[0];
    assert!(doc.node(div).is_closed());
    assert!(doc.children(div).is_empty());
    assert_eq!(doc.text_content(doc.children(root)[1]), "x");
}

#[test]
fn test_slash_between_attributes() {
    let doc = Document::from_html("<img src=\"x\"//onerror=alert(1)>").unwrap();
    let img = doc.children(doc.root())[0];
    assert_eq!(doc.attributes(img).len(), 2);
    assert_eq!(doc.get_attribute(img, "onerror").as_deref(), Some("alert(1)"));
}

#[test]
fn test_uppercase_names_canonicalized() {
    let doc = Document::from_html("<DIV Class=\"A\">x</DIV>").unwrap();
    let div = doc.children(doc.root())[0];
    assert_eq!(doc.name(div), "div");
    assert_eq!(doc.node(div).original_name(), "DIV");
    assert_eq!(doc.get_attribute(div, "class").as_deref(), Some("A"));
    assert!(doc.node(div).is_closed());
    assert!(doc.errors().is_empty());
}

#[test]
fn test_duplicate_attributes_kept() {
    let doc = Document::from_html("<div class=\"a\" class=\"b\">x</div>").unwrap();
    let div = doc.children(doc.root())[0];
    assert_eq!(doc.attributes(div).len(), 2);
    // last one wins on lookup
    assert_eq!(doc.get_attribute(div, "class").as_deref(), Some("b"));
    assert_eq!(doc.attributes_with_name(div, "class").count(), 2);
}

#[test]
fn test_implicit_sibling_closes() {
    let doc = Document::from_html("<a>1<a>2").unwrap();
    assert_eq!(doc.children(doc.root()).len(), 2);

    let doc = Document::from_html("<dl><dt>a<dd>b<dd>c</dl>").unwrap();
    let dl = doc.children(doc.root())[0];
    let names: Vec<_> = doc
        .child_elements(dl)
        .map(|c| doc.name(c).to_string())
        .collect();
    assert_eq!(names, ["dt", "dd", "dd"]);

    let doc = Document::from_html("<select><option>a<option>b</select>").unwrap();
    let select = doc.children(doc.root())[0];
    assert_eq!(doc.child_elements(select).count(), 2);
}

#[test]
fn test_table_cell_explicit_closes() {
    let doc = Document::from_html("<table><tr><td>a<td>b<tr><td>c</table>").unwrap();
    let table = doc.children(doc.root())[0];
    let rows: Vec<_> = doc.child_elements(table).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(doc.child_elements(rows[0]).count(), 2);
    assert_eq!(doc.child_elements(rows[1]).count(), 1);
}

#[test]
fn test_heading_closes_heading() {
    let doc = Document::from_html("<h1>one<h2>two").unwrap();
    let root = doc.root();
    assert_eq!(doc.children(root).len(), 2);
    let h1 = doc.children(root)[0];
    assert!(doc.node(h1).is_closed());
    // explicit close, so the end tag is still emitted on regeneration
    assert!(!doc.node(h1).is_implicit_end());
}

#[test]
fn test_retroactive_br() {
    let doc = Document::from_html("x<br>y</br>").unwrap();
    let br = doc.find_first(doc.root(), "br").unwrap();
    assert_eq!(doc.children(br).len(), 1);
    assert_eq!(doc.text_content(doc.children(br)[0]), "y");
}

#[test]
fn test_form_overlap_degrades_to_text() {
    let doc = Document::from_html("<div></FORM></div>").unwrap();
    let div = doc.children(doc.root())[0];
    let stray = doc.children(div)[0];
    assert!(doc.node(stray).is_text());
    assert_eq!(doc.text_content(stray), "</form>");
    assert!(doc.errors().is_empty());
}

#[test]
fn test_unmatched_end_tags() {
    let doc = Document::from_html("a</b>c</img>d").unwrap();
    let kinds: Vec<_> = doc.errors().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&ParseErrorKind::TagNotOpened));
    assert!(kinds.contains(&ParseErrorKind::EndTagNotRequired));
    // both stray end tags are dropped from the tree
    assert_eq!(doc.save(), "a</b>c</img>d");
    assert!(doc.find_first(doc.root(), "b").is_none());
    assert!(doc.find_first(doc.root(), "img").is_none());
}

#[test]
fn test_unclosed_elements_synthesize_end_tags() {
    let doc = Document::from_html("<a><a>").unwrap();
    assert_eq!(doc.save(), "<a><a></a>");

    let doc = Document::from_html("<div><span>x").unwrap();
    assert_eq!(doc.save(), "<div><span>x</span></div>");
    let div = doc.children(doc.root())[0];
    assert_eq!(doc.outer_html(div), "<div><span>x</span></div>");
}

#[test]
fn test_unclosed_reported_not_invented() {
    let doc = Document::from_html("<article><section>x").unwrap();
    assert_eq!(
        doc.errors()
            .iter()
            .filter(|e| e.kind == ParseErrorKind::TagNotClosed)
            .count(),
        2
    );
    let section = doc.find_first(doc.root(), "section").unwrap();
    assert!(!doc.node(section).is_closed());
}

#[test]
fn test_script_with_markup_inside() {
    let doc =
        Document::from_html("<script>if (a<b) document.write(\"</div>\");</script>done").unwrap();
    let root = doc.root();
    let script = doc.children(root)[0];
    assert_eq!(doc.name(script), "script");
    assert_eq!(doc.children(script).len(), 1);
    assert_eq!(
        doc.inner_html(script),
        "if (a<b) document.write(\"</div>\");"
    );
    assert_eq!(doc.text_content(doc.children(root)[1]), "done");
    // script content never reaches inner_text unless asked for
    assert_eq!(doc.inner_text(root), "done");
    assert_eq!(
        doc.inner_text_with_scripts(root),
        "if (a<b) document.write(\"</div>\");done"
    );
}

#[test]
fn test_comment_variants() {
    // '>' inside a full comment does not end it
    let doc = Document::from_html("<!-- a > b -->x").unwrap();
    let root = doc.root();
    assert_eq!(doc.text_content(doc.children(root)[0]), " a > b ");

    // the --!> sloppy terminator is accepted
    let doc = Document::from_html("<!-- y --!>z").unwrap();
    let root = doc.root();
    assert_eq!(doc.children(root).len(), 2);
    assert_eq!(doc.text_content(doc.children(root)[1]), "z");

    // a bang tag ends at the first '>'
    let doc = Document::from_html("<!doctype html><p>x").unwrap();
    assert_eq!(doc.children(doc.root()).len(), 2);
}

#[test]
fn test_server_side_code_in_attribute() {
    let doc = Document::from_html("<a href=\"<% url %>\">x</a>").unwrap();
    let a = doc.children(doc.root())[0];
    assert_eq!(doc.get_attribute(a, "href").as_deref(), Some("<% url %>"));
    assert_eq!(doc.inner_html(a), "x");
}

#[test]
fn test_quoted_value_with_angle_bracket() {
    let doc = Document::from_html("<a title=\"a>b\">x</a>").unwrap();
    let a = doc.children(doc.root())[0];
    assert_eq!(doc.get_attribute(a, "title").as_deref(), Some("a>b"));
    assert_eq!(doc.inner_html(a), "x");
    assert!(doc.errors().is_empty());
}

#[test]
fn test_depth_guard_on_traversal() {
    let mut options = Options::default();
    options.max_depth_level = 2;
    let mut doc = Document::new(options);
    doc.load_html("<a><b><c>x</c></b></a>").unwrap();
    assert!(matches!(
        doc.descendants(doc.root()),
        Err(HtmlError::DepthExceeded(2))
    ));
}

#[test]
fn test_nesting_abort() {
    let mut options = Options::default();
    options.max_nested_child_nodes = 2;
    let mut doc = Document::new(options);
    let err = doc.load_html("<a><b><c>x</c></b></a>").unwrap_err();
    assert!(matches!(err, HtmlError::TooManyNestedChildren(2)));
}
