//! End-to-end selector evaluation over HTML fixtures.

use tarsier_common::geometry::Rect;
use tarsier_dom::{DomTree, NodeId};
use tarsier_selectors::{matches, parse_selector, query, QueryCache, QueryError};

fn all(tree: &DomTree, selector: &str) -> Vec<NodeId> {
    let parsed = parse_selector(selector).expect("selector parses");
    let mut cache = QueryCache::new();
    query(tree, &parsed, tree.root(), &mut cache).expect("query succeeds")
}

fn tags(tree: &DomTree, selector: &str) -> Vec<String> {
    all(tree, selector)
        .into_iter()
        .map(|node| {
            tree.as_element(node)
                .map(|e| e.tag_name.clone())
                .unwrap_or_default()
        })
        .collect()
}

fn texts(tree: &DomTree, selector: &str) -> Vec<String> {
    all(tree, selector)
        .into_iter()
        .map(|node| tree.text_content(node).trim().to_owned())
        .collect()
}

#[test]
fn css_descendants_in_document_order() {
    let tree = DomTree::from_html(
        "<div><p class=a>one</p></div><p class=a>two</p><p>three</p>",
    );
    assert_eq!(texts(&tree, "p.a"), vec!["one", "two"]);
    assert_eq!(texts(&tree, "div > p"), vec!["one"]);
}

#[test]
fn attribute_and_pseudo_selectors() {
    let tree = DomTree::from_html(
        "<ul><li>a</li><li class=sel>b</li><li>c</li></ul>",
    );
    assert_eq!(texts(&tree, "li:first-child"), vec!["a"]);
    assert_eq!(texts(&tree, "li:nth-child(2)"), vec!["b"]);
    assert_eq!(texts(&tree, "li[class=sel]"), vec!["b"]);
    assert_eq!(texts(&tree, "li:last-child"), vec!["c"]);
}

#[test]
fn chain_parts_expand_from_each_candidate() {
    let tree = DomTree::from_html(
        "<section><article><span>inside</span></article></section><span>outside</span>",
    );
    assert_eq!(texts(&tree, "section >> article >> span"), vec!["inside"]);
}

#[test]
fn text_engine_selects_innermost() {
    let tree = DomTree::from_html(
        "<div><button><span>Sign in</span></button><button>Register</button></div>",
    );
    assert_eq!(tags(&tree, "text=Sign in"), vec!["span"]);
    assert_eq!(tags(&tree, "button >> text=Register"), vec!["button"]);
    // Quoted form is exact and case-sensitive.
    assert!(all(&tree, "text=\"sign in\"").is_empty());
    assert_eq!(tags(&tree, "text=\"Sign in\""), vec!["span"]);
}

#[test]
fn role_engine_with_name_filter() {
    let tree = DomTree::from_html(
        "<a href=\"/a\">Read the docs</a>\
         <button>Read more</button>\
         <div role=button aria-pressed=true>Bold</div>",
    );
    assert_eq!(tags(&tree, "role=button"), vec!["button", "div"]);
    assert_eq!(texts(&tree, "role=button[name=\"bold\"]"), vec!["Bold"]);
    assert_eq!(texts(&tree, "role=button[pressed]"), vec!["Bold"]);
    assert_eq!(texts(&tree, "role=link[name=\"docs\"]"), vec!["Read the docs"]);
}

#[test]
fn role_pseudo_matches_like_the_role_engine() {
    let tree = DomTree::from_html(
        "<div><button>Go</button><a href=\"/\">Go</a></div>",
    );
    assert_eq!(tags(&tree, "css=:role(button)"), vec!["button"]);
    assert_eq!(tags(&tree, ":role(link[name=\"Go\"])"), vec!["a"]);
}

#[test]
fn scope_pseudo_reaches_the_query_root() {
    let tree = DomTree::from_html("<div id=outer><div id=inner></div></div>");
    let outer = tree.element_by_id("outer").expect("outer");
    let inner = tree.element_by_id("inner").expect("inner");
    let mut cache = QueryCache::new();

    let parsed = parse_selector("css=:scope").expect("parses");
    assert_eq!(
        query(&tree, &parsed, outer, &mut cache).expect("ok"),
        vec![outer]
    );

    let parsed = parse_selector("css=:scope > div").expect("parses");
    assert_eq!(
        query(&tree, &parsed, outer, &mut cache).expect("ok"),
        vec![inner]
    );
}

#[test]
fn nth_indexes_the_current_list() {
    let tree = DomTree::from_html("<p>a</p><p>b</p><p>c</p>");
    assert_eq!(texts(&tree, "p >> nth=0"), vec!["a"]);
    assert_eq!(texts(&tree, "p >> nth=-1"), vec!["c"]);
    assert!(all(&tree, "p >> nth=7").is_empty());
}

#[test]
fn visible_filters_on_style_and_boxes() {
    let tree = DomTree::from_html(
        "<button>shown</button><button style=\"display: none\">gone</button>",
    );
    assert_eq!(texts(&tree, "button >> visible=true"), vec!["shown"]);
    assert_eq!(texts(&tree, "button >> visible=false"), vec!["gone"]);
}

#[test]
fn has_and_or_nesting_engines() {
    let tree = DomTree::from_html(
        "<div class=card><img alt=x><p>with image</p></div>\
         <div class=card><p>plain</p></div>",
    );
    assert_eq!(texts(&tree, ".card >> has=\"img\" >> p"), vec!["with image"]);
    // or= unions both sides in document order.
    let union = texts(&tree, "img >> or=\"p\"");
    assert_eq!(union, vec!["", "with image", "plain"]);
}

#[test]
fn not_excludes_matches() {
    let tree = DomTree::from_html(
        "<button class=primary>Save</button><button>Cancel</button>",
    );
    assert_eq!(texts(&tree, "button >> not=\".primary\""), vec!["Cancel"]);
}

#[test]
fn capture_part_keeps_the_marked_subject() {
    let tree = DomTree::from_html(
        "<ul><li><span>apple</span></li><li><span>banana</span></li></ul>",
    );
    let captured = texts(&tree, "ul >> *css=li >> text=banana");
    assert_eq!(captured, vec!["banana"]);
    let tag = tags(&tree, "ul >> *css=li >> text=banana");
    assert_eq!(tag, vec!["li"]);
}

#[test]
fn shadow_trees_are_pierced_by_default() {
    let tree = DomTree::from_html(
        "<x-card><template shadowrootmode=\"open\"><button>inner</button></template></x-card>",
    );
    assert_eq!(texts(&tree, "button"), vec!["inner"]);
    assert_eq!(texts(&tree, "x-card > button"), vec!["inner"]);
    // :light() restricts matching to the light tree.
    assert!(all(&tree, ":light(button)").is_empty());
}

#[test]
fn scope_descendant_combinator_includes_the_anchor() {
    let tree = DomTree::from_html(
        "<div class=item><div class=item><span>deep</span></div></div>",
    );
    // `.item >= span`: the span's ancestor search for `.item` starts at
    // the span itself, so both .item levels qualify as anchors.
    assert_eq!(texts(&tree, "css=.item >= span"), vec!["deep"]);
}

#[test]
fn layout_engine_filters_and_ranks_by_distance() {
    let mut tree = DomTree::from_html(
        "<input id=a><input id=b><span id=label>Units</span>",
    );
    let a = tree.element_by_id("a").expect("a");
    let b = tree.element_by_id("b").expect("b");
    let label = tree.element_by_id("label").expect("label");
    tree.set_layout_box(a, Rect::new(0.0, 0.0, 50.0, 20.0));
    tree.set_layout_box(b, Rect::new(0.0, 100.0, 50.0, 20.0));
    tree.set_layout_box(label, Rect::new(100.0, 0.0, 40.0, 20.0));

    let left = all(&tree, "input >> left-of=\"#label\"");
    assert_eq!(left, vec![a]);

    // A max distance tightens the cutoff below the actual 50px gap.
    assert!(all(&tree, "input >> left-of=[\"#label\", 10]").is_empty());
}

#[test]
fn nth_match_call_counts_from_the_root() {
    let tree = DomTree::from_html("<p>a</p><p>b</p><p>c</p>");
    assert_eq!(texts(&tree, ":nth-match(p, 2)"), vec!["b"]);
}

#[test]
fn unknown_engine_fails_at_query_time() {
    let tree = DomTree::from_html("<p>a</p>");
    let parsed = parse_selector("//p[1]").expect("xpath parses");
    let mut cache = QueryCache::new();
    let error = query(&tree, &parsed, tree.root(), &mut cache).expect_err("xpath is unknown");
    assert_eq!(
        error,
        QueryError::UnknownEngine {
            name: "xpath".into()
        }
    );
}

#[test]
fn text_node_roots_are_not_queryable() {
    let tree = DomTree::from_html("<p>a</p>");
    let paragraph = all(&tree, "p")[0];
    let text = tree.children(paragraph)[0];
    let parsed = parse_selector("span").expect("parses");
    let mut cache = QueryCache::new();
    assert_eq!(
        query(&tree, &parsed, text, &mut cache),
        Err(QueryError::NotQueryable)
    );
}

#[test]
fn matches_checks_membership_under_a_scope() {
    let tree = DomTree::from_html("<div><p class=a>x</p></div><p class=a>y</p>");
    let parsed = parse_selector("div >> p.a").expect("parses");
    let mut cache = QueryCache::new();
    let inside = all(&tree, "div > p")[0];
    let outside = all(&tree, "p.a")[1];
    assert!(matches(&tree, &parsed, inside, tree.root(), &mut cache).expect("ok"));
    assert!(!matches(&tree, &parsed, outside, tree.root(), &mut cache).expect("ok"));
}
