//! Integration tests for the DOM tree, fixture parser, and stability poll.

use tarsier_common::geometry::Rect;
use tarsier_dom::{DomTree, NodeKind, PollStatus, StabilityPoll, StabilityPollConfig};

fn find_by_tag(tree: &DomTree, tag: &str) -> tarsier_dom::NodeId {
    *tree
        .descendant_elements(tree.root(), true)
        .iter()
        .find(|&&id| tree.as_element(id).is_some_and(|e| e.tag_name == tag))
        .expect("tag not found")
}

#[test]
fn parses_nested_elements_and_attributes() {
    let tree = DomTree::from_html(
        r#"<div id="main" class="a b"><p data-x=1>Hello <b>world</b></p></div>"#,
    );
    let div = find_by_tag(&tree, "div");
    let data = tree.as_element(div).unwrap();
    assert_eq!(data.id(), Some(&"main".to_string()));
    assert!(data.classes().contains("a"));
    assert!(data.classes().contains("b"));

    let p = find_by_tag(&tree, "p");
    assert_eq!(tree.as_element(p).unwrap().attr("data-x"), Some("1"));
    assert_eq!(tree.parent(p), Some(div));
    assert_eq!(tree.text_content(p), "Hello world");
}

#[test]
fn void_elements_do_not_nest() {
    let tree = DomTree::from_html("<div><img src=a.png><span>after</span></div>");
    let img = find_by_tag(&tree, "img");
    let span = find_by_tag(&tree, "span");
    assert_eq!(tree.parent(img), tree.parent(span));
    assert!(tree.children(img).is_empty());
}

#[test]
fn malformed_input_degrades_to_text() {
    let tree = DomTree::from_html("<div>a < b</div>");
    let div = find_by_tag(&tree, "div");
    assert_eq!(tree.text_content(div), "a < b");
}

#[test]
fn entities_are_decoded() {
    let tree = DomTree::from_html("<p>a &amp; b &lt;c&gt;</p>");
    let p = find_by_tag(&tree, "p");
    assert_eq!(tree.text_content(p), "a & b <c>");
}

#[test]
fn declarative_shadow_root_is_attached_to_host() {
    let tree = DomTree::from_html(
        "<div id=host><template shadowrootmode=open><span>inside</span></template><b>light</b></div>",
    );
    let host = find_by_tag(&tree, "div");
    let shadow = tree.shadow_root(host).expect("shadow root");
    assert!(matches!(
        tree.get(shadow).map(|n| &n.kind),
        Some(NodeKind::ShadowRoot)
    ));

    // The span lives in the shadow tree; the b element stays in the light tree.
    let span = find_by_tag(&tree, "span");
    assert!(tree
        .ancestors(span)
        .any(|id| id == host));
    let light: Vec<_> = tree
        .descendant_elements(host, false)
        .iter()
        .map(|&id| tree.as_element(id).unwrap().tag_name.clone())
        .collect();
    assert_eq!(light, vec!["b".to_string()]);

    // Piercing traversal sees the shadow content first.
    let pierced: Vec<_> = tree
        .descendant_elements(host, true)
        .iter()
        .map(|&id| tree.as_element(id).unwrap().tag_name.clone())
        .collect();
    assert_eq!(pierced, vec!["span".to_string(), "b".to_string()]);
}

#[test]
fn parent_or_shadow_host_crosses_the_boundary() {
    let tree = DomTree::from_html(
        "<div id=host><template shadowrootmode=open><span></span></template></div>",
    );
    let host = find_by_tag(&tree, "div");
    let span = find_by_tag(&tree, "span");
    assert_eq!(tree.parent_or_shadow_host(span), Some(tree.shadow_root(host).unwrap()));
    assert!(tree.is_descendant_of(span, host));
}

#[test]
fn unslotted_children_are_detected() {
    let tree = DomTree::from_html(
        "<div id=host><template shadowrootmode=open><slot name=title></slot></template>\
         <span slot=title>ok</span><b>lost</b><i slot=missing>lost too</i></div>",
    );
    let span = find_by_tag(&tree, "span");
    let b = find_by_tag(&tree, "b");
    let i = find_by_tag(&tree, "i");
    assert!(!tree.is_unslotted(span));
    assert!(tree.is_unslotted(b));
    assert!(tree.is_unslotted(i));
}

#[test]
fn raw_text_elements_do_not_spawn_children() {
    let tree = DomTree::from_html("<script>if (a < b) { x(); }</script><p>ok</p>");
    let script = find_by_tag(&tree, "script");
    assert_eq!(tree.text_content(script), "if (a < b) { x(); }");
    let _ = find_by_tag(&tree, "p");
}

#[test]
fn inline_style_lookup() {
    let tree = DomTree::from_html(r#"<div style="display: none; color: red"></div>"#);
    let div = find_by_tag(&tree, "div");
    let data = tree.as_element(div).unwrap();
    assert_eq!(data.inline_style("display"), Some("none"));
    assert_eq!(data.inline_style("color"), Some("red"));
    assert_eq!(data.inline_style("width"), None);
}

#[test]
fn stability_poll_requires_consecutive_equal_boxes() {
    let mut poll = StabilityPoll::new(StabilityPollConfig {
        required_stable_frames: 2,
        min_check_interval: 1,
    });
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 0.0, 10.0, 10.0);
    assert_eq!(poll.observe(Some(a)), PollStatus::Pending);
    assert_eq!(poll.observe(Some(b)), PollStatus::Pending); // moved, streak resets
    assert_eq!(poll.observe(Some(b)), PollStatus::Pending);
    assert_eq!(poll.observe(Some(b)), PollStatus::Stable);
    // Finished polls repeat their verdict.
    assert_eq!(poll.observe(Some(a)), PollStatus::Stable);
}

#[test]
fn stability_poll_reports_disconnection() {
    let mut poll = StabilityPoll::default();
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(poll.observe(Some(a)), PollStatus::Pending);
    assert_eq!(poll.observe(None), PollStatus::Disconnected);
    assert_eq!(poll.observe(Some(a)), PollStatus::Disconnected);
}

#[test]
fn stability_poll_honors_check_interval() {
    let mut poll = StabilityPoll::new(StabilityPollConfig {
        required_stable_frames: 1,
        min_check_interval: 2,
    });
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    // Frame 1 is skipped (interval), frame 2 seeds, frame 3 skipped, frame 4 stable.
    assert_eq!(poll.observe(Some(a)), PollStatus::Pending);
    assert_eq!(poll.observe(Some(a)), PollStatus::Pending);
    assert_eq!(poll.observe(Some(a)), PollStatus::Pending);
    assert_eq!(poll.observe(Some(a)), PollStatus::Stable);
}

#[test]
fn element_index_counts_element_siblings_only() {
    let tree = DomTree::from_html("<ul>text<li>a</li><li>b</li><li>c</li></ul>");
    let items: Vec<_> = tree
        .descendant_elements(tree.root(), false)
        .into_iter()
        .filter(|&id| tree.as_element(id).is_some_and(|e| e.tag_name == "li"))
        .collect();
    assert_eq!(items.len(), 3);
    assert_eq!(tree.element_index(items[0]), 0);
    assert_eq!(tree.element_index(items[2]), 2);
}
