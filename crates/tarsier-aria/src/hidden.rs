//! Hidden-for-accessibility computation.
//!
//! [WAI-ARIA 1.2 § 7.1 Excluding Elements from the Accessibility Tree](https://www.w3.org/TR/wai-aria-1.2/#tree_exclusion)
//!
//! An element is excluded when it is never rendered (scripts, styles, the
//! document head), when CSS removes it (`display: none`, the `hidden`
//! attribute, an un-slotted shadow-host child) anywhere on its ancestor
//! chain, when `aria-hidden=true` applies to it or an ancestor, or when
//! its effective `visibility` is hidden. Visibility differs from the rest:
//! a descendant declaring `visibility: visible` re-enters the tree.

use std::collections::HashMap;

use tarsier_dom::{DomTree, NodeId, NodeKind};

/// Tags that never produce accessibility content.
const IGNORED_TAGS: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Whether `node` is excluded from the accessibility tree. `blocked` caches
/// the inherited (non-visibility) part of the answer per node.
pub(crate) fn is_hidden(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
) -> bool {
    is_blocked(tree, node, blocked) || effective_visibility_hidden(tree, node)
}

/// The inherited exclusion rules: ignored tags, `display: none`, the
/// `hidden` attribute, `aria-hidden=true`, un-slotted children - all of
/// which an ancestor imposes on the whole subtree.
fn is_blocked(tree: &DomTree, node: NodeId, blocked: &mut HashMap<NodeId, bool>) -> bool {
    if let Some(&cached) = blocked.get(&node) {
        return cached;
    }
    let result = compute_blocked(tree, node, blocked);
    let _ = blocked.insert(node, result);
    result
}

fn compute_blocked(tree: &DomTree, node: NodeId, blocked: &mut HashMap<NodeId, bool>) -> bool {
    let inherited = tree
        .parent_or_shadow_host(node)
        .is_some_and(|parent| is_blocked(tree, parent, blocked));
    if inherited {
        return true;
    }
    match tree.get(node).map(|n| &n.kind) {
        Some(NodeKind::Element(element)) => {
            if IGNORED_TAGS.contains(&element.tag_name.as_str()) {
                return true;
            }
            if element.inline_style("display") == Some("none") {
                return true;
            }
            if element.attrs.contains_key("hidden") {
                return true;
            }
            if element.attr("aria-hidden") == Some("true") {
                return true;
            }
            if tree.is_unslotted(node) {
                return true;
            }
            false
        }
        Some(NodeKind::Document | NodeKind::ShadowRoot | NodeKind::Text(_) | NodeKind::Comment(_))
        | None => false,
    }
}

/// Nearest self-or-ancestor `visibility` declaration wins.
fn effective_visibility_hidden(tree: &DomTree, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(element) = tree.as_element(id) {
            match element.inline_style("visibility") {
                Some("hidden" | "collapse") => return true,
                Some(_) => return false,
                None => {}
            }
        }
        current = tree.parent_or_shadow_host(id);
    }
    false
}

/// `display: contents` removes the element's own box but keeps its
/// children rendered; the snapshot builder flattens such elements.
pub(crate) fn is_display_contents(tree: &DomTree, node: NodeId) -> bool {
    tree.as_element(node)
        .is_some_and(|element| element.inline_style("display") == Some("contents"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(tree: &DomTree, tag: &str) -> NodeId {
        tree.descendant_elements(tree.root(), true)
            .into_iter()
            .find(|&n| tree.as_element(n).is_some_and(|e| e.tag_name == tag))
            .expect("element present")
    }

    #[test]
    fn display_none_hides_the_subtree() {
        let tree = DomTree::from_html("<div style=\"display: none\"><span>x</span></div>");
        let mut cache = HashMap::new();
        assert!(is_hidden(&tree, find(&tree, "span"), &mut cache));
    }

    #[test]
    fn visibility_visible_reenters_a_hidden_subtree() {
        let tree = DomTree::from_html(
            "<div style=\"visibility: hidden\"><span style=\"visibility: visible\">x</span></div>",
        );
        let mut cache = HashMap::new();
        assert!(is_hidden(&tree, find(&tree, "div"), &mut cache));
        assert!(!is_hidden(&tree, find(&tree, "span"), &mut cache));
    }

    #[test]
    fn aria_hidden_inherits_without_reentry() {
        let tree = DomTree::from_html("<div aria-hidden=true><span>x</span></div>");
        let mut cache = HashMap::new();
        assert!(is_hidden(&tree, find(&tree, "span"), &mut cache));
    }

    #[test]
    fn script_content_is_ignored() {
        let tree = DomTree::from_html("<script>let x = 1;</script><p>hi</p>");
        let mut cache = HashMap::new();
        assert!(is_hidden(&tree, find(&tree, "script"), &mut cache));
        assert!(!is_hidden(&tree, find(&tree, "p"), &mut cache));
    }
}
