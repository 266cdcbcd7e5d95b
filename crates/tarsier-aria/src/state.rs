//! Widget state getters: checked, pressed, expanded, selected, disabled,
//! level.
//!
//! [WAI-ARIA 1.2 § 6.6 Widget Attributes](https://www.w3.org/TR/wai-aria-1.2/#attrs_widgets)
//!
//! Native HTML state wins over the corresponding `aria-*` attribute where
//! both exist. `aria-checked="mixed"` maps to `None` - tristate matching is
//! out of the query vocabulary.

use tarsier_dom::{DomTree, ElementData, NodeId};

use crate::roles::heading_level;

fn aria_bool(element: &ElementData, attribute: &str) -> Option<bool> {
    match element.attr(attribute) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Checked state for checkboxes, radios, switches and their menu-item
/// variants.
#[must_use]
pub fn checked(tree: &DomTree, node: NodeId) -> Option<bool> {
    let element = tree.as_element(node)?;
    if element.tag_name == "input"
        && matches!(
            element.attr("type").unwrap_or("text"),
            "checkbox" | "radio"
        )
    {
        return Some(element.attrs.contains_key("checked"));
    }
    aria_bool(element, "aria-checked")
}

/// `aria-pressed` toggle-button state.
#[must_use]
pub fn pressed(tree: &DomTree, node: NodeId) -> Option<bool> {
    tree.as_element(node).and_then(|e| aria_bool(e, "aria-pressed"))
}

/// `aria-expanded` disclosure state (`open` on `<details>`).
#[must_use]
pub fn expanded(tree: &DomTree, node: NodeId) -> Option<bool> {
    let element = tree.as_element(node)?;
    if element.tag_name == "details" {
        return Some(element.attrs.contains_key("open"));
    }
    aria_bool(element, "aria-expanded")
}

/// Selected state for options and tabs.
#[must_use]
pub fn selected(tree: &DomTree, node: NodeId) -> Option<bool> {
    let element = tree.as_element(node)?;
    if element.tag_name == "option" {
        return Some(element.attrs.contains_key("selected"));
    }
    aria_bool(element, "aria-selected")
}

/// Disabled state: the `disabled` attribute (inherited from a disabled
/// `<fieldset>` ancestor) or `aria-disabled=true`.
#[must_use]
pub fn disabled(tree: &DomTree, node: NodeId) -> Option<bool> {
    let element = tree.as_element(node)?;
    let native = matches!(
        element.tag_name.as_str(),
        "button" | "input" | "select" | "textarea" | "option" | "optgroup" | "fieldset"
    );
    if native {
        if element.attrs.contains_key("disabled") {
            return Some(true);
        }
        let inherited = tree.ancestors(node).any(|ancestor| {
            tree.as_element(ancestor).is_some_and(|e| {
                e.tag_name == "fieldset" && e.attrs.contains_key("disabled")
            })
        });
        if inherited {
            return Some(true);
        }
    }
    match aria_bool(element, "aria-disabled") {
        Some(value) => Some(value),
        None => native.then_some(false),
    }
}

/// Structural level for headings and tree items.
#[must_use]
pub fn level(tree: &DomTree, node: NodeId) -> Option<u32> {
    if let Some(level) = heading_level(tree, node) {
        return Some(level);
    }
    tree.as_element(node)
        .and_then(|e| e.attr("aria-level"))
        .and_then(|v| v.parse().ok())
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
    fn native_checked_wins() {
        let tree = DomTree::from_html("<input type=checkbox checked aria-checked=false>");
        assert_eq!(checked(&tree, find(&tree, "input")), Some(true));
    }

    #[test]
    fn mixed_checked_is_unmatched() {
        let tree = DomTree::from_html("<div role=checkbox aria-checked=mixed></div>");
        assert_eq!(checked(&tree, find(&tree, "div")), None);
    }

    #[test]
    fn fieldset_disables_descendants() {
        let tree = DomTree::from_html("<fieldset disabled><input></fieldset>");
        assert_eq!(disabled(&tree, find(&tree, "input")), Some(true));
        let tree = DomTree::from_html("<input>");
        assert_eq!(disabled(&tree, find(&tree, "input")), Some(false));
    }

    #[test]
    fn details_open_is_expanded() {
        let tree = DomTree::from_html("<details open><summary>More</summary></details>");
        assert_eq!(expanded(&tree, find(&tree, "details")), Some(true));
    }
}
