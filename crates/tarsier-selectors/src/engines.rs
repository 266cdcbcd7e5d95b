//! Leaf predicates shared by the part engines and the engine calls: text
//! matching, visibility, role queries and layout scoring.

use tarsier_aria::{AriaCache, AriaRole};
use tarsier_common::geometry::{Rect, DEFAULT_NEAR_DISTANCE};
use tarsier_common::text::normalize_whitespace;
use tarsier_common::warning::warn_once;
use tarsier_dom::{DomTree, NodeId};

use crate::ast::{RoleQuery, TextPredicate};
use crate::registry::LayoutRelation;

/// Text a `text` engine sees for one element: button-like inputs expose
/// their value, everything else its normalized subtree text.
pub(crate) fn element_text(tree: &DomTree, node: NodeId) -> String {
    if let Some(element) = tree.as_element(node) {
        if element.tag_name == "input" {
            let input_type = element.attr("type").unwrap_or("text");
            // Button-like inputs are addressed by their label text; other
            // input values are not text content.
            if matches!(input_type, "button" | "submit" | "reset") {
                return normalize_whitespace(element.attr("value").unwrap_or(""));
            }
            return String::new();
        }
    }
    normalize_whitespace(&tree.text_content(node))
}

impl TextPredicate {
    /// Test one normalized text value.
    pub(crate) fn test(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
            Self::Exact(expected) => text == normalize_whitespace(expected),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// `text=` / `:text()` matching: the predicate must hold for the element's
/// text, and for no child element's text - the engine selects the
/// innermost matching elements.
pub(crate) fn text_matches_innermost(
    tree: &DomTree,
    node: NodeId,
    predicate: &TextPredicate,
) -> bool {
    if !predicate.test(&element_text(tree, node)) {
        return false;
    }
    !tree.children(node).iter().any(|&child| {
        tree.as_element(child).is_some() && predicate.test(&element_text(tree, child))
    })
}

/// `:has-text()` matching: anywhere in the subtree, no innermost rule.
pub(crate) fn text_matches_subtree(
    tree: &DomTree,
    node: NodeId,
    predicate: &TextPredicate,
) -> bool {
    predicate.test(&element_text(tree, node))
}

/// Visibility for `visible=` and `:visible`: a non-empty layout box and no
/// style-level hiding. Elements without layout information (fixtures that
/// never assign boxes) fall back to the style check alone.
pub(crate) fn is_visible(tree: &DomTree, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(element) = tree.as_element(id) {
            if element.inline_style("display") == Some("none") {
                return false;
            }
            if element.attrs.contains_key("hidden") {
                return false;
            }
        }
        current = tree.parent_or_shadow_host(id);
    }
    if let Some(element) = tree.as_element(node) {
        match element.inline_style("visibility") {
            Some("hidden" | "collapse") => return false,
            _ => {}
        }
        if let Some(rect) = element.layout_box {
            return rect.width > 0.0 && rect.height > 0.0;
        }
    }
    true
}

/// `role=` part matching: role, hiddenness, accessible name and widget
/// states.
pub(crate) fn role_query_matches(
    tree: &DomTree,
    aria: &mut AriaCache,
    node: NodeId,
    query: &RoleQuery,
) -> bool {
    let Ok(wanted) = query.role.parse::<AriaRole>() else {
        warn_once("Selector", &format!("unknown role {:?} never matches", query.role));
        return false;
    };
    if aria.role(tree, node) != Some(wanted) {
        return false;
    }
    if !query.include_hidden && aria.is_hidden(tree, node) {
        return false;
    }
    if let Some(name) = &query.name {
        let actual = aria.accessible_name(tree, node);
        let matched = match name {
            // Role name filters search case-insensitively by substring
            // unless `[exact]` upgraded them.
            TextPredicate::Substring(needle) => actual
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
            TextPredicate::Exact(expected) => actual == normalize_whitespace(expected),
            TextPredicate::Pattern(regex) => regex.is_match(&actual),
        };
        if !matched {
            return false;
        }
    }
    // Tri-state widget attributes must be present to be filtered on;
    // disabled defaults to false for everything.
    let states = [
        (query.checked, tarsier_aria::checked(tree, node)),
        (query.selected, tarsier_aria::selected(tree, node)),
        (query.pressed, tarsier_aria::pressed(tree, node)),
        (query.expanded, tarsier_aria::expanded(tree, node)),
    ];
    for (expected, actual) in states {
        if let Some(expected) = expected {
            if actual != Some(expected) {
                return false;
            }
        }
    }
    if let Some(expected) = query.disabled {
        if tarsier_aria::disabled(tree, node).unwrap_or(false) != expected {
            return false;
        }
    }
    if let Some(expected) = query.level {
        if tarsier_aria::level(tree, node) != Some(expected) {
            return false;
        }
    }
    true
}

/// Score of `node` against the closest layout target: smaller is closer.
/// `None` when no target satisfies the relation (or boxes are missing).
pub(crate) fn layout_score(
    tree: &DomTree,
    relation: LayoutRelation,
    node: NodeId,
    targets: &[NodeId],
    max_distance: Option<f64>,
) -> Option<f64> {
    let rect = tree.layout_box(node)?;
    // Only `near` is bounded by default; the directional relations accept
    // any distance unless the selector caps them.
    let cutoff = max_distance.unwrap_or(match relation {
        LayoutRelation::Near => DEFAULT_NEAR_DISTANCE,
        _ => f64::INFINITY,
    });
    let mut best: Option<f64> = None;
    for &target in targets {
        if target == node {
            continue;
        }
        let Some(other) = tree.layout_box(target) else {
            continue;
        };
        let score = relation_score(relation, rect, other);
        if let Some(score) = score {
            if score <= cutoff && best.is_none_or(|b| score < b) {
                best = Some(score);
            }
        }
    }
    best
}

fn relation_score(relation: LayoutRelation, rect: Rect, other: Rect) -> Option<f64> {
    match relation {
        LayoutRelation::LeftOf => rect.left_of(&other),
        LayoutRelation::RightOf => rect.right_of(&other),
        LayoutRelation::Above => rect.above(&other),
        LayoutRelation::Below => rect.below(&other),
        LayoutRelation::Near => Some(rect.near(&other)),
    }
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
    fn text_matching_is_innermost() {
        let tree = DomTree::from_html("<div><span>apple pie</span></div>");
        let predicate = TextPredicate::Substring("apple".into());
        assert!(text_matches_innermost(
            &tree,
            find(&tree, "span"),
            &predicate
        ));
        assert!(!text_matches_innermost(&tree, find(&tree, "div"), &predicate));
        assert!(text_matches_subtree(&tree, find(&tree, "div"), &predicate));
    }

    #[test]
    fn button_inputs_match_by_value() {
        let tree = DomTree::from_html("<input type=submit value=\"Send it\">");
        let predicate = TextPredicate::Substring("send".into());
        assert!(text_matches_innermost(
            &tree,
            find(&tree, "input"),
            &predicate
        ));
    }

    #[test]
    fn visibility_prefers_layout_boxes() {
        let mut tree = DomTree::from_html("<button>Go</button>");
        let button = find(&tree, "button");
        assert!(is_visible(&tree, button));
        tree.set_layout_box(button, Rect::new(0.0, 0.0, 0.0, 0.0));
        assert!(!is_visible(&tree, button));
        tree.set_layout_box(button, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(is_visible(&tree, button));
    }

    #[test]
    fn role_query_checks_name_and_state() {
        let tree =
            DomTree::from_html("<button aria-pressed=true>Bold</button><button>Italic</button>");
        let mut aria = AriaCache::new();
        let query = RoleQuery {
            role: "button".into(),
            name: Some(TextPredicate::Substring("bold".into())),
            pressed: Some(true),
            ..RoleQuery::default()
        };
        let buttons: Vec<NodeId> = tree
            .descendant_elements(tree.root(), false)
            .into_iter()
            .filter(|&n| role_query_matches(&tree, &mut aria, n, &query))
            .collect();
        assert_eq!(buttons.len(), 1);
        assert_eq!(element_text(&tree, buttons[0]), "Bold");
    }
}
