//! Accessible name and description computation.
//!
//! [Accessible Name and Description Computation 1.1](https://www.w3.org/TR/accname-1.1/)
//!
//! Condensed to the precedence that matters in practice:
//! `aria-labelledby` (cycle-guarded) → `aria-label` → the element's native
//! labelling mechanism (input values, `<label>`, `alt`, `<caption>`,
//! `<figcaption>`, `<legend>`, SVG `<title>`) → subtree content for roles
//! that name from content (and for any element reached through a label
//! traversal) → the `title` attribute. Descriptions run
//! `aria-describedby` → `aria-description` → `title`, with `title` skipped
//! when it already supplied the name.

use std::collections::{HashMap, HashSet};

use tarsier_common::text::normalize_whitespace;
use tarsier_dom::{DomTree, ElementData, NodeId, NodeKind};

use crate::hidden::is_hidden;
use crate::roles::resolve_role;

/// Accessible name of `node`, whitespace-normalized; empty when the
/// element has none.
pub(crate) fn accessible_name(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
) -> String {
    let mut visited = HashSet::new();
    text_alternative(tree, node, blocked, &mut visited, false)
}

/// Accessible description of `node`, whitespace-normalized.
pub(crate) fn accessible_description(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
) -> String {
    let Some(element) = tree.as_element(node) else {
        return String::new();
    };
    if let Some(refs) = element.attr("aria-describedby") {
        let mut visited = HashSet::new();
        let _ = visited.insert(node);
        let joined = join_references(tree, refs, blocked, &mut visited);
        if !joined.is_empty() {
            return joined;
        }
    }
    if let Some(description) = non_empty(element.attr("aria-description")) {
        return normalize_whitespace(description);
    }
    if let Some(title) = non_empty(element.attr("title")) {
        // A title that already became the name does not repeat as the
        // description.
        if accessible_name(tree, node, blocked) != normalize_whitespace(title) {
            return normalize_whitespace(title);
        }
    }
    String::new()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// "The text alternative for a node is computed as follows" - the visited
/// set breaks `aria-labelledby` reference cycles.
fn text_alternative(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
    embedded: bool,
) -> String {
    if !visited.insert(node) {
        return String::new();
    }
    let Some(element) = tree.as_element(node) else {
        if let Some(NodeKind::Text(text)) = tree.get(node).map(|n| &n.kind) {
            return normalize_whitespace(text);
        }
        return String::new();
    };

    if !embedded {
        if let Some(refs) = element.attr("aria-labelledby") {
            let joined = join_references(tree, refs, blocked, visited);
            if !joined.is_empty() {
                return joined;
            }
        }
    }

    if let Some(label) = non_empty(element.attr("aria-label")) {
        return normalize_whitespace(label);
    }

    if let Some(native) = native_name(tree, node, element, blocked, visited) {
        if !native.is_empty() {
            return native;
        }
    }

    let names_from_content =
        resolve_role(tree, node).is_some_and(crate::roles::AriaRole::names_from_content);
    if embedded || names_from_content {
        let content = subtree_content(tree, node, blocked, visited);
        if !content.is_empty() {
            return content;
        }
    }

    non_empty(element.attr("title")).map(normalize_whitespace).unwrap_or_default()
}

fn join_references(
    tree: &DomTree,
    refs: &str,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
) -> String {
    let parts: Vec<String> = refs
        .split_ascii_whitespace()
        .filter_map(|id| tree.element_by_id(id))
        .map(|target| text_alternative(tree, target, blocked, visited, true))
        .filter(|part| !part.is_empty())
        .collect();
    normalize_whitespace(&parts.join(" "))
}

/// Host-language labelling, per the HTML accessibility API mappings.
fn native_name(
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
) -> Option<String> {
    match element.tag_name.as_str() {
        "input" => {
            let input_type = element.attr("type").unwrap_or("text").to_ascii_lowercase();
            match input_type.as_str() {
                "button" | "submit" | "reset" => {
                    if let Some(value) = non_empty(element.attr("value")) {
                        return Some(normalize_whitespace(value));
                    }
                    match input_type.as_str() {
                        "submit" => Some("Submit".to_owned()),
                        "reset" => Some("Reset".to_owned()),
                        _ => None,
                    }
                }
                "image" => non_empty(element.attr("alt"))
                    .or_else(|| non_empty(element.attr("title")))
                    .map(normalize_whitespace),
                _ => control_label(tree, node, element, blocked, visited),
            }
        }
        "textarea" | "select" => control_label(tree, node, element, blocked, visited),
        "img" | "area" => non_empty(element.attr("alt")).map(normalize_whitespace),
        "table" => named_child(tree, node, "caption", blocked, visited),
        "figure" => named_child(tree, node, "figcaption", blocked, visited),
        "fieldset" => named_child(tree, node, "legend", blocked, visited),
        "svg" => tree
            .children(node)
            .iter()
            .find(|&&child| tree.as_element(child).is_some_and(|e| e.tag_name == "title"))
            .map(|&child| normalize_whitespace(&tree.text_content(child))),
        _ => None,
    }
}

/// `<label for=...>` or a wrapping `<label>`, then `placeholder`, then
/// `title` for text-entry controls.
fn control_label(
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
) -> Option<String> {
    let label = element
        .id()
        .and_then(|id| find_label_for(tree, id))
        .or_else(|| {
            tree.ancestors(node).find(|&ancestor| {
                tree.as_element(ancestor).is_some_and(|e| e.tag_name == "label")
            })
        });
    if let Some(label) = label {
        let text = subtree_content(tree, label, blocked, visited);
        if !text.is_empty() {
            return Some(text);
        }
    }
    non_empty(element.attr("placeholder"))
        .or_else(|| non_empty(element.attr("title")))
        .map(normalize_whitespace)
}

fn find_label_for(tree: &DomTree, control_id: &str) -> Option<NodeId> {
    tree.descendant_elements(NodeId::ROOT, true)
        .into_iter()
        .find(|&node| {
            tree.as_element(node)
                .is_some_and(|e| e.tag_name == "label" && e.attr("for") == Some(control_id))
        })
}

fn named_child(
    tree: &DomTree,
    node: NodeId,
    tag: &str,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
) -> Option<String> {
    tree.children(node)
        .iter()
        .find(|&&child| tree.as_element(child).is_some_and(|e| e.tag_name == tag))
        .map(|&child| subtree_content(tree, child, blocked, visited))
}

/// Visible subtree text, each element child contributing its own text
/// alternative (embedded traversal).
fn subtree_content(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
) -> String {
    let mut pieces = Vec::new();
    collect_content(tree, node, blocked, visited, &mut pieces);
    normalize_whitespace(&pieces.join(" "))
}

fn collect_content(
    tree: &DomTree,
    node: NodeId,
    blocked: &mut HashMap<NodeId, bool>,
    visited: &mut HashSet<NodeId>,
    pieces: &mut Vec<String>,
) {
    let children: Vec<NodeId> = tree
        .shadow_root(node)
        .map_or_else(|| tree.children(node).to_vec(), |shadow| tree.children(shadow).to_vec());
    for child in children {
        match tree.get(child).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => {
                let text = normalize_whitespace(text);
                if !text.is_empty() {
                    pieces.push(text);
                }
            }
            Some(NodeKind::Element(_)) => {
                if is_hidden(tree, child, blocked) {
                    continue;
                }
                let part = text_alternative(tree, child, blocked, visited, true);
                if !part.is_empty() {
                    pieces.push(part);
                }
            }
            _ => {}
        }
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

    fn name(html: &str, tag: &str) -> String {
        let tree = DomTree::from_html(html);
        let mut blocked = HashMap::new();
        accessible_name(&tree, find(&tree, tag), &mut blocked)
    }

    #[test]
    fn labelledby_beats_label_and_content() {
        let html = "<span id=t>From reference</span>\
                    <button aria-labelledby=t aria-label=ignored>content</button>";
        assert_eq!(name(html, "button"), "From reference");
    }

    #[test]
    fn labelledby_cycle_terminates() {
        let html = "<button id=a aria-labelledby=\"a b\">self</button>\
                    <button id=b aria-labelledby=a>other</button>";
        assert_eq!(name(html, "button"), "self");
    }

    #[test]
    fn aria_label_beats_content() {
        assert_eq!(name("<button aria-label=\"Close\">X</button>", "button"), "Close");
    }

    #[test]
    fn button_names_from_content() {
        assert_eq!(
            name("<button> Save <b>now</b> </button>", "button"),
            "Save now"
        );
    }

    #[test]
    fn input_label_placeholder_precedence() {
        let html = "<label for=q>Search terms</label><input id=q placeholder=\"Type here\">";
        assert_eq!(name(html, "input"), "Search terms");
        assert_eq!(name("<input placeholder=\"Type here\">", "input"), "Type here");
    }

    #[test]
    fn submit_input_defaults() {
        assert_eq!(name("<input type=submit>", "input"), "Submit");
        assert_eq!(name("<input type=submit value=\"Go\">", "input"), "Go");
    }

    #[test]
    fn image_alt_and_table_caption() {
        assert_eq!(name("<img alt=\"A cat\">", "img"), "A cat");
        assert_eq!(
            name("<table><caption>Prices</caption><tr><td>1</td></tr></table>", "table"),
            "Prices"
        );
    }

    #[test]
    fn hidden_content_is_excluded_from_names() {
        assert_eq!(
            name(
                "<button>Save<span style=\"display: none\"> draft</span></button>",
                "button"
            ),
            "Save"
        );
    }

    #[test]
    fn title_is_the_last_resort() {
        assert_eq!(name("<button title=\"Close dialog\"></button>", "button"), "Close dialog");
    }

    #[test]
    fn description_skips_title_used_as_name() {
        let tree = DomTree::from_html("<button title=\"Close dialog\"></button>");
        let mut blocked = HashMap::new();
        let node = find(&tree, "button");
        assert_eq!(accessible_description(&tree, node, &mut blocked), "");
        let tree =
            DomTree::from_html("<button aria-label=Close title=\"Closes the dialog\">x</button>");
        let mut blocked = HashMap::new();
        let node = find(&tree, "button");
        assert_eq!(
            accessible_description(&tree, node, &mut blocked),
            "Closes the dialog"
        );
    }
}
