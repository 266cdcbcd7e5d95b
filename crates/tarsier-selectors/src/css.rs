//! Plain-CSS compound fragments and their matching.
//!
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/)
//!
//! A simple selector in the chain grammar carries at most one compound of
//! plain CSS (`div.item[href^="https"]:first-child`). Combinators are not
//! handled here — they belong to the complex-selector level — so this
//! module only answers "does this one element satisfy this compound".

use tarsier_common::warning::warn_once;
use tarsier_dom::{DomTree, ElementData, NodeId, NodeKind};

/// A parsed compound of plain-CSS simple selectors, with its source text
/// kept for re-serialization.
#[derive(Debug, Clone)]
pub struct CssCompound {
    /// The compound exactly as written.
    pub source: String,
    /// The individual simple selectors, in source order.
    pub parts: Vec<CssPart>,
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// One plain-CSS simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssPart {
    /// Type selector: `div`, `p`, `input`.
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// ID selector: `#main`.
    Id(String),
    /// Class selector: `.active`.
    Class(String),
    /// Attribute selector: `[href]`, `[type="text"]`, `[href^=https]`.
    Attribute(AttributeSelector),
    /// Structural or state pseudo-class the engine evaluates natively.
    Pseudo(CssPseudo),
    /// A pseudo-class or pseudo-element left embedded in the fragment
    /// untouched because no engine handles it (`:hover`, `::before`).
    /// Never matches; its presence is warned about once.
    NeverMatch(String),
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]` - has the attribute
    Exists(String),
    /// `[attr=value]` - exact value match
    Equals(String, String),
    /// `[attr~=value]` - whitespace-separated word match
    Includes(String, String),
    /// `[attr|=value]` - exact or `value-` prefix
    DashMatch(String, String),
    /// `[attr^=value]` - prefix
    PrefixMatch(String, String),
    /// `[attr$=value]` - suffix
    SuffixMatch(String, String),
    /// `[attr*=value]` - substring
    SubstringMatch(String, String),
}

/// Structural and state pseudo-classes matched with tree context, per
/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssPseudo {
    /// `:root` - the document element
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:nth-child(n)` - integer form only
    NthChild(i64),
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:empty`
    Empty,
    /// `:disabled` - has the disabled attribute
    Disabled,
    /// `:enabled`
    Enabled,
    /// `:checked` - checked/selected attribute or aria-checked=true
    Checked,
}

impl CssCompound {
    /// Check whether this compound matches the element at `node`.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        self.parts.iter().all(|part| match part {
            CssPart::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            CssPart::Universal => true,
            CssPart::Id(id) => element.id().is_some_and(|el_id| el_id == id),
            CssPart::Class(class) => element.classes().contains(class.as_str()),
            CssPart::Attribute(attr) => attribute_matches(attr, element),
            CssPart::Pseudo(pseudo) => pseudo_matches(pseudo, tree, node, element),
            CssPart::NeverMatch(name) => {
                warn_once("Selector", &format!("pseudo {name:?} never matches"));
                false
            }
        })
    }
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
fn attribute_matches(attr: &AttributeSelector, element: &ElementData) -> bool {
    match attr {
        AttributeSelector::Exists(name) => element.attrs.contains_key(name.as_str()),
        AttributeSelector::Equals(name, val) => element.attr(name).is_some_and(|v| v == val),
        AttributeSelector::Includes(name, val) => element
            .attr(name)
            .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
        AttributeSelector::DashMatch(name, val) => element
            .attr(name)
            .is_some_and(|v| v == val || v.strip_prefix(val.as_str()).is_some_and(|rest| rest.starts_with('-'))),
        AttributeSelector::PrefixMatch(name, val) => {
            element.attr(name).is_some_and(|v| v.starts_with(val.as_str()))
        }
        AttributeSelector::SuffixMatch(name, val) => {
            element.attr(name).is_some_and(|v| v.ends_with(val.as_str()))
        }
        AttributeSelector::SubstringMatch(name, val) => {
            element.attr(name).is_some_and(|v| v.contains(val.as_str()))
        }
    }
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
fn pseudo_matches(pseudo: &CssPseudo, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
    match pseudo {
        CssPseudo::Root => tree.document_element() == Some(node),

        // "The :first-child pseudo-class represents an element that is
        // first among its inclusive siblings."
        CssPseudo::FirstChild => tree.parent(node).is_some_and(|parent| {
            tree.children(parent)
                .iter()
                .find(|&&c| tree.as_element(c).is_some())
                == Some(&node)
        }),

        CssPseudo::LastChild => tree.parent(node).is_some_and(|parent| {
            tree.children(parent)
                .iter()
                .rev()
                .find(|&&c| tree.as_element(c).is_some())
                == Some(&node)
        }),

        CssPseudo::OnlyChild => tree.parent(node).is_some_and(|parent| {
            tree.children(parent)
                .iter()
                .filter(|&&c| tree.as_element(c).is_some())
                .count()
                == 1
        }),

        // Integer form only; the an+b grammar stays embedded as NeverMatch.
        CssPseudo::NthChild(n) => {
            i64::try_from(tree.element_index(node)).is_ok_and(|index| index == *n - 1)
        }

        CssPseudo::FirstOfType => tree.parent(node).is_some_and(|parent| {
            tree.children(parent).iter().find(|&&c| {
                tree.as_element(c)
                    .is_some_and(|e| e.tag_name == element.tag_name)
            }) == Some(&node)
        }),

        CssPseudo::LastOfType => tree.parent(node).is_some_and(|parent| {
            tree.children(parent).iter().rev().find(|&&c| {
                tree.as_element(c)
                    .is_some_and(|e| e.tag_name == element.tag_name)
            }) == Some(&node)
        }),

        // "The :empty pseudo-class represents an element that has no
        // children at all" - whitespace-only text and comments excepted.
        CssPseudo::Empty => {
            tree.children(node)
                .iter()
                .all(|&c| match tree.get(c).map(|n| &n.kind) {
                    Some(NodeKind::Text(t)) => t.trim().is_empty(),
                    Some(NodeKind::Comment(_)) => true,
                    _ => false,
                })
        }

        CssPseudo::Disabled => element.attrs.contains_key("disabled"),
        CssPseudo::Enabled => !element.attrs.contains_key("disabled"),

        CssPseudo::Checked => {
            element.attrs.contains_key("checked")
                || element.attrs.contains_key("selected")
                || element.attr("aria-checked") == Some("true")
        }
    }
}
