//! Accessibility-tree snapshot builder.
//!
//! A snapshot is the role-bearing skeleton of the document: hidden
//! elements are dropped, role-less containers are flattened into their
//! parents, text is whitespace-normalized, and every emitted node carries a
//! reference id so an embedder can map a matched snapshot node back to the
//! DOM element while the snapshot is still the latest one.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tarsier_common::text::normalize_whitespace;
use tarsier_dom::{DomTree, NodeId, NodeKind};

use crate::cache::AriaCache;
use crate::hidden::is_display_contents;
use crate::roles::AriaRole;
use crate::state;

/// One node of an accessibility snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AriaNode {
    /// Resolved role.
    pub role: AriaRole,
    /// Accessible name (may be empty).
    pub name: String,
    /// Checked state, when the role carries one.
    pub checked: Option<bool>,
    /// Disabled state.
    pub disabled: Option<bool>,
    /// Expanded state.
    pub expanded: Option<bool>,
    /// Heading / tree-item level.
    pub level: Option<u32>,
    /// Pressed state.
    pub pressed: Option<bool>,
    /// Selected state.
    pub selected: Option<bool>,
    /// Extra exposed properties (`url` for links).
    pub props: BTreeMap<String, String>,
    /// Reference id resolvable through the owning snapshot.
    pub ref_id: u32,
    /// Child nodes and text runs, in document order.
    pub children: Vec<AriaChild>,
}

/// A snapshot child: a nested role node or a text run.
#[derive(Debug, Clone, Serialize)]
pub enum AriaChild {
    /// Nested role-bearing node.
    Node(AriaNode),
    /// Normalized text run.
    Text(String),
}

/// A built snapshot: top-level children plus the reference table and the
/// generation stamp that invalidates older snapshots.
#[derive(Debug, Clone)]
pub struct AriaSnapshot {
    /// Top-level children of the snapshot root.
    pub children: Vec<AriaChild>,
    /// Generation stamp assigned by the owner; larger is newer.
    pub generation: u64,
    refs: HashMap<u32, NodeId>,
}

impl AriaSnapshot {
    /// Map a node's `ref_id` back to its DOM element.
    #[must_use]
    pub fn resolve(&self, ref_id: u32) -> Option<NodeId> {
        self.refs.get(&ref_id).copied()
    }

    /// Build a snapshot of the subtree under `root`.
    #[must_use]
    pub fn build(tree: &DomTree, root: NodeId, cache: &mut AriaCache, generation: u64) -> Self {
        let mut builder = SnapshotBuilder {
            tree,
            cache,
            refs: HashMap::new(),
            next_ref: 1,
        };
        let mut children = Vec::new();
        builder.visit_children(root, &mut children);
        Self {
            children,
            generation,
            refs: builder.refs,
        }
    }
}

struct SnapshotBuilder<'a> {
    tree: &'a DomTree,
    cache: &'a mut AriaCache,
    refs: HashMap<u32, NodeId>,
    next_ref: u32,
}

impl SnapshotBuilder<'_> {
    /// Walk the children of `node`, descending into the shadow tree of a
    /// shadow host instead of its light children.
    fn visit_children(&mut self, node: NodeId, out: &mut Vec<AriaChild>) {
        let scope = self.tree.shadow_root(node).unwrap_or(node);
        for &child in self.tree.children(scope) {
            self.visit(child, out);
        }
    }

    fn visit(&mut self, node: NodeId, out: &mut Vec<AriaChild>) {
        match self.tree.get(node).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => {
                let text = normalize_whitespace(text);
                if !text.is_empty() {
                    out.push(AriaChild::Text(text));
                }
            }
            Some(NodeKind::Element(_)) => {
                if self.cache.is_hidden(self.tree, node) {
                    return;
                }
                let role = self.cache.role(self.tree, node);
                match role {
                    Some(role)
                        if role != AriaRole::Generic
                            && !is_display_contents(self.tree, node) =>
                    {
                        out.push(AriaChild::Node(self.element_node(node, role)));
                    }
                    // Role-less containers and display:contents elements
                    // flatten into the parent.
                    _ => self.visit_children(node, out),
                }
            }
            _ => {}
        }
    }

    fn element_node(&mut self, node: NodeId, role: AriaRole) -> AriaNode {
        let name = self.cache.accessible_name(self.tree, node);
        let ref_id = self.next_ref;
        self.next_ref += 1;
        let _ = self.refs.insert(ref_id, node);

        let mut props = BTreeMap::new();
        if role == AriaRole::Link {
            if let Some(href) = self.tree.as_element(node).and_then(|e| e.attr("href")) {
                let _ = props.insert("url".to_owned(), href.to_owned());
            }
        }

        let mut children = Vec::new();
        self.visit_children(node, &mut children);
        // A leaf whose whole content is its own name renders as one line;
        // drop the redundant text child.
        if !name.is_empty()
            && children.len() == 1
            && matches!(&children[0], AriaChild::Text(text) if *text == name)
        {
            children.clear();
        }

        AriaNode {
            role,
            name,
            checked: state::checked(self.tree, node),
            disabled: state::disabled(self.tree, node).filter(|&d| d),
            expanded: state::expanded(self.tree, node),
            level: state::level(self.tree, node),
            pressed: state::pressed(self.tree, node),
            selected: state::selected(self.tree, node),
            props,
            ref_id,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(html: &str) -> AriaSnapshot {
        let tree = DomTree::from_html(html);
        let mut cache = AriaCache::new();
        let root = tree.body().unwrap_or_else(|| tree.root());
        AriaSnapshot::build(&tree, root, &mut cache, 1)
    }

    fn roles(children: &[AriaChild]) -> Vec<String> {
        children
            .iter()
            .filter_map(|child| match child {
                AriaChild::Node(node) => Some(node.role.to_string()),
                AriaChild::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn flattens_roleless_containers() {
        let snap = snapshot("<div><span><button>Go</button></span></div>");
        assert_eq!(roles(&snap.children), vec!["button"]);
    }

    #[test]
    fn drops_hidden_subtrees() {
        let snap = snapshot("<button>A</button><div hidden><button>B</button></div>");
        let AriaChild::Node(button) = &snap.children[0] else {
            panic!("expected node");
        };
        assert_eq!(button.name, "A");
        assert_eq!(snap.children.len(), 1);
    }

    #[test]
    fn leaf_name_folds_text_child() {
        let snap = snapshot("<button>Save</button>");
        let AriaChild::Node(button) = &snap.children[0] else {
            panic!("expected node");
        };
        assert_eq!(button.name, "Save");
        assert!(button.children.is_empty());
    }

    #[test]
    fn links_carry_their_url() {
        let snap = snapshot("<a href=\"/docs\">Docs</a>");
        let AriaChild::Node(link) = &snap.children[0] else {
            panic!("expected node");
        };
        assert_eq!(link.props.get("url").map(String::as_str), Some("/docs"));
    }

    #[test]
    fn refs_resolve_to_dom_nodes() {
        let tree = DomTree::from_html("<button>Go</button>");
        let mut cache = AriaCache::new();
        let snap = AriaSnapshot::build(&tree, tree.root(), &mut cache, 7);
        let AriaChild::Node(button) = &snap.children[0] else {
            panic!("expected node");
        };
        let resolved = snap.resolve(button.ref_id).expect("ref resolves");
        assert_eq!(
            tree.as_element(resolved).map(|e| e.tag_name.as_str()),
            Some("button")
        );
        assert_eq!(snap.generation, 7);
    }
}
