//! Per-pass accessibility cache.
//!
//! Role resolution, hidden computation and name computation are all
//! recursive tree walks; one query or snapshot build touches the same
//! elements many times. The cache is an explicit object handed to whoever
//! needs it, reference-counted with [`AriaCache::begin`]/[`AriaCache::end`]
//! so nested passes share entries and the outermost `end` drops them (the
//! DOM may change between passes).

use std::collections::HashMap;

use tarsier_dom::{DomTree, NodeId};

use crate::hidden;
use crate::name;
use crate::roles::{self, AriaRole};

/// Memo store for role / hidden / name computations over one DOM pass.
#[derive(Debug, Default)]
pub struct AriaCache {
    passes: usize,
    blocked: HashMap<NodeId, bool>,
    roles: HashMap<NodeId, Option<AriaRole>>,
    names: HashMap<NodeId, String>,
    descriptions: HashMap<NodeId, String>,
}

impl AriaCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a pass. Nested passes stack.
    pub fn begin(&mut self) {
        self.passes += 1;
    }

    /// Leave a pass; the outermost leave clears all entries.
    ///
    /// # Panics
    /// Panics on unbalanced `end` without a matching `begin` - that is a
    /// defect in the caller, not a data error.
    pub fn end(&mut self) {
        assert!(self.passes > 0, "AriaCache::end without begin");
        self.passes -= 1;
        if self.passes == 0 {
            self.blocked.clear();
            self.roles.clear();
            self.names.clear();
            self.descriptions.clear();
        }
    }

    /// Resolved role of an element (memoized).
    pub fn role(&mut self, tree: &DomTree, node: NodeId) -> Option<AriaRole> {
        if let Some(&cached) = self.roles.get(&node) {
            return cached;
        }
        let role = roles::resolve_role(tree, node);
        let _ = self.roles.insert(node, role);
        role
    }

    /// Hidden-for-accessibility (memoized on the inherited part).
    pub fn is_hidden(&mut self, tree: &DomTree, node: NodeId) -> bool {
        hidden::is_hidden(tree, node, &mut self.blocked)
    }

    /// Accessible name (memoized).
    pub fn accessible_name(&mut self, tree: &DomTree, node: NodeId) -> String {
        if let Some(cached) = self.names.get(&node) {
            return cached.clone();
        }
        let name = name::accessible_name(tree, node, &mut self.blocked);
        let _ = self.names.insert(node, name.clone());
        name
    }

    /// Accessible description (memoized).
    pub fn accessible_description(&mut self, tree: &DomTree, node: NodeId) -> String {
        if let Some(cached) = self.descriptions.get(&node) {
            return cached.clone();
        }
        let description = name::accessible_description(tree, node, &mut self.blocked);
        let _ = self.descriptions.insert(node, description.clone());
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_clears_only_at_the_outermost_pass() {
        let tree = DomTree::from_html("<button>Go</button>");
        let node = tree
            .descendant_elements(tree.root(), false)
            .into_iter()
            .find(|&n| tree.as_element(n).is_some_and(|e| e.tag_name == "button"))
            .expect("button");

        let mut cache = AriaCache::new();
        cache.begin();
        cache.begin();
        assert_eq!(cache.accessible_name(&tree, node), "Go");
        cache.end();
        assert!(!cache.names.is_empty());
        cache.end();
        assert!(cache.names.is_empty());
    }

    #[test]
    #[should_panic(expected = "end without begin")]
    fn unbalanced_end_panics() {
        AriaCache::new().end();
    }
}
