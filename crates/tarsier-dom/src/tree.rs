//! The arena DOM tree and its traversal helpers.
//!
//! [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
//!
//! "The DOM represents a document as a tree. A tree is a finite hierarchical
//! tree structure."
//!
//! All nodes live in one contiguous vector, using indices for every
//! relationship. Shadow roots are nodes like any other, but they hang off
//! their host element ([`ElementData::shadow_root`]) instead of appearing in
//! the host's child list, so light-tree traversal never sees them unless a
//! caller explicitly pierces the boundary.

use std::collections::{HashMap, HashSet};

use tarsier_common::geometry::Rect;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub kind: NodeKind,

    /// "An object that participates in a tree has a parent, which is either
    /// null or an object." For a shadow root, the parent link points at the
    /// host element even though the shadow root is not in the host's
    /// children.
    pub parent: Option<NodeId>,

    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// "An object A's next sibling is the object immediately following A in
    /// the children of A's parent."
    pub next_sibling: Option<NodeId>,

    /// "An object A's previous sibling is the object immediately preceding A
    /// in the children of A's parent."
    pub prev_sibling: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
    /// [§ 4.8 Interface ShadowRoot](https://dom.spec.whatwg.org/#interface-shadowroot)
    /// "Shadow roots are always attached to elements" — the attached host is
    /// this node's parent link.
    ShadowRoot,
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
/// we store the local name and attribute list, plus the rendering inputs the
/// engine needs: the layout box supplied by the embedder and an attached
/// shadow root, if any.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name", lowercased at construction.
    pub tag_name: String,
    /// "An element has an associated attribute list"
    pub attrs: AttributesMap,
    /// Attached shadow root, if the element is a shadow host.
    pub shadow_root: Option<NodeId>,
    /// Layout bounding box; `None` means the element generates no box
    /// (not rendered, or layout information was never supplied).
    pub layout_box: Option<Rect>,
}

impl ElementData {
    /// Create element data for a tag with no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: AttributesMap::new(),
            shadow_root: None,
            layout_box: None,
        }
    }

    /// Returns the element's id attribute value if present.
    pub fn id(&self) -> Option<&String> {
        self.attrs.get("id")
    }

    /// Returns the set of class names from the class attribute.
    pub fn classes(&self) -> HashSet<&str> {
        match self.attrs.get("class") {
            Some(classlist) => classlist.split_ascii_whitespace().collect(),
            None => HashSet::new(),
        }
    }

    /// Returns an attribute value by name (names are stored lowercased).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Value of one property in the inline `style` attribute, if declared.
    ///
    /// This is the only styling input the engine consumes; there is no
    /// cascade. `style="display: none; color: red"` yields `Some("none")`
    /// for `display`.
    pub fn inline_style(&self, property: &str) -> Option<&str> {
        let style = self.attrs.get("style")?;
        for declaration in style.split(';') {
            let mut parts = declaration.splitn(2, ':');
            let name = parts.next()?.trim();
            if name.eq_ignore_ascii_case(property) {
                return Some(parts.next().unwrap_or("").trim());
            }
        }
        None
    }
}

/// Arena-based DOM tree with O(1) node access and traversal.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        DomTree {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Appends `child` as the last child of `parent`, updating all
    /// relationships.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Attach a shadow root to `host` and return the new root's ID.
    ///
    /// The shadow root's parent link points at the host, but the root does
    /// not appear in the host's child list: light-tree traversal skips it.
    ///
    /// # Panics
    /// Panics if `host` is not an element or already has a shadow root —
    /// attaching twice is a programming error, mirroring `attachShadow`.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        let root = self.alloc(NodeKind::ShadowRoot);
        self.nodes[root.0].parent = Some(host);
        match &mut self.nodes[host.0].kind {
            NodeKind::Element(data) => {
                assert!(data.shadow_root.is_none(), "host already has a shadow root");
                data.shadow_root = Some(root);
            }
            _ => panic!("shadow roots can only be attached to elements"),
        }
        root
    }

    /// Record the layout bounding box for an element (embedder input).
    pub fn set_layout_box(&mut self, id: NodeId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(id.0)
            && let NodeKind::Element(data) = &mut node.kind
        {
            data.layout_box = Some(rect);
        }
    }

    /// The layout bounding box of an element, if the embedder supplied one.
    #[must_use]
    pub fn layout_box(&self, id: NodeId) -> Option<Rect> {
        self.as_element(id).and_then(|data| data.layout_box)
    }

    /// Get the parent of a node. For a shadow root this is the host element.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Parent element for upward traversal that crosses shadow boundaries:
    /// the parent of a shadow-root child is the shadow root, whose parent is
    /// the host element.
    #[must_use]
    pub fn parent_or_shadow_host(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        match self.get(parent).map(|n| &n.kind) {
            Some(NodeKind::ShadowRoot) => self.parent(parent),
            _ => Some(parent),
        }
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Check if `descendant` is a descendant of `ancestor`, crossing shadow
    /// boundaries upward.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent_or_shadow_host(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_or_shadow_host(id);
        }
        false
    }

    /// Iterate over all ancestors of a node, from parent to root, crossing
    /// shadow boundaries.
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent_or_shadow_host(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first
    /// child).
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Shadow root attached to an element, if any.
    #[must_use]
    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        self.as_element(id).and_then(|data| data.shadow_root)
    }

    /// Collect element descendants of `root` in document (pre-order)
    /// position, optionally descending into shadow roots. `root` itself is
    /// not included.
    ///
    /// When piercing, an element's shadow tree is visited before its light
    /// children, matching composed-tree paint order closely enough for
    /// stable result ordering.
    #[must_use]
    pub fn descendant_elements(&self, root: NodeId, pierce_shadow: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(root, pierce_shadow, &mut out);
        out
    }

    fn collect_descendants(&self, node: NodeId, pierce_shadow: bool, out: &mut Vec<NodeId>) {
        if pierce_shadow && let Some(shadow) = self.shadow_root(node) {
            for &child in self.children(shadow) {
                if self.as_element(child).is_some() {
                    out.push(child);
                }
                self.collect_descendants(child, pierce_shadow, out);
            }
        }
        for &child in self.children(node) {
            if self.as_element(child).is_some() {
                out.push(child);
            }
            self.collect_descendants(child, pierce_shadow, out);
        }
    }

    /// Concatenated text of all descendant text nodes, in document order,
    /// without whitespace normalization. Does not pierce shadow roots.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        for &child in self.children(node) {
            match self.get(child).map(|n| &n.kind) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::Element(_)) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Zero-based position of an element among its element siblings, for
    /// `:nth-child` matching and positional selector generation.
    #[must_use]
    pub fn element_index(&self, id: NodeId) -> usize {
        self.preceding_siblings(id)
            .filter(|&sibling| self.as_element(sibling).is_some())
            .count()
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| matches!(self.get(id).map(|n| &n.kind), Some(NodeKind::Element(_))))
            .copied()
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;

        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| e.tag_name == "body" || e.tag_name == "frameset")
            })
            .copied()
    }

    /// First element with the given `id` attribute, in document order.
    /// Shadow trees are searched too, so `aria-labelledby` references
    /// resolve inside component internals.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendant_elements(NodeId::ROOT, true)
            .into_iter()
            .find(|&node| {
                self.as_element(node)
                    .is_some_and(|data| data.attr("id") == Some(id))
            })
    }

    /// True if the light child of a shadow host would not be rendered
    /// because no slot in the host's shadow tree accepts it.
    ///
    /// A child with a `slot` attribute needs a `<slot name=...>` with the
    /// same name; a child without one needs an unnamed slot.
    #[must_use]
    pub fn is_unslotted(&self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(shadow) = self.shadow_root(parent) else {
            return false;
        };
        let wanted = self.as_element(id).and_then(|data| data.attr("slot"));
        let mut slots = Vec::new();
        self.collect_slots(shadow, &mut slots);
        !slots.iter().any(|slot_name| match (wanted, slot_name) {
            (Some(name), Some(slot)) => name == *slot,
            (None, None) => true,
            _ => false,
        })
    }

    fn collect_slots<'tree>(&'tree self, node: NodeId, out: &mut Vec<Option<&'tree str>>) {
        for &child in self.children(node) {
            if let Some(data) = self.as_element(child) {
                if data.tag_name == "slot" {
                    out.push(data.attr("name"));
                }
                self.collect_slots(child, out);
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node (crossing shadow boundaries upward).
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent_or_shadow_host(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}
