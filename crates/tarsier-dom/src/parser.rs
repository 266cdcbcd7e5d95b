//! Tolerant HTML fragment parser for building fixture trees.
//!
//! This is deliberately not a conforming HTML parser: no insertion modes, no
//! foster parenting, no character references beyond the common named few. It
//! accepts the markup that tests and embedders actually write — tags,
//! attributes in any quoting style, text, comments, void elements, and
//! declarative shadow DOM via `<template shadowrootmode>` — and degrades
//! everything else to text instead of erroring.

use crate::tree::{DomTree, ElementData, NodeId, NodeKind};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified."
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose raw text content is consumed without tag scanning.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl DomTree {
    /// Parse an HTML fragment into a fresh tree, rooted at the document
    /// node. Never fails; malformed input degrades to text nodes.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut tree = Self::new();
        let mut parser = FragmentParser {
            input: html.chars().collect(),
            position: 0,
        };
        parser.run(&mut tree);
        tree
    }
}

struct FragmentParser {
    input: Vec<char>,
    position: usize,
}

impl FragmentParser {
    fn run(&mut self, tree: &mut DomTree) {
        // Stack of open elements; text and tags append to the top.
        let mut open: Vec<NodeId> = vec![tree.root()];

        while let Some(c) = self.peek() {
            if c == '<' {
                self.handle_tag(tree, &mut open);
            } else {
                let text = self.consume_until('<');
                if !text.is_empty() {
                    let node = tree.alloc(NodeKind::Text(decode_entities(&text)));
                    tree.append_child(*open.last().unwrap_or(&tree.root()), node);
                }
            }
        }
    }

    fn handle_tag(&mut self, tree: &mut DomTree, open: &mut Vec<NodeId>) {
        // Comment?
        if self.starts_with("<!--") {
            self.advance(4);
            let text = self.consume_until_str("-->");
            let node = tree.alloc(NodeKind::Comment(text));
            tree.append_child(*open.last().unwrap_or(&tree.root()), node);
            return;
        }
        // Doctype or other markup declaration: skip to '>'.
        if self.starts_with("<!") {
            let _ = self.consume_until('>');
            self.advance(1);
            return;
        }
        // End tag.
        if self.starts_with("</") {
            self.advance(2);
            let name = self.consume_tag_name();
            let _ = self.consume_until('>');
            self.advance(1);
            self.close_tag(tree, open, &name);
            return;
        }
        // Start tag, or a stray '<' that is just text.
        self.advance(1);
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let node = tree.alloc(NodeKind::Text("<".to_string()));
            tree.append_child(*open.last().unwrap_or(&tree.root()), node);
            return;
        }

        let name = self.consume_tag_name();
        let mut data = ElementData::new(&name);
        let self_closing = self.consume_attributes(&mut data.attrs);

        let parent = *open.last().unwrap_or(&tree.root());

        // Declarative shadow DOM: <template shadowrootmode=...> becomes a
        // shadow root on the current open element instead of a template.
        if data.tag_name == "template" && data.attrs.contains_key("shadowrootmode") {
            if tree.as_element(parent).is_some() && tree.shadow_root(parent).is_none() {
                let shadow = tree.attach_shadow(parent);
                open.push(shadow);
            }
            return;
        }

        let is_void = VOID_ELEMENTS.contains(&data.tag_name.as_str());
        let tag = data.tag_name.clone();
        let node = tree.alloc(NodeKind::Element(data));
        tree.append_child(parent, node);

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) && !self_closing {
            let end = format!("</{tag}");
            let raw = self.consume_until_str(&end);
            let _ = self.consume_until('>');
            self.advance(1);
            if !raw.is_empty() {
                let text = tree.alloc(NodeKind::Text(raw));
                tree.append_child(node, text);
            }
            return;
        }

        if !is_void && !self_closing {
            open.push(node);
        }
    }

    /// Pop the open stack down to (and including) the nearest matching tag.
    /// An unmatched end tag is ignored, as browsers do.
    fn close_tag(&self, tree: &mut DomTree, open: &mut Vec<NodeId>, name: &str) {
        let lowered = name.to_ascii_lowercase();
        let matches_tag = |id: NodeId| {
            tree.as_element(id).is_some_and(|e| e.tag_name == lowered)
                || (lowered == "template"
                    && matches!(tree.get(id).map(|n| &n.kind), Some(NodeKind::ShadowRoot)))
        };
        if let Some(pos) = open.iter().rposition(|&id| matches_tag(id)) {
            open.truncate(pos);
            if open.is_empty() {
                open.push(tree.root());
            }
        }
    }

    /// Consume attributes up to the closing '>'; returns true for `/>`.
    fn consume_attributes(&mut self, attrs: &mut crate::tree::AttributesMap) -> bool {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return false,
                Some('>') => {
                    self.advance(1);
                    return false;
                }
                Some('/') => {
                    self.advance(1);
                    if self.peek() == Some('>') {
                        self.advance(1);
                        return true;
                    }
                }
                Some(_) => {
                    let name = self.consume_attr_name();
                    if name.is_empty() {
                        // Unparseable character; skip it rather than loop.
                        self.advance(1);
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.advance(1);
                        self.skip_whitespace();
                        self.consume_attr_value()
                    } else {
                        String::new()
                    };
                    let _ = attrs.insert(name.to_ascii_lowercase(), decode_entities(&value));
                }
            }
        }
    }

    fn consume_attr_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            name.push(c);
            self.advance(1);
        }
        name
    }

    fn consume_attr_value(&mut self) -> String {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.advance(1);
                let value = self.consume_until(q);
                self.advance(1);
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    value.push(c);
                    self.advance(1);
                }
                value
            }
        }
    }

    fn consume_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                name.push(c);
                self.advance(1);
            } else {
                break;
            }
        }
        name
    }

    fn consume_until(&mut self, stop: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == stop {
                break;
            }
            out.push(c);
            self.advance(1);
        }
        out
    }

    fn consume_until_str(&mut self, stop: &str) -> String {
        let mut out = String::new();
        while self.position < self.input.len() {
            if self.starts_with(stop) {
                self.advance(stop.chars().count());
                return out;
            }
            out.push(self.input[self.position]);
            self.position += 1;
        }
        out
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.input.get(self.position + i).copied() == Some(c))
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self, n: usize) {
        self.position = (self.position + n).min(self.input.len());
    }
}

/// Decode the handful of named character references fixtures actually use.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
