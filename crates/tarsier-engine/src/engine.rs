//! The embedder-facing facade.
//!
//! [`Engine`] owns one document, the shared evaluation caches, the latest
//! accessibility snapshot and the highlight list. All operations are
//! synchronous; an embedder drives the engine from a single logical
//! thread and repaints highlights itself.

use tarsier_aria::{
    matches_template, render, AriaSnapshot, MatchMode, RenderMode, SnapshotError, TemplateChild,
};
use tarsier_common::text::normalize_whitespace;
use tarsier_dom::{DomTree, NodeId};
use tarsier_locator::{
    selector_to_tokens, GeneratedSelector, GeneratorOptions, TargetLanguage,
};
use tarsier_selectors::{query, QueryCache, QueryError, Selector};

use crate::error::{ElementPreview, EngineError};

/// Color entries painted for a plain highlight.
const HIGHLIGHT_COLOR: &str = "#6fa8dc7f";

/// Longest element text included in a strict-mode preview.
const PREVIEW_TEXT_LENGTH: usize = 40;

/// Result of matching an ARIA template against the document.
#[derive(Debug, Clone)]
pub struct TemplateMatch {
    /// Whether the template matched.
    pub matched: bool,
    /// The snapshot rendered in plain mode.
    pub rendered: String,
    /// The snapshot rendered in regex mode (volatile numbers blurred).
    pub rendered_regex: String,
}

/// One document plus the evaluation state the boundary operations share.
#[derive(Debug)]
pub struct Engine {
    tree: DomTree,
    cache: QueryCache,
    snapshot: Option<AriaSnapshot>,
    generations: u64,
    test_id_attribute: String,
    highlights: Vec<(NodeId, String)>,
}

impl Engine {
    /// Wrap a document.
    #[must_use]
    pub fn new(tree: DomTree) -> Self {
        Self {
            tree,
            cache: QueryCache::new(),
            snapshot: None,
            generations: 0,
            test_id_attribute: "data-testid".to_owned(),
            highlights: Vec::new(),
        }
    }

    /// Parse an HTML fragment and wrap the resulting document.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        Self::new(DomTree::from_html(html))
    }

    /// The wrapped document.
    #[must_use]
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Mutable access to the document, for layout boxes and fixtures.
    /// Snapshot references taken before a mutation stay resolvable only
    /// through their generation check.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Change the attribute the selector generator treats as the test id.
    pub fn set_test_id_attribute(&mut self, attribute: impl Into<String>) {
        self.test_id_attribute = attribute.into();
    }

    /// All elements the selector resolves to under `root` (the document
    /// root when `None`), in document order.
    ///
    /// # Errors
    /// [`QueryError`] for unknown engines or an unqueryable root.
    pub fn query_selector_all(
        &mut self,
        selector: &Selector,
        root: Option<NodeId>,
    ) -> Result<Vec<NodeId>, QueryError> {
        let root = root.unwrap_or_else(|| self.tree.root());
        query(&self.tree, selector, root, &mut self.cache)
    }

    /// The first element the selector resolves to, or `None`. With
    /// `strict` set, more than one match is an error carrying up to ten
    /// previews of the offending elements.
    ///
    /// # Errors
    /// [`EngineError::StrictModeViolation`] on an ambiguous strict query;
    /// [`EngineError::Query`] as for [`Self::query_selector_all`].
    pub fn query_selector(
        &mut self,
        selector: &Selector,
        root: Option<NodeId>,
        strict: bool,
    ) -> Result<Option<NodeId>, EngineError> {
        let matched = self.query_selector_all(selector, root)?;
        if strict && matched.len() > 1 {
            let mut previews = Vec::new();
            for &element in matched.iter().take(10) {
                previews.push(self.preview(element));
            }
            return Err(EngineError::StrictModeViolation { previews });
        }
        Ok(matched.first().copied())
    }

    /// Generate the cheapest uniquely-resolving selector for `target`.
    ///
    /// # Panics
    /// Panics when `target` is not an element.
    pub fn generate_selector(
        &mut self,
        target: NodeId,
        options: &GeneratorOptions,
    ) -> GeneratedSelector {
        tarsier_locator::generate_selector(&self.tree, &mut self.cache, target, options)
    }

    /// [`Self::generate_selector`] with default options, selector string
    /// only.
    ///
    /// # Panics
    /// Panics when `target` is not an element.
    pub fn generate_selector_string(&mut self, target: NodeId) -> String {
        let options = GeneratorOptions {
            test_id_attribute: self.test_id_attribute.clone(),
            ..GeneratorOptions::default()
        };
        self.generate_selector(target, &options).selector
    }

    /// Build and store a new accessibility snapshot of the subtree under
    /// `root` (the document root when `None`). Returns the rendered text
    /// and the snapshot's generation; older generations become stale.
    pub fn build_aria_snapshot(
        &mut self,
        root: Option<NodeId>,
        mode: RenderMode,
    ) -> (String, u64) {
        let root = root.unwrap_or_else(|| self.tree.root());
        self.generations += 1;
        self.cache.begin();
        let snapshot = AriaSnapshot::build(&self.tree, root, self.cache.aria_mut(), self.generations);
        self.cache.end();
        let rendered = render(&snapshot, mode);
        let generation = snapshot.generation;
        self.snapshot = Some(snapshot);
        (rendered, generation)
    }

    /// Map a snapshot reference id back to its DOM element. Only the
    /// latest snapshot's generation is accepted.
    ///
    /// # Errors
    /// [`SnapshotError::Stale`] when `generation` is not the latest
    /// snapshot's.
    pub fn resolve_snapshot_ref(
        &self,
        generation: u64,
        ref_id: u32,
    ) -> Result<Option<NodeId>, EngineError> {
        let Some(snapshot) = self
            .snapshot
            .as_ref()
            .filter(|snapshot| snapshot.generation == generation)
        else {
            return Err(SnapshotError::Stale {
                requested: generation,
                latest: self.generations,
            }
            .into());
        };
        Ok(snapshot.resolve(ref_id))
    }

    /// Build a fresh snapshot under `root` and match `template` against
    /// it. The built snapshot becomes the latest one.
    ///
    /// # Errors
    /// [`SnapshotError::BadPattern`] when a template regex is invalid.
    pub fn match_aria_template(
        &mut self,
        root: Option<NodeId>,
        template: &[TemplateChild],
        mode: MatchMode,
    ) -> Result<TemplateMatch, EngineError> {
        let root = root.unwrap_or_else(|| self.tree.root());
        self.generations += 1;
        self.cache.begin();
        let snapshot = AriaSnapshot::build(&self.tree, root, self.cache.aria_mut(), self.generations);
        self.cache.end();
        let matched = matches_template(&snapshot, template, mode).map_err(EngineError::from)?;
        let outcome = TemplateMatch {
            matched,
            rendered: render(&snapshot, RenderMode::Plain),
            rendered_regex: render(&snapshot, RenderMode::Regex),
        };
        self.snapshot = Some(snapshot);
        Ok(outcome)
    }

    /// Render a selector as locator source for `language`, using the
    /// engine's configured test id attribute.
    #[must_use]
    pub fn locator_source(&self, selector: &Selector, language: TargetLanguage) -> String {
        let tokens = selector_to_tokens(selector, &self.test_id_attribute);
        tarsier_locator::render(&tokens, language)
    }

    /// Highlight every element the selector resolves to. Presentation
    /// only; queries never see highlight state.
    ///
    /// # Errors
    /// [`QueryError`] as for [`Self::query_selector_all`].
    pub fn highlight(&mut self, selector: &Selector) -> Result<(), QueryError> {
        let matched = self.query_selector_all(selector, None)?;
        self.highlights = matched
            .into_iter()
            .map(|node| (node, HIGHLIGHT_COLOR.to_owned()))
            .collect();
        Ok(())
    }

    /// Replace the highlight list with every element the selectors
    /// resolve to, painted in `color`.
    ///
    /// # Errors
    /// [`QueryError`] as for [`Self::query_selector_all`].
    pub fn mask_elements(&mut self, selectors: &[Selector], color: &str) -> Result<(), QueryError> {
        let mut entries: Vec<(NodeId, String)> = Vec::new();
        for selector in selectors {
            for node in self.query_selector_all(selector, None)? {
                if !entries.iter().any(|(existing, _)| *existing == node) {
                    entries.push((node, color.to_owned()));
                }
            }
        }
        self.highlights = entries;
        Ok(())
    }

    /// Clear the highlight list.
    pub fn hide_highlight(&mut self) {
        self.highlights.clear();
    }

    /// The `(element, color)` entries an embedder should paint.
    #[must_use]
    pub fn highlighted(&self) -> &[(NodeId, String)] {
        &self.highlights
    }

    fn preview(&mut self, element: NodeId) -> ElementPreview {
        let selector = self
            .generate_selector(element, &GeneratorOptions::default())
            .selector;
        ElementPreview {
            element,
            markup: markup_preview(&self.tree, element),
            selector,
        }
    }
}

/// `<tag id="...">text</tag>`-shaped one-line preview of an element.
fn markup_preview(tree: &DomTree, node: NodeId) -> String {
    let Some(element) = tree.as_element(node) else {
        return String::new();
    };
    let mut out = String::new();
    out.push('<');
    out.push_str(&element.tag_name);
    for attribute in ["id", "class", "data-testid"] {
        if let Some(value) = element.attr(attribute) {
            out.push(' ');
            out.push_str(attribute);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }
    out.push('>');
    let text = normalize_whitespace(&tree.text_content(node));
    if text.chars().count() > PREVIEW_TEXT_LENGTH {
        out.extend(text.chars().take(PREVIEW_TEXT_LENGTH - 1));
        out.push('…');
    } else {
        out.push_str(&text);
    }
    out.push_str("</");
    out.push_str(&element.tag_name);
    out.push('>');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_are_compact() {
        let tree = DomTree::from_html("<button id=\"save\" class=\"cta\">Save it</button>");
        let button = tree.element_by_id("save").expect("button");
        assert_eq!(
            markup_preview(&tree, button),
            "<button id=\"save\" class=\"cta\">Save it</button>"
        );
    }

    #[test]
    fn long_preview_text_is_truncated() {
        let text = "x".repeat(60);
        let tree = DomTree::from_html(&format!("<p>{text}</p>"));
        let paragraph = tree.descendant_elements(tree.root(), false)[0];
        let preview = markup_preview(&tree, paragraph);
        assert!(preview.ends_with("…</p>"));
        assert!(preview.chars().count() < 60);
    }
}
