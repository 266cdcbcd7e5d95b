//! Composite-selector evaluation.
//!
//! A chain evaluates left to right over a candidate list. Query-capable
//! engines (`css`, `text`, `role`) expand: each current element is a scope
//! and its matching descendants become the next list, deduplicated in
//! document order. Matches-only engines (`nth`, `visible`, the nesting and
//! layout engines) filter the current list; when one opens a chain its
//! query side is derived by filtering every descendant of the root. A `*`
//! capture part keeps the chain's subject at that part: candidates survive
//! only if the remainder of the chain matches beneath them.
//!
//! Simple-selector match results are memoized per `(fragment, element,
//! scope)` in an explicit [`QueryCache`], reference-counted so nested
//! passes share entries and the outermost `end` clears them.

use std::collections::{HashMap, HashSet};

use tarsier_aria::AriaCache;
use tarsier_dom::{DomTree, NodeId, NodeKind};

use crate::ast::{
    Chain, ChainId, ComplexSelector, Combinator, EngineArg, EngineCall, PartBody, Selector,
    SelectorPart, SequenceEntry, SimpleSelector, TextPredicate,
};
use crate::engines;
use crate::error::QueryError;
use crate::registry::{self, Capability, EngineKind};

/// Explicit per-pass cache: simple-selector memo plus the accessibility
/// caches the role and text engines lean on. Never a singleton; whoever
/// drives the evaluator owns one and passes it down.
#[derive(Debug, Default)]
pub struct QueryCache {
    passes: usize,
    memo: HashMap<(u32, NodeId, NodeId), bool>,
    aria: AriaCache,
}

impl QueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a pass. Nested passes stack.
    pub fn begin(&mut self) {
        self.passes += 1;
        self.aria.begin();
    }

    /// Leave a pass; the outermost leave clears all entries.
    ///
    /// # Panics
    /// Panics on `end` without a matching `begin` - a caller defect.
    pub fn end(&mut self) {
        assert!(self.passes > 0, "QueryCache::end without begin");
        self.passes -= 1;
        self.aria.end();
        if self.passes == 0 {
            self.memo.clear();
        }
    }

    /// The accessibility cache sharing this pass.
    pub fn aria_mut(&mut self) -> &mut AriaCache {
        &mut self.aria
    }
}

/// All elements matching `selector` under `root`, in document order.
///
/// # Errors
/// [`QueryError::NotQueryable`] when `root` is not a document, element or
/// shadow-root node; [`QueryError::UnknownEngine`] when the selector names
/// an engine the registry does not carry.
pub fn query(
    tree: &DomTree,
    selector: &Selector,
    root: NodeId,
    cache: &mut QueryCache,
) -> Result<Vec<NodeId>, QueryError> {
    ensure_queryable(tree, root)?;
    cache.begin();
    let result = Evaluator {
        tree,
        selector,
        cache,
        root,
        pierce: true,
    }
    .run_chain(ChainId(0), root);
    cache.end();
    result
}

/// Whether `node` is one of the elements `selector` selects under `root`.
///
/// # Errors
/// Same conditions as [`query`].
pub fn matches(
    tree: &DomTree,
    selector: &Selector,
    node: NodeId,
    root: NodeId,
    cache: &mut QueryCache,
) -> Result<bool, QueryError> {
    Ok(query(tree, selector, root, cache)?.contains(&node))
}

fn ensure_queryable(tree: &DomTree, root: NodeId) -> Result<(), QueryError> {
    match tree.get(root).map(|n| &n.kind) {
        Some(NodeKind::Document | NodeKind::Element(_) | NodeKind::ShadowRoot) => Ok(()),
        _ => Err(QueryError::NotQueryable),
    }
}

struct Evaluator<'a> {
    tree: &'a DomTree,
    selector: &'a Selector,
    cache: &'a mut QueryCache,
    root: NodeId,
    pierce: bool,
}

impl Evaluator<'_> {
    fn run_chain(&mut self, id: ChainId, scope: NodeId) -> Result<Vec<NodeId>, QueryError> {
        let chain: &Chain = self.selector.chain(id);
        match chain.capture {
            Some(capture) if capture + 1 < chain.parts.len() => {
                let candidates = self.run_parts(&chain.parts[..=capture], vec![scope], false)?;
                let mut kept = Vec::new();
                for candidate in candidates {
                    let rest =
                        self.run_parts(&chain.parts[capture + 1..], vec![candidate], true)?;
                    if !rest.is_empty() {
                        kept.push(candidate);
                    }
                }
                Ok(kept)
            }
            _ => self.run_parts(&chain.parts, vec![scope], false),
        }
    }

    /// Evaluate a run of parts over `list`. `expanded` distinguishes a seed
    /// list of scopes from an already-expanded candidate list.
    fn run_parts(
        &mut self,
        parts: &[SelectorPart],
        mut list: Vec<NodeId>,
        mut expanded: bool,
    ) -> Result<Vec<NodeId>, QueryError> {
        for part in parts {
            let (kind, capability) = registry::lookup(&part.engine)?;
            match capability {
                Capability::Both | Capability::QueryOnly => {
                    let scopes = std::mem::take(&mut list);
                    let mut seen = HashSet::new();
                    for scope in scopes {
                        for found in self.part_query(kind, part, scope)? {
                            if seen.insert(found) {
                                list.push(found);
                            }
                        }
                    }
                    expanded = true;
                }
                Capability::MatchesOnly => {
                    if !expanded {
                        // Derived query: filter every descendant of the
                        // seed scopes.
                        let mut out = Vec::new();
                        let mut seen = HashSet::new();
                        for &scope in &list {
                            for found in self.tree.descendant_elements(scope, self.pierce) {
                                if seen.insert(found) {
                                    out.push(found);
                                }
                            }
                        }
                        list = out;
                        expanded = true;
                    }
                    list = self.part_filter(kind, part, list)?;
                }
            }
            if list.is_empty() {
                return Ok(list);
            }
        }
        Ok(list)
    }

    fn part_query(
        &mut self,
        kind: EngineKind,
        part: &SelectorPart,
        scope: NodeId,
    ) -> Result<Vec<NodeId>, QueryError> {
        match (kind, &part.body) {
            (EngineKind::Css, PartBody::Css(list)) => self.query_complex_list(list, scope),
            (EngineKind::Text, PartBody::Text(predicate)) => Ok(self
                .tree
                .descendant_elements(scope, self.pierce)
                .into_iter()
                .filter(|&el| engines::text_matches_innermost(self.tree, el, predicate))
                .collect()),
            (EngineKind::Role, PartBody::Role(query)) => {
                let mut out = Vec::new();
                for el in self.tree.descendant_elements(scope, self.pierce) {
                    if engines::role_query_matches(self.tree, &mut self.cache.aria, el, query) {
                        out.push(el);
                    }
                }
                Ok(out)
            }
            _ => unreachable!("parser pairs every engine with its body shape"),
        }
    }

    fn part_filter(
        &mut self,
        kind: EngineKind,
        part: &SelectorPart,
        list: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, QueryError> {
        match (kind, &part.body) {
            (EngineKind::Nth, &PartBody::Index(index)) => {
                let length = i64::try_from(list.len()).unwrap_or(i64::MAX);
                let resolved = if index < 0 { length + index } else { index };
                if (0..length).contains(&resolved) {
                    Ok(vec![list[usize::try_from(resolved).unwrap_or(0)]])
                } else {
                    Ok(Vec::new())
                }
            }
            (EngineKind::Visible, &PartBody::Visible(wanted)) => Ok(list
                .into_iter()
                .filter(|&el| engines::is_visible(self.tree, el) == wanted)
                .collect()),
            (EngineKind::Has, &PartBody::Nested { inner, .. }) => {
                let mut kept = Vec::new();
                for el in list {
                    if !self.run_chain(inner, el)?.is_empty() {
                        kept.push(el);
                    }
                }
                Ok(kept)
            }
            (EngineKind::And, &PartBody::Nested { inner, .. }) => {
                let matched: HashSet<NodeId> =
                    self.run_chain(inner, self.root)?.into_iter().collect();
                Ok(list.into_iter().filter(|el| matched.contains(el)).collect())
            }
            (EngineKind::Not, &PartBody::Nested { inner, .. }) => {
                let matched: HashSet<NodeId> =
                    self.run_chain(inner, self.root)?.into_iter().collect();
                Ok(list
                    .into_iter()
                    .filter(|el| !matched.contains(el))
                    .collect())
            }
            (EngineKind::Or, &PartBody::Nested { inner, .. }) => {
                let extra = self.run_chain(inner, self.root)?;
                let mut seen: HashSet<NodeId> = list.iter().copied().collect();
                let mut union = list;
                for el in extra {
                    if seen.insert(el) {
                        union.push(el);
                    }
                }
                Ok(self.sort_document_order(union))
            }
            (EngineKind::Layout(relation), &PartBody::Nested { inner, distance }) => {
                let targets = self.run_chain(inner, self.root)?;
                let mut scored: Vec<(NodeId, f64)> = list
                    .into_iter()
                    .filter_map(|el| {
                        engines::layout_score(self.tree, relation, el, &targets, distance)
                            .map(|score| (el, score))
                    })
                    .collect();
                scored.sort_by(|a, b| a.1.total_cmp(&b.1));
                Ok(scored.into_iter().map(|(el, _)| el).collect())
            }
            _ => unreachable!("parser pairs every engine with its body shape"),
        }
    }

    fn sort_document_order(&self, mut list: Vec<NodeId>) -> Vec<NodeId> {
        let order: HashMap<NodeId, usize> = self
            .tree
            .descendant_elements(NodeId::ROOT, true)
            .into_iter()
            .enumerate()
            .map(|(index, el)| (el, index))
            .collect();
        list.sort_by_key(|el| order.get(el).copied().unwrap_or(usize::MAX));
        list
    }

    fn query_complex_list(
        &mut self,
        list: &[ComplexSelector],
        scope: NodeId,
    ) -> Result<Vec<NodeId>, QueryError> {
        let mut out = Vec::new();
        // Descendant enumeration excludes the scope itself; `:scope` is
        // the one way a subject can sit on the query root, so widen the
        // candidate set to include it.
        if contains_scope_call(list)
            && self.tree.as_element(scope).is_some()
            && self.matches_complex_list(list, scope, scope)?
        {
            out.push(scope);
        }
        for el in self.tree.descendant_elements(scope, self.pierce) {
            if self.matches_complex_list(list, el, scope)? {
                out.push(el);
            }
        }
        Ok(out)
    }

    fn matches_complex_list(
        &mut self,
        list: &[ComplexSelector],
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        for complex in list {
            if self.matches_complex(complex, el, scope)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Right-to-left complex-selector matching: the subject is checked
    /// first, then each combinator constrains where the next simple
    /// selector to the left may sit.
    fn matches_complex(
        &mut self,
        complex: &ComplexSelector,
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        self.match_tail(&complex.sequence, complex.sequence.len() - 1, el, scope)
    }

    fn match_tail(
        &mut self,
        sequence: &[SequenceEntry],
        index: usize,
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        let entry = &sequence[index];
        if !self.simple_matches(&entry.simple, el, scope)? {
            return Ok(false);
        }
        if index == 0 {
            // Leftmost entry anchors at the scope.
            return Ok(self.in_scope(el, scope));
        }
        match entry.combinator {
            Combinator::Descendant => {
                for ancestor in self.tree.ancestors(el) {
                    if self.match_tail(sequence, index - 1, ancestor, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Combinator::ScopeDescendant => {
                // Like descendant, but the search includes the element
                // itself.
                if self.match_tail(sequence, index - 1, el, scope)? {
                    return Ok(true);
                }
                for ancestor in self.tree.ancestors(el) {
                    if self.match_tail(sequence, index - 1, ancestor, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Combinator::Child => match self.tree.parent_or_shadow_host(el) {
                Some(parent) => self.match_tail(sequence, index - 1, parent, scope),
                None => Ok(false),
            },
            Combinator::NextSibling => {
                let previous = self
                    .tree
                    .preceding_siblings(el)
                    .find(|&sibling| self.tree.as_element(sibling).is_some());
                match previous {
                    Some(previous) => self.match_tail(sequence, index - 1, previous, scope),
                    None => Ok(false),
                }
            }
            Combinator::SubsequentSibling => {
                let siblings: Vec<NodeId> = self
                    .tree
                    .preceding_siblings(el)
                    .filter(|&sibling| self.tree.as_element(sibling).is_some())
                    .collect();
                for sibling in siblings {
                    if self.match_tail(sequence, index - 1, sibling, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Descendant-or-self of `scope`; with piercing disabled, the walk
    /// stops at shadow boundaries so shadow content is out of scope.
    fn in_scope(&self, el: NodeId, scope: NodeId) -> bool {
        if el == scope {
            return true;
        }
        if self.pierce {
            return self.tree.is_descendant_of(el, scope);
        }
        let mut current = self.tree.parent(el);
        while let Some(id) = current {
            if id == scope {
                return true;
            }
            if matches!(self.tree.get(id).map(|n| &n.kind), Some(NodeKind::ShadowRoot)) {
                return false;
            }
            current = self.tree.parent(id);
        }
        false
    }

    fn simple_matches(
        &mut self,
        simple: &SimpleSelector,
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        assert!(
            simple.css.is_some() || !simple.calls.is_empty(),
            "simple selector without fragment or engine calls"
        );
        let key = (simple.fragment_id, el, scope);
        if let Some(&cached) = self.cache.memo.get(&key) {
            return Ok(cached);
        }
        let result = self.compute_simple(simple, el, scope)?;
        let _ = self.cache.memo.insert(key, result);
        Ok(result)
    }

    fn compute_simple(
        &mut self,
        simple: &SimpleSelector,
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        if let Some(css) = &simple.css {
            if !css.matches(self.tree, el) {
                return Ok(false);
            }
        }
        for call in &simple.calls {
            if !self.call_matches(call, el, scope)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn call_matches(
        &mut self,
        call: &EngineCall,
        el: NodeId,
        scope: NodeId,
    ) -> Result<bool, QueryError> {
        match call.name.as_str() {
            "has" => {
                let list = selectors_arg(&call.args, 0);
                Ok(!self.query_complex_list(list, el)?.is_empty())
            }
            "is" | "where" => {
                let list = selectors_arg(&call.args, 0);
                self.matches_complex_list(list, el, scope)
            }
            "not" => {
                let list = selectors_arg(&call.args, 0);
                Ok(!self.matches_complex_list(list, el, scope)?)
            }
            "light" => {
                let list = selectors_arg(&call.args, 0);
                let saved = self.pierce;
                self.pierce = false;
                let result = self.matches_complex_list(list, el, scope);
                self.pierce = saved;
                result
            }
            "text" => Ok(engines::text_matches_innermost(
                self.tree,
                el,
                &TextPredicate::Substring(text_arg(&call.args, 0).to_owned()),
            )),
            "text-is" => Ok(engines::text_matches_innermost(
                self.tree,
                el,
                &TextPredicate::Exact(text_arg(&call.args, 0).to_owned()),
            )),
            "text-matches" => {
                let EngineArg::Pattern(regex) = &call.args[0] else {
                    unreachable!("text-matches compiles its pattern at parse time")
                };
                Ok(engines::text_matches_innermost(
                    self.tree,
                    el,
                    &TextPredicate::Pattern(regex.clone()),
                ))
            }
            "has-text" => Ok(engines::text_matches_subtree(
                self.tree,
                el,
                &TextPredicate::Substring(text_arg(&call.args, 0).to_owned()),
            )),
            "visible" => Ok(engines::is_visible(self.tree, el)),
            "scope" => Ok(el == scope),
            "role" => {
                let EngineArg::Role(query) = &call.args[0] else {
                    unreachable!("role compiles its query at parse time")
                };
                Ok(engines::role_query_matches(
                    self.tree,
                    &mut self.cache.aria,
                    el,
                    query,
                ))
            }
            "nth-match" => {
                let list = selectors_arg(&call.args, 0);
                let index = number_arg(&call.args, 1);
                let all = self.query_complex_list(list, self.root)?;
                // nth-match is 1-based.
                if index < 1.0 {
                    return Ok(false);
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let position = index as usize - 1;
                Ok(all.get(position) == Some(&el))
            }
            "left-of" | "right-of" | "above" | "below" | "near" => {
                let Ok((EngineKind::Layout(relation), _)) = registry::lookup(&call.name) else {
                    unreachable!("layout call names are registered layout engines")
                };
                let list = selectors_arg(&call.args, 0);
                let distance = call.args.get(1).map(|arg| match arg {
                    EngineArg::Number(n) => *n,
                    _ => unreachable!("layout distance is numeric"),
                });
                let targets = self.query_complex_list(list, self.root)?;
                Ok(engines::layout_score(self.tree, relation, el, &targets, distance).is_some())
            }
            other => unreachable!("unrecognized engine call {other:?} survived parsing"),
        }
    }
}

/// True when any simple selector in the list carries a `scope` call,
/// including calls nested inside other engine calls.
fn contains_scope_call(list: &[ComplexSelector]) -> bool {
    list.iter().any(|complex| {
        complex
            .sequence
            .iter()
            .any(|entry| calls_scope(&entry.simple.calls))
    })
}

fn calls_scope(calls: &[EngineCall]) -> bool {
    calls.iter().any(|call| {
        call.name == "scope"
            || call.args.iter().any(|arg| match arg {
                EngineArg::Selectors(inner) => contains_scope_call(inner),
                _ => false,
            })
    })
}

fn selectors_arg(args: &[EngineArg], index: usize) -> &[ComplexSelector] {
    match &args[index] {
        EngineArg::Selectors(list) => list,
        _ => unreachable!("argument shapes are fixed at parse time"),
    }
}

fn text_arg(args: &[EngineArg], index: usize) -> &str {
    match &args[index] {
        EngineArg::Text(text) => text,
        _ => unreachable!("argument shapes are fixed at parse time"),
    }
}

fn number_arg(args: &[EngineArg], index: usize) -> f64 {
    match &args[index] {
        EngineArg::Number(value) => *value,
        _ => unreachable!("argument shapes are fixed at parse time"),
    }
}
