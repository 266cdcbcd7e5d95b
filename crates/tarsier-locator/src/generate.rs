//! Best-selector generation.
//!
//! For a target element the generator ranks candidate selectors by signal
//! family - test ids cheapest, positional qualifiers most expensive - and
//! accepts a candidate only after the evaluator confirms it resolves to
//! exactly the target. When no candidate at the target is unique, the
//! search walks the ancestor chain combining ancestor prefixes with target
//! candidates under branch-and-bound pruning, and as a last resort builds
//! a structural CSS path.

use std::collections::HashSet;

use tarsier_common::text::{looks_machine_generated, normalize_whitespace, word_prefixes};
use tarsier_dom::{DomTree, NodeId};
use tarsier_selectors::{parse_selector, query, QueryCache};

// Base scores per signal family. The relative order is the contract;
// the absolute magnitudes are tuning.
const SCORE_TEST_ID: u32 = 1;
const SCORE_OTHER_TEST_ID: u32 = 2;
const SCORE_PLACEHOLDER: u32 = 100;
const SCORE_LABEL: u32 = 120;
const SCORE_ROLE_WITH_NAME: u32 = 140;
const SCORE_ALT_TEXT: u32 = 160;
const SCORE_TEXT: u32 = 180;
const SCORE_TITLE: u32 = 200;
const SCORE_BARE_ROLE: u32 = 500;
const SCORE_CSS_ID: u32 = 510;
const SCORE_CSS_CLASS: u32 = 520;
const SCORE_CSS_TAG: u32 = 530;
const SCORE_NTH: u32 = 10_000;
const SCORE_STRUCTURAL: u32 = 1_000_000;

/// Extra cost for trimmed word-prefix text variants.
const TRIMMED_PENALTY: u32 = 25;
/// Literal text longer than this never becomes a candidate.
const MAX_TEXT_LENGTH: usize = 80;
/// Longest word-prefix variant tried for text signals.
const MAX_PREFIX_WORDS: usize = 4;

/// Options steering the generation search.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Query scope; defaults to the document root.
    pub root: Option<NodeId>,
    /// Attribute treated as the project's test id, `data-testid` by
    /// default. Other well-known test id attributes still participate at a
    /// slightly higher cost.
    pub test_id_attribute: String,
    /// Restrict candidates to plain CSS and `nth=` parts, suppressing the
    /// `role=`/`text=` engines.
    pub omit_internal_engines: bool,
    /// Repeat the search with and without CSS ids and with and without
    /// text signals, returning every distinct winner.
    pub multiple: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            root: None,
            test_id_attribute: "data-testid".to_owned(),
            omit_internal_engines: false,
            multiple: false,
        }
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedSelector {
    /// The cheapest selector found.
    pub selector: String,
    /// All distinct selectors found, cheapest first. Length 1 unless
    /// [`GeneratorOptions::multiple`] was set.
    pub selectors: Vec<String>,
    /// Elements the chosen selector resolves to.
    pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Candidate {
    selector: String,
    score: u32,
}

/// Generate the cheapest uniquely-resolving selector for `target`.
///
/// # Panics
/// Panics when `target` is not an element; asking for a selector to a
/// text or comment node is a defect in the caller.
pub fn generate_selector(
    tree: &DomTree,
    cache: &mut QueryCache,
    target: NodeId,
    options: &GeneratorOptions,
) -> GeneratedSelector {
    assert!(
        tree.as_element(target).is_some(),
        "selector generation target must be an element"
    );
    let root = options.root.unwrap_or_else(|| tree.root());
    cache.begin();

    let runs: &[(bool, bool)] = if options.multiple {
        &[(true, true), (true, false), (false, true), (false, false)]
    } else {
        &[(true, true)]
    };
    let mut found: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for &(allow_text, allow_css_id) in runs {
        if let Some(candidate) = search(tree, cache, target, root, options, allow_text, allow_css_id)
            && seen.insert(candidate.selector.clone())
        {
            found.push(candidate);
        }
    }
    if found.is_empty() {
        found.push(structural_fallback(tree, cache, target, root));
    }
    found.sort_by_key(|candidate| candidate.score);

    let best = found[0].selector.clone();
    let elements = query_all(tree, cache, &best, root);
    cache.end();
    GeneratedSelector {
        selector: best,
        selectors: found.into_iter().map(|candidate| candidate.selector).collect(),
        elements,
    }
}

/// One search run: best unique candidate at the target, then
/// ancestor-combined chains, pruned on partial score.
fn search(
    tree: &DomTree,
    cache: &mut QueryCache,
    target: NodeId,
    root: NodeId,
    options: &GeneratorOptions,
    allow_text: bool,
    allow_css_id: bool,
) -> Option<Candidate> {
    let target_candidates = candidates_for(tree, cache, target, options, allow_text, allow_css_id);
    let cheapest_target = target_candidates.first().map_or(u32::MAX, |c| c.score);

    let mut best: Option<Candidate> = None;
    for candidate in &target_candidates {
        if best.as_ref().is_some_and(|b| b.score <= candidate.score) {
            break;
        }
        if resolves_to(tree, cache, &candidate.selector, root, target) {
            best = Some(candidate.clone());
        }
    }

    let mut ancestor = tree.parent_or_shadow_host(target);
    while let Some(level) = ancestor {
        if level == root || tree.as_element(level).is_none() {
            break;
        }
        let level_candidates = candidates_for(tree, cache, level, options, allow_text, allow_css_id);
        for prefix in &level_candidates {
            // Candidate lists ascend by score, so once the cheapest
            // possible pair is no improvement, nothing later is either.
            let floor = prefix.score.saturating_add(cheapest_target);
            if best.as_ref().is_some_and(|b| b.score <= floor) {
                break;
            }
            for candidate in &target_candidates {
                let score = prefix.score.saturating_add(candidate.score);
                if best.as_ref().is_some_and(|b| b.score <= score) {
                    break;
                }
                let combined = format!("{} >> {}", prefix.selector, candidate.selector);
                if resolves_to(tree, cache, &combined, root, target) {
                    best = Some(Candidate {
                        selector: combined,
                        score,
                    });
                }
            }
        }
        ancestor = tree.parent_or_shadow_host(level);
    }
    best
}

/// Ranked signal candidates for one element, cheapest first.
fn candidates_for(
    tree: &DomTree,
    cache: &mut QueryCache,
    node: NodeId,
    options: &GeneratorOptions,
    allow_text: bool,
    allow_css_id: bool,
) -> Vec<Candidate> {
    let Some(element) = tree.as_element(node) else {
        return Vec::new();
    };
    let mut out = Vec::new();

    if let Some(value) = element.attr(&options.test_id_attribute) {
        out.push(Candidate {
            selector: attribute_selector(&options.test_id_attribute, value),
            score: SCORE_TEST_ID,
        });
    }
    for attribute in ["data-testid", "data-test-id", "data-test"] {
        if attribute != options.test_id_attribute
            && let Some(value) = element.attr(attribute)
        {
            out.push(Candidate {
                selector: attribute_selector(attribute, value),
                score: SCORE_OTHER_TEST_ID,
            });
        }
    }
    for (attribute, base) in [
        ("placeholder", SCORE_PLACEHOLDER),
        ("alt", SCORE_ALT_TEXT),
        ("title", SCORE_TITLE),
    ] {
        if let Some(value) = element.attr(attribute) {
            out.push(Candidate {
                selector: attribute_selector(attribute, value),
                score: base.saturating_add(length_penalty(value)),
            });
        }
    }

    if !options.omit_internal_engines {
        if let Some(role) = cache.aria_mut().role(tree, node) {
            if allow_text {
                let name = cache.aria_mut().accessible_name(tree, node);
                if !name.is_empty() && name.chars().count() <= MAX_TEXT_LENGTH {
                    // A name contributed by an associated <label> is the
                    // steadier signal and scores below a generic
                    // role-with-name.
                    let base = if has_associated_label(tree, node) {
                        SCORE_LABEL
                    } else {
                        SCORE_ROLE_WITH_NAME
                    };
                    out.push(Candidate {
                        selector: format!("role={role}[name={}][exact]", quoted(&name)),
                        score: base.saturating_add(length_penalty(&name)),
                    });
                    for prefix in word_prefixes(&name, MAX_PREFIX_WORDS) {
                        if prefix == name {
                            continue;
                        }
                        out.push(Candidate {
                            selector: format!("role={role}[name={}]", quoted(&prefix)),
                            score: base
                                .saturating_add(TRIMMED_PENALTY)
                                .saturating_add(length_penalty(&prefix)),
                        });
                    }
                }
            }
            out.push(Candidate {
                selector: format!("role={role}"),
                score: SCORE_BARE_ROLE,
            });
        }
        if allow_text {
            let text = normalize_whitespace(&tree.text_content(node));
            if !text.is_empty() && text.chars().count() <= MAX_TEXT_LENGTH {
                out.push(Candidate {
                    selector: format!("text={}", quoted(&text)),
                    score: SCORE_TEXT.saturating_add(length_penalty(&text)),
                });
                for prefix in word_prefixes(&text, MAX_PREFIX_WORDS) {
                    // Unquoted bodies are substring matches; skip prefixes
                    // the chain grammar could misread.
                    if prefix == text || !bare_safe(&prefix) {
                        continue;
                    }
                    out.push(Candidate {
                        selector: format!("text={prefix}"),
                        score: SCORE_TEXT
                            .saturating_add(TRIMMED_PENALTY)
                            .saturating_add(length_penalty(&prefix)),
                    });
                }
            }
        }
    }

    if allow_css_id
        && let Some(id) = element.id()
        && css_identifier(id)
        && !looks_machine_generated(id)
    {
        out.push(Candidate {
            selector: format!("#{id}"),
            score: SCORE_CSS_ID,
        });
    }
    if let Some(class) = element
        .attr("class")
        .and_then(|c| c.split_ascii_whitespace().find(|cl| css_identifier(cl)))
    {
        out.push(Candidate {
            selector: format!("{}.{class}", element.tag_name),
            score: SCORE_CSS_CLASS,
        });
    }
    out.push(Candidate {
        selector: element.tag_name.clone(),
        score: SCORE_CSS_TAG,
    });

    out.sort_by_key(|candidate| candidate.score);
    out
}

/// Structural CSS path: unique human id if one anchors the chain, else
/// tag/class fragments per level, `nth-child` where siblings collide, and
/// a final `nth=` qualifier when the whole path is still ambiguous.
fn structural_fallback(
    tree: &DomTree,
    cache: &mut QueryCache,
    target: NodeId,
    root: NodeId,
) -> Candidate {
    let mut segments = Vec::new();
    let mut current = target;
    loop {
        let Some(element) = tree.as_element(current) else {
            break;
        };
        if let Some(id) = element.id()
            && css_identifier(id)
            && !looks_machine_generated(id)
            && unique_id(tree, id)
        {
            segments.push(format!("#{id}"));
            break;
        }
        segments.push(sibling_fragment(tree, current));
        match tree.parent_or_shadow_host(current) {
            Some(parent) if parent != root && tree.as_element(parent).is_some() => {
                current = parent;
            }
            _ => break,
        }
    }
    segments.reverse();

    let mut selector = segments.join(" > ");
    let mut score = SCORE_STRUCTURAL;
    let matched = query_all(tree, cache, &selector, root);
    if matched.len() > 1
        && let Some(position) = matched.iter().position(|&node| node == target)
    {
        selector = format!("{selector} >> nth={position}");
        score = score.saturating_add(SCORE_NTH);
    }
    Candidate { selector, score }
}

/// Most specific fragment distinguishing `node` among its element
/// siblings: tag, tag plus one class, tag plus two, then `nth-child`.
fn sibling_fragment(tree: &DomTree, node: NodeId) -> String {
    let Some(element) = tree.as_element(node) else {
        return String::new();
    };
    let tag = element.tag_name.clone();
    let siblings: Vec<NodeId> = tree.parent(node).map_or_else(
        || vec![node],
        |parent| {
            tree.children(parent)
                .iter()
                .copied()
                .filter(|&child| tree.as_element(child).is_some())
                .collect()
        },
    );
    if sibling_match_count(tree, &siblings, &tag, &[]) <= 1 {
        return tag;
    }

    let classes: Vec<&str> = element
        .attr("class")
        .map(|value| {
            value
                .split_ascii_whitespace()
                .filter(|class| css_identifier(class))
                .collect()
        })
        .unwrap_or_default();
    for class in &classes {
        if sibling_match_count(tree, &siblings, &tag, &[class]) == 1 {
            return format!("{tag}.{class}");
        }
    }
    for (index, first) in classes.iter().enumerate() {
        for second in &classes[index + 1..] {
            if sibling_match_count(tree, &siblings, &tag, &[first, second]) == 1 {
                return format!("{tag}.{first}.{second}");
            }
        }
    }
    format!("{tag}:nth-child({})", tree.element_index(node) + 1)
}

fn sibling_match_count(tree: &DomTree, siblings: &[NodeId], tag: &str, classes: &[&str]) -> usize {
    siblings
        .iter()
        .filter(|&&sibling| {
            tree.as_element(sibling).is_some_and(|element| {
                element.tag_name == tag
                    && classes
                        .iter()
                        .all(|class| element.classes().contains(class))
            })
        })
        .count()
}

fn unique_id(tree: &DomTree, id: &str) -> bool {
    tree.descendant_elements(tree.root(), true)
        .into_iter()
        .filter(|&node| {
            tree.as_element(node)
                .is_some_and(|element| element.attr("id") == Some(id))
        })
        .count()
        == 1
}

/// Whether the element's accessible name would come from an associated
/// `<label>`: an ancestor label or a `label[for]` referencing its id.
fn has_associated_label(tree: &DomTree, node: NodeId) -> bool {
    if tree
        .ancestors(node)
        .any(|ancestor| tree.as_element(ancestor).is_some_and(|e| e.tag_name == "label"))
    {
        return true;
    }
    let Some(id) = tree.as_element(node).and_then(|element| element.attr("id")) else {
        return false;
    };
    tree.descendant_elements(tree.root(), true)
        .into_iter()
        .any(|candidate| {
            tree.as_element(candidate)
                .is_some_and(|e| e.tag_name == "label" && e.attr("for") == Some(id))
        })
}

fn resolves_to(
    tree: &DomTree,
    cache: &mut QueryCache,
    selector: &str,
    root: NodeId,
    target: NodeId,
) -> bool {
    let matched = query_all(tree, cache, selector, root);
    matched.len() == 1 && matched[0] == target
}

fn query_all(tree: &DomTree, cache: &mut QueryCache, selector: &str, root: NodeId) -> Vec<NodeId> {
    let Ok(parsed) = parse_selector(selector) else {
        return Vec::new();
    };
    query(tree, &parsed, root, cache).unwrap_or_default()
}

fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{name}={}]", quoted(value))
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Prefer shorter literal text: one point per ten characters.
fn length_penalty(text: &str) -> u32 {
    u32::try_from(text.chars().count()).unwrap_or(u32::MAX) / 10
}

fn css_identifier(text: &str) -> bool {
    !text.is_empty()
        && text.chars().next().is_none_or(|c| !c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Safe as an unquoted `text=` body: nothing the chain splitter or the
/// text-body grammar would reinterpret.
fn bare_safe(text: &str) -> bool {
    !text.contains(['"', '\'', '`', '>', '[', ']']) && !text.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_rank_test_id_first() {
        let tree = DomTree::from_html(
            "<input data-testid=\"email\" placeholder=\"Email\" id=\"mail\">",
        );
        let input = tree.element_by_id("mail").expect("input");
        let mut cache = QueryCache::new();
        let candidates = candidates_for(
            &tree,
            &mut cache,
            input,
            &GeneratorOptions::default(),
            true,
            true,
        );
        assert_eq!(candidates[0].selector, "[data-testid=\"email\"]");
        assert_eq!(candidates[0].score, SCORE_TEST_ID);
        assert!(candidates.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn fragments_escalate_to_nth_child() {
        let tree = DomTree::from_html("<ul><li>a</li><li>b</li></ul>");
        let items = tree.descendant_elements(tree.root(), false);
        let second = *items.last().expect("li");
        assert_eq!(sibling_fragment(&tree, second), "li:nth-child(2)");
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quoted("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
