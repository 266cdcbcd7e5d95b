//! Snapshot template matching and rendering.
//!
//! Templates are plain data (serde-deserializable) so embedders can ship
//! expected accessibility trees as fixtures. Matching runs in one of three
//! container modes: `Contain` treats the template children as an ordered
//! subsequence of the snapshot children (gaps allowed, matched greedily),
//! `Equal` requires the same children in the same order but compares their
//! own subtrees in contain mode, and `DeepEqual` requires exact shape all
//! the way down.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tarsier_common::text::normalize_whitespace;

use crate::error::SnapshotError;
use crate::roles::AriaRole;
use crate::tree::{AriaChild, AriaNode, AriaSnapshot};

/// Text matcher used for names, text runs and the `url` prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateText {
    /// Whitespace-normalized equality.
    Exact(String),
    /// Regex search over the normalized text; the pattern compiles at
    /// match time and a bad pattern is a [`SnapshotError::BadPattern`].
    Pattern(String),
}

impl TemplateText {
    fn matches(&self, text: &str) -> Result<bool, SnapshotError> {
        match self {
            Self::Exact(expected) => Ok(normalize_whitespace(expected) == text),
            Self::Pattern(pattern) => {
                let regex = Regex::new(pattern).map_err(|_| SnapshotError::BadPattern {
                    pattern: pattern.clone(),
                })?;
                Ok(regex.is_match(text))
            }
        }
    }
}

/// One template node: a role plus optional constraints. Absent fields
/// constrain nothing, except `children` in [`MatchMode::DeepEqual`], where
/// absence requires a leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AriaTemplateNode {
    /// Required role.
    pub role: AriaRole,
    /// Accessible-name constraint.
    #[serde(default)]
    pub name: Option<TemplateText>,
    /// Checked-state constraint.
    #[serde(default)]
    pub checked: Option<bool>,
    /// Disabled-state constraint.
    #[serde(default)]
    pub disabled: Option<bool>,
    /// Expanded-state constraint.
    #[serde(default)]
    pub expanded: Option<bool>,
    /// Level constraint.
    #[serde(default)]
    pub level: Option<u32>,
    /// Pressed-state constraint.
    #[serde(default)]
    pub pressed: Option<bool>,
    /// Selected-state constraint.
    #[serde(default)]
    pub selected: Option<bool>,
    /// `url` prop constraint (links).
    #[serde(default)]
    pub url: Option<TemplateText>,
    /// Child constraints.
    #[serde(default)]
    pub children: Option<Vec<TemplateChild>>,
}

/// A template child: a nested node template or a text-run matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChild {
    /// Nested node template.
    Node(AriaTemplateNode),
    /// Text-run matcher.
    Text(TemplateText),
}

/// Container matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Ordered subsequence with gaps (the default).
    #[default]
    Contain,
    /// Same children, same order; subtrees compared in contain mode.
    Equal,
    /// Exact shape recursively.
    DeepEqual,
}

/// Match a template against the snapshot's top-level children.
///
/// # Errors
/// [`SnapshotError::BadPattern`] when a template regex fails to compile.
pub fn matches_template(
    snapshot: &AriaSnapshot,
    template: &[TemplateChild],
    mode: MatchMode,
) -> Result<bool, SnapshotError> {
    match_children(&snapshot.children, template, mode)
}

fn match_children(
    children: &[AriaChild],
    template: &[TemplateChild],
    mode: MatchMode,
) -> Result<bool, SnapshotError> {
    match mode {
        MatchMode::Contain => {
            // Greedy ordered subsequence.
            let mut position = 0;
            'template: for expected in template {
                while position < children.len() {
                    let candidate = &children[position];
                    position += 1;
                    if match_child(candidate, expected, mode)? {
                        continue 'template;
                    }
                }
                return Ok(false);
            }
            Ok(true)
        }
        MatchMode::Equal | MatchMode::DeepEqual => {
            if children.len() != template.len() {
                return Ok(false);
            }
            let inner = if mode == MatchMode::DeepEqual {
                MatchMode::DeepEqual
            } else {
                MatchMode::Contain
            };
            for (candidate, expected) in children.iter().zip(template) {
                if !match_child(candidate, expected, inner)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn match_child(
    candidate: &AriaChild,
    expected: &TemplateChild,
    mode: MatchMode,
) -> Result<bool, SnapshotError> {
    match (candidate, expected) {
        (AriaChild::Text(text), TemplateChild::Text(matcher)) => matcher.matches(text),
        // A leaf node whose name is its content may be matched by a bare
        // text template.
        (AriaChild::Node(node), TemplateChild::Text(matcher)) => {
            Ok(node.children.is_empty() && !node.name.is_empty() && matcher.matches(&node.name)?)
        }
        (AriaChild::Node(node), TemplateChild::Node(template)) => match_node(node, template, mode),
        (AriaChild::Text(_), TemplateChild::Node(_)) => Ok(false),
    }
}

fn match_node(
    node: &AriaNode,
    template: &AriaTemplateNode,
    mode: MatchMode,
) -> Result<bool, SnapshotError> {
    if node.role != template.role {
        return Ok(false);
    }
    if let Some(name) = &template.name {
        if !name.matches(&node.name)? {
            return Ok(false);
        }
    }
    let flags = [
        (template.checked, node.checked),
        (template.disabled, node.disabled.or(Some(false))),
        (template.expanded, node.expanded),
        (template.pressed, node.pressed),
        (template.selected, node.selected),
    ];
    for (expected, actual) in flags {
        if let Some(expected) = expected {
            if actual != Some(expected) {
                return Ok(false);
            }
        }
    }
    if let Some(level) = template.level {
        if node.level != Some(level) {
            return Ok(false);
        }
    }
    if let Some(url) = &template.url {
        let actual = node.props.get("url").map(String::as_str).unwrap_or("");
        if !url.matches(actual)? {
            return Ok(false);
        }
    }
    match &template.children {
        Some(children) => match_children(&node.children, children, mode),
        None => {
            if mode == MatchMode::DeepEqual {
                Ok(node.children.is_empty())
            } else {
                Ok(true)
            }
        }
    }
}

/// Rendering mode for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Verbatim text.
    #[default]
    Plain,
    /// Volatile numbers (counts, sizes, durations) blur into regex
    /// fragments so rendered snapshots stay stable across reloads.
    Regex,
}

/// Render a snapshot as indented `- role "name" [flag]` lines.
#[must_use]
pub fn render(snapshot: &AriaSnapshot, mode: RenderMode) -> String {
    let mut out = String::new();
    render_children(&snapshot.children, mode, 0, &mut out);
    out
}

fn render_children(children: &[AriaChild], mode: RenderMode, depth: usize, out: &mut String) {
    for child in children {
        match child {
            AriaChild::Text(text) => {
                indent(depth, out);
                out.push_str("- text: ");
                out.push_str(&render_text(text, mode));
                out.push('\n');
            }
            AriaChild::Node(node) => render_node(node, mode, depth, out),
        }
    }
}

fn render_node(node: &AriaNode, mode: RenderMode, depth: usize, out: &mut String) {
    indent(depth, out);
    out.push_str("- ");
    out.push_str(&node.role.to_string());
    if !node.name.is_empty() {
        out.push(' ');
        match mode {
            RenderMode::Plain => out.push_str(&format!("\"{}\"", node.name)),
            RenderMode::Regex => {
                let blurred = blur_volatile(&node.name);
                if blurred == regex_escape(&node.name) {
                    out.push_str(&format!("\"{}\"", node.name));
                } else {
                    out.push_str(&format!("/{blurred}/"));
                }
            }
        }
    }
    for (flag, value) in [
        ("checked", node.checked),
        ("disabled", node.disabled),
        ("expanded", node.expanded),
        ("pressed", node.pressed),
        ("selected", node.selected),
    ] {
        if value == Some(true) {
            out.push_str(" [");
            out.push_str(flag);
            out.push(']');
        }
    }
    if let Some(level) = node.level {
        out.push_str(&format!(" [level={level}]"));
    }

    // Fold a single text child onto the node's own line.
    if node.props.is_empty() && node.children.len() == 1 {
        if let AriaChild::Text(text) = &node.children[0] {
            out.push_str(": ");
            out.push_str(&render_text(text, mode));
            out.push('\n');
            return;
        }
    }

    if node.props.is_empty() && node.children.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(":\n");
    for (key, value) in &node.props {
        indent(depth + 1, out);
        out.push_str(&format!("- /{key}: {value}\n"));
    }
    render_children(&node.children, mode, depth + 1, out);
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_text(text: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Plain => text.to_owned(),
        RenderMode::Regex => {
            let blurred = blur_volatile(text);
            if blurred == regex_escape(text) {
                text.to_owned()
            } else {
                format!("/{blurred}/")
            }
        }
    }
}

/// Escape regex metacharacters; volatile substrings become `\d+`-style
/// fragments in [`blur_volatile`].
fn regex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Digit runs (optionally with a decimal part and a size/duration unit)
/// become regex fragments; everything else is escaped literally.
fn blur_volatile(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == ',')
            {
                i += 1;
            }
            out.push_str("[\\d.,]+");
            // Swallow a unit suffix so "3.4MB" and "12ms" blur whole.
            let unit_start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() && i - unit_start < 3 {
                i += 1;
            }
            if i > unit_start {
                out.push_str("[a-zA-Z]+");
            }
        } else {
            let c = chars[i];
            if matches!(
                c,
                '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|'
                    | '/'
            ) {
                out.push('\\');
            }
            out.push(c);
            i += 1;
        }
    }
    out
}
