//! Parsed selector data model.
//!
//! A user-facing selector is a chain of parts separated by `>>`, each part
//! handled by a named engine (`css=...`, `text=...`, `role=...`). Nesting
//! engines (`has=`, `near=`, logical `and=`/`or=`/`not=`) carry a whole
//! inner selector of their own; those inner selectors live in an arena on
//! the root [`Selector`] and are referenced by [`ChainId`], which keeps the
//! mutually recursive part/selector types simple and cycle-free.
//!
//! Selector ASTs are immutable once parsed and can be reused across many
//! evaluations.

use core::fmt;

use regex::Regex;

/// Handle into the chain arena of a [`Selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainId(pub(crate) usize);

/// A fully parsed composite selector: the chain arena plus its source text.
///
/// The root chain is always at index 0; nesting-engine parts reference
/// strictly-inner chains by [`ChainId`].
#[derive(Debug, Clone)]
pub struct Selector {
    /// The original selector text, kept verbatim for error messages.
    pub source: String,
    pub(crate) chains: Vec<Chain>,
}

impl Selector {
    /// The root chain of the selector.
    #[must_use]
    pub fn root(&self) -> &Chain {
        &self.chains[0]
    }

    /// Resolve a chain handle produced by a nesting-engine part.
    #[must_use]
    pub fn chain(&self, id: ChainId) -> &Chain {
        &self.chains[id.0]
    }
}

/// One `>>`-separated chain of selector parts.
#[derive(Debug, Clone)]
pub struct Chain {
    /// The parts in evaluation order.
    pub parts: Vec<SelectorPart>,
    /// Index of the part marked `*` as the captured result, if any. At most
    /// one part may carry the marker.
    pub capture: Option<usize>,
}

/// One part of a selector chain: an engine name, the raw body text (kept
/// for lossless re-serialization), and the engine-specific parsed body.
#[derive(Debug, Clone)]
pub struct SelectorPart {
    /// Engine name, e.g. `css`, `text`, `role`, `has`.
    pub engine: String,
    /// The body text exactly as written after `engine=`.
    pub raw_body: String,
    /// Parsed body, shaped per engine.
    pub body: PartBody,
}

/// Engine-specific parsed form of a part body.
#[derive(Debug, Clone)]
pub enum PartBody {
    /// `css=` part: list of complex-selector alternatives (comma-separated).
    Css(Vec<ComplexSelector>),
    /// `text=` part in one of its three forms.
    Text(TextPredicate),
    /// `role=` part: role plus attribute filters.
    Role(RoleQuery),
    /// `nth=` part: index into the current result list; negative counts
    /// from the end.
    Index(i64),
    /// `visible=` part.
    Visible(bool),
    /// Nesting-engine part (`has`, `and`, `or`, `not`, layout engines):
    /// inner selector by arena handle plus the optional distance bound the
    /// layout engines accept.
    Nested {
        /// Handle of the inner chain.
        inner: ChainId,
        /// Maximum distance in CSS pixels for layout engines.
        distance: Option<f64>,
    },
    /// A body the splitter recognizes syntactically but no registered
    /// engine evaluates (e.g. `xpath=`). Surfaces as an unknown-engine
    /// error at query time, not at parse time.
    Opaque(String),
}

/// Text matching modes shared by the `text=` part engine and the
/// `:text()` family of engine calls.
#[derive(Debug, Clone)]
pub enum TextPredicate {
    /// Case-insensitive substring match on normalized text (`text=foo`).
    Substring(String),
    /// Exact match on normalized text (`text="foo"`).
    Exact(String),
    /// Regex match (`text=/foo/i`).
    Pattern(Regex),
}

/// Parsed body of a `role=` part: `role=button[name="Save"][pressed]`.
#[derive(Debug, Clone, Default)]
pub struct RoleQuery {
    /// Required ARIA role.
    pub role: String,
    /// Accessible-name filter, if any.
    pub name: Option<TextPredicate>,
    /// `[checked]` / `[checked=false]` filter.
    pub checked: Option<bool>,
    /// `[selected]` filter.
    pub selected: Option<bool>,
    /// `[pressed]` filter.
    pub pressed: Option<bool>,
    /// `[expanded]` filter.
    pub expanded: Option<bool>,
    /// `[disabled]` filter.
    pub disabled: Option<bool>,
    /// `[level=N]` filter for headings and tree items.
    pub level: Option<u32>,
    /// `[include-hidden]`: also match elements hidden from the
    /// accessibility tree.
    pub include_hidden: bool,
}

impl fmt::Display for RoleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.role)?;
        match &self.name {
            Some(TextPredicate::Substring(name)) => write!(f, "[name=\"{name}\"]")?,
            Some(TextPredicate::Exact(name)) => write!(f, "[name=\"{name}\"][exact]")?,
            Some(TextPredicate::Pattern(re)) => write!(f, "[name=/{}/]", re.as_str())?,
            None => {}
        }
        for (key, value) in [
            ("checked", self.checked),
            ("selected", self.selected),
            ("pressed", self.pressed),
            ("expanded", self.expanded),
            ("disabled", self.disabled),
        ] {
            if let Some(value) = value {
                write!(f, "[{key}={value}]")?;
            }
        }
        if let Some(level) = self.level {
            write!(f, "[level={level}]")?;
        }
        if self.include_hidden {
            write!(f, "[include-hidden]")?;
        }
        Ok(())
    }
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// "A combinator is punctuation that represents a particular kind of
/// relationship between the selectors on either side." The non-standard
/// `>=` anchors a scope-relative search at the element itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: arbitrary-depth descendant.
    Descendant,
    /// `>`: direct child (crossing a shadow host boundary).
    Child,
    /// `+`: immediately preceding sibling.
    NextSibling,
    /// `~`: any preceding sibling.
    SubsequentSibling,
    /// `>=`: like descendant, but the ancestor search starts at the
    /// element itself instead of its parent.
    ScopeDescendant,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descendant => write!(f, " "),
            Self::Child => write!(f, " > "),
            Self::NextSibling => write!(f, " + "),
            Self::SubsequentSibling => write!(f, " ~ "),
            Self::ScopeDescendant => write!(f, " >= "),
        }
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors
/// separated by combinators." The first entry's combinator is
/// [`Combinator::Descendant`] by convention and anchors at the query scope.
#[derive(Debug, Clone)]
pub struct ComplexSelector {
    /// The left-to-right sequence; the last entry is the subject.
    pub sequence: Vec<SequenceEntry>,
}

/// One `(combinator, simple selector)` step of a complex selector.
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    /// Relationship to the entry on the left (or the scope for the first).
    pub combinator: Combinator,
    /// The simple selector at this step.
    pub simple: SimpleSelector,
}

/// A simple selector: an optional plain-CSS compound fragment plus zero or
/// more recognized engine calls (`:has(...)`, `:text(...)`, ...).
///
/// Invariant: a simple selector must have a CSS fragment or at least one
/// engine call. The parser enforces this for text input; violating it
/// programmatically is a defect and panics in the evaluator.
#[derive(Debug, Clone)]
pub struct SimpleSelector {
    /// Stable id within one [`Selector`], used as the evaluator's memo key.
    pub(crate) fragment_id: u32,
    /// The plain-CSS compound fragment, if any.
    pub css: Option<crate::css::CssCompound>,
    /// Recognized engine calls, in declaration order.
    pub calls: Vec<EngineCall>,
}

/// A recognized functional/pseudo engine call with its parsed arguments.
#[derive(Debug, Clone)]
pub struct EngineCall {
    /// Engine-call name (`has`, `is`, `text`, `left-of`, ...).
    pub name: String,
    /// Arguments in declaration order.
    pub args: Vec<EngineArg>,
}

/// One argument of an engine call.
#[derive(Debug, Clone)]
pub enum EngineArg {
    /// String or ident literal.
    Text(String),
    /// Numeric literal.
    Number(f64),
    /// Regex compiled at parse time (for `text-matches`).
    Pattern(Regex),
    /// Nested selector list (for `has`, `is`, layout calls, ...).
    Selectors(Vec<ComplexSelector>),
    /// Role query compiled at parse time (for `:role(...)`), sharing the
    /// `role=` body grammar.
    Role(Box<RoleQuery>),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_chain(f, ChainId(0))
    }
}

impl Selector {
    fn fmt_chain(&self, f: &mut fmt::Formatter<'_>, id: ChainId) -> fmt::Result {
        let chain = self.chain(id);
        for (index, part) in chain.parts.iter().enumerate() {
            if index > 0 {
                write!(f, " >> ")?;
            }
            if chain.capture == Some(index) {
                write!(f, "*")?;
            }
            write!(f, "{}={}", part.engine, part.raw_body)?;
        }
        Ok(())
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.sequence.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", entry.combinator)?;
            }
            write!(f, "{}", entry.simple)?;
        }
        Ok(())
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(css) = &self.css {
            write!(f, "{}", css.source)?;
        }
        for call in &self.calls {
            write!(f, ":{}(", call.name)?;
            for (index, arg) in call.args.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                match arg {
                    EngineArg::Text(text) => write!(f, "\"{text}\"")?,
                    EngineArg::Number(n) => write!(f, "{n}")?,
                    EngineArg::Pattern(re) => write!(f, "\"{}\"", re.as_str())?,
                    EngineArg::Selectors(list) => {
                        for (i, complex) in list.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{complex}")?;
                        }
                    }
                    EngineArg::Role(query) => write!(f, "{query}")?,
                }
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
