//! Selector parse and query errors.
//!
//! All failures here are fail-fast: nothing is retried internally, and
//! retry policy (waiting for an element to appear, for instance) belongs to
//! the automation layer above the engine.

use thiserror::Error;

/// A selector string the parser rejects. Carries the offending fragment and
/// its position so callers can point at the problem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed selector {selector:?}: unexpected {fragment:?} at offset {position}")]
pub struct MalformedSelectorError {
    /// The full selector string as given.
    pub selector: String,
    /// The offending fragment.
    pub fragment: String,
    /// Character offset of the fragment within the selector (best effort).
    pub position: usize,
}

/// Errors raised while evaluating a parsed selector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The selector references an engine name nothing is registered under.
    #[error("unknown selector engine {name:?}")]
    UnknownEngine {
        /// The unrecognized engine name.
        name: String,
    },

    /// The query root cannot be queried (not an element or document node,
    /// or no longer part of the tree).
    #[error("root node is not queryable")]
    NotQueryable,

    /// A `text-matches` or template pattern failed to compile.
    #[error("invalid regular expression {pattern:?}")]
    BadPattern {
        /// The pattern source text.
        pattern: String,
    },
}
