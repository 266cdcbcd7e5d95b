//! Facade errors.

use tarsier_aria::SnapshotError;
use tarsier_dom::NodeId;
use tarsier_selectors::{MalformedSelectorError, QueryError};
use thiserror::Error;

/// A short description of one element matched by an over-broad strict
/// query, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPreview {
    /// The matched element.
    pub element: NodeId,
    /// Markup-shaped preview of the element.
    pub markup: String,
    /// A generated selector resolving to this element, best effort.
    pub selector: String,
}

/// Errors surfaced by [`crate::Engine`] operations. All fail fast; retry
/// policy belongs to the automation layer above.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The selector text failed to parse.
    #[error(transparent)]
    MalformedSelector(#[from] MalformedSelectorError),

    /// The selector referenced an unknown engine or an unqueryable root.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A strict query resolved to more than one element.
    #[error("strict mode violation: {} elements match", previews.len())]
    StrictModeViolation {
        /// Up to ten matched-element previews with generated selectors.
        previews: Vec<ElementPreview>,
    },

    /// A snapshot reference was stale or a template pattern was invalid.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
