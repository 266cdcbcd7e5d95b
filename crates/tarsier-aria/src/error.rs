//! Snapshot errors.

use thiserror::Error;

/// Errors raised by snapshot reference resolution and template matching.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The referenced snapshot generation is no longer the latest one;
    /// its element references may point at stale or re-used nodes.
    #[error("snapshot generation {requested} is stale (latest is {latest})")]
    Stale {
        /// The generation the caller referenced.
        requested: u64,
        /// The engine's current generation.
        latest: u64,
    },

    /// A template carried a regex pattern that failed to compile.
    #[error("invalid template pattern {pattern:?}")]
    BadPattern {
        /// The pattern source text.
        pattern: String,
    },
}
