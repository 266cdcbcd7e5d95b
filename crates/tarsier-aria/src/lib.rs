//! Accessibility-tree computation: role resolution, accessible names,
//! hidden-state, snapshots and snapshot template matching.
//!
//! The crate answers two questions for the selector engines and the
//! snapshot facade: "what does assistive technology see for this element"
//! (role, name, states, hiddenness - all memoized per pass through
//! [`AriaCache`]) and "does this accessibility tree look like that
//! template" ([`matches_template`] over an [`AriaSnapshot`]).

mod cache;
mod error;
mod hidden;
mod name;
mod roles;
mod snapshot;
mod state;
mod tree;

pub use cache::AriaCache;
pub use error::SnapshotError;
pub use roles::{heading_level, resolve_role, AriaRole};
pub use snapshot::{
    matches_template, render, AriaTemplateNode, MatchMode, RenderMode, TemplateChild, TemplateText,
};
pub use state::{checked, disabled, expanded, level, pressed, selected};
pub use tree::{AriaChild, AriaNode, AriaSnapshot};
