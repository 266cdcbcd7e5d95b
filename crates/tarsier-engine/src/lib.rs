//! Boundary facade of the element addressing engine.
//!
//! [`Engine`] wraps one document and exposes the operations an automation
//! driver consumes: selector parsing and querying (strict and non-strict),
//! selector generation, accessibility snapshots with generation-checked
//! references, template matching, locator source rendering and
//! presentation-only highlight bookkeeping.

mod engine;
mod error;

pub use engine::{Engine, TemplateMatch};
pub use error::{ElementPreview, EngineError};

pub use tarsier_locator::{render as render_locator_source, LocatorToken, TargetLanguage};
pub use tarsier_selectors::parse_selector;
