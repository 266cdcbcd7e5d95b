//! Selector generation and locator source rendering.
//!
//! [`generate_selector`] searches for the cheapest selector that uniquely
//! resolves to a target element, scoring candidates by signal family and
//! verifying each against the evaluator. [`render`] turns a locator token
//! chain into idiomatic source for a target language, and
//! [`selector_to_tokens`] bridges the two.

mod code;
mod generate;

pub use code::{render, selector_to_tokens, LocatorToken, TargetLanguage};
pub use generate::{generate_selector, GeneratedSelector, GeneratorOptions};
