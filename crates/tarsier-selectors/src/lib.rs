//! Selector language: tokenizer, parser and multi-engine evaluator.
//!
//! A selector is a `>>`-separated chain of parts, each handled by a named
//! engine (`css=`, `text=`, `role=`, `nth=`, `visible=`, nesting and
//! layout engines). [`parse_selector`] builds the immutable AST;
//! [`query`]/[`matches`] evaluate it against a
//! [`DomTree`](tarsier_dom::DomTree) through an explicit [`QueryCache`].

mod ast;
mod clause;
mod css;
mod engines;
mod error;
mod evaluator;
mod registry;
mod splitter;
mod tokenizer;

pub use ast::{
    Chain, ChainId, Combinator, ComplexSelector, EngineArg, EngineCall, PartBody, RoleQuery,
    Selector, SelectorPart, SequenceEntry, SimpleSelector, TextPredicate,
};
pub use css::{AttributeSelector, CssCompound, CssPart, CssPseudo};
pub use error::{MalformedSelectorError, QueryError};
pub use evaluator::{matches, query, QueryCache};
pub use registry::Capability;
pub use splitter::parse_selector;
pub use tokenizer::{tokenize, HashType, Token};
