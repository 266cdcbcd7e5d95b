//! DOM tree implementation for the Tarsier element-addressing engine.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), extended with the
//! pieces the selector and accessibility engines need from a rendered
//! document: shadow roots, per-element layout boxes, and the inline-style
//! visibility inputs.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow checker
//! issues. Embedders either build trees programmatically or parse an HTML
//! fragment via [`DomTree::from_html`].

pub mod parser;
pub mod stability;
pub mod tree;

pub use stability::{PollStatus, StabilityPoll, StabilityPollConfig};
pub use tree::{AttributesMap, DomTree, ElementData, Node, NodeId, NodeKind};
