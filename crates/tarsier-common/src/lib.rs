//! Common utilities for the Tarsier element-addressing engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Geometry** - bounding boxes and the distance math used by layout
//!   proximity selectors
//! - **Text** - whitespace normalization and identifier heuristics shared by
//!   the accessibility and selector-generation components
//! - **Warning System** - deduplicated terminal output for tolerated but
//!   unsupported input

pub mod geometry;
pub mod text;
pub mod warning;
