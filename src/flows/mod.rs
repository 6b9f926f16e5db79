//! Flows module - Multi-step operations
//!
//! Provides:
//! - flatten: Discover, read and serialize a project into one document
//! - stats: Summary statistics for a flatten run

pub mod flatten;
pub mod stats;
