//! Backends module - File system operations
//!
//! Provides:
//! - scan: Directory discovery and ignore-rule filtering

pub mod scan;
