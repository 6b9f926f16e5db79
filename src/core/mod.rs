//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Data model for candidates and aggregated records
//! - Glob pattern matching and ignore rules
//! - File classification and reading
//! - XML rendering
//! - Path normalization utilities
//! - Token counting for LLM context budgeting

pub mod file_reader;
pub mod model;
pub mod paths;
pub mod pattern;
pub mod render;
pub mod rules;
pub mod tokenizer;
