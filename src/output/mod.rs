//! Output writers for profile and flame data.
//!
//! This module handles writing data to disk in various formats:
//! - JSON profiles (flattened flame records and hot paths)
//! - Nested flame JSON
//! - Folded stacks

pub mod folded;
pub mod json;

// Re-export main functions
pub use folded::{folded_lines, write_folded};
pub use json::{nested_flames, read_profile, write_nested_flames, write_profile};
