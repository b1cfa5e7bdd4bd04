//! Flame data for rendering front-ends.
//!
//! This module converts aggregated flame trees into breadth-first records
//! and the per-tree profile entries written by the flame command.

pub mod generator;

// Re-export main functions
pub use generator::{build_tree_profile, generate_flame_records, generate_text_summary};
