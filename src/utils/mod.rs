//! Constants and error types shared across the crate.

pub mod config;
pub mod error;

// Re-export commonly used error types for convenience
pub use error::{CommandError, NavError, OutputError, ParseError, StructuralError};
