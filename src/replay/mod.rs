//! Time-travel replay over reconstructed call trees.
//!
//! This module handles:
//! - The frame chain that records the current call stack
//! - Forward and backward stepping, returning and timestamp jumps
//! - Switching between threads and processes of the same trace

pub mod frame;
pub mod navigator;

pub use frame::{Frame, FrameChain};
pub use navigator::{NavState, Navigator, StackEntry};
