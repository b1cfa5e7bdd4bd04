//! Calltrace Studio
//!
//! Call-tree reconstruction, flame summaries and time-travel replay for
//! span traces in the Chrome trace-event format.
//!
//! This crate provides the core implementation for the `calltrace` CLI tool:
//!
//! - [`parser`] turns trace JSON into spans
//! - [`calltree`] rebuilds one strictly nested call tree per (pid, tid),
//!   whatever order the spans arrive in
//! - [`aggregator`] and [`flamegraph`] merge call paths into flame data
//! - [`replay`] moves a cursor forward and backward through a call tree
//!
//! ## Getting Started
//!
//! ```bash
//! calltrace flame --trace result.json --summary
//! calltrace replay --trace result.json
//! ```

pub mod aggregator;
pub mod calltree;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod replay;
pub mod utils;
