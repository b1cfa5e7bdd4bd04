//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Parsing raw Chrome trace-event JSON
//! - Decoding event phases (only complete spans reach the call tree)
//! - Extracting source locations from span names
//! - Defining output schema

pub mod chrome_trace;
pub mod events;
pub mod schema;
pub mod span;

// Re-export main types
pub use chrome_trace::{parse_trace, parse_trace_str, read_trace_file, to_profile, ParsedTrace};
pub use events::{CompleteEvent, TraceEvent};
pub use schema::{FlameAnomaly, FlameRecord, HotPath, Profile, RejectedTreeEntry, TreeProfile};
pub use span::{SourceLocation, Span};
