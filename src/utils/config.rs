//! Configuration and constants for the CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Name of the synthetic root node of every call tree
pub const CALL_TREE_ROOT_NAME: &str = "__ROOT__";

/// Name of the synthetic root node of every flame tree
pub const FLAME_ROOT_NAME: &str = "__root__";

// Field names that may hold the event array (different producers use different names)
pub const TRACE_EVENT_FIELD_NAMES: &[&str] = &["traceEvents", "trace_events", "events"];

/// Span names of the form `<file>(<line>).<function>` carry a source location.
/// The first group is greedy so the last `(<digits>).` in the name wins.
pub const LOCATION_PATTERN: &str = r"^(.*)\(([0-9]+)\)\.(.*)$";

/// Default number of hot paths written per tree
pub const DEFAULT_TOP_PATHS: usize = 20;
pub const MAX_TOP_PATHS: usize = 1000;
