//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while building a call tree from spans.
///
/// Any of these aborts ingestion of the affected tree: the input spans are
/// not properly nested, so the producer of the trace is at fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error(
        "span '{name}' [{start}, {end}) partially overlaps '{other}' [{other_start}, {other_end})"
    )]
    PartialOverlap {
        name: String,
        start: f64,
        end: f64,
        other: String,
        other_start: f64,
        other_end: f64,
    },

    #[error("span '{name}' has an invalid interval [{start}, {end})")]
    InvalidInterval { name: String, start: f64, end: f64 },

    #[error("call tree invariant broken: {0}")]
    BrokenInvariant(String),
}

/// Errors that can occur during trace parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Failed to read trace: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Recoverable navigation failures reported by the replay navigator.
///
/// The cursor is left untouched whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("at the end of the trace")]
    EndOfTrace,

    #[error("at the beginning of the trace")]
    BeginningOfTrace,

    #[error("No callers available")]
    NoCallers,

    #[error("No outer frame anymore")]
    NoOuterFrame,

    #[error("Already at current frame")]
    AtCurrentFrame,

    #[error("timestamp {ts} out of range [{first}, {last}]")]
    TimestampOutOfRange { ts: f64, first: f64, last: f64 },

    #[error("No such tid: {0}")]
    NoSuchThread(u64),

    #[error("No such pid: {0}")]
    NoSuchProcess(u64),

    #[error("trace contains no spans")]
    EmptyTrace,
}

/// Errors in a line of the replay interpreter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0} (type 'help' for a list)")]
    Unknown(String),

    #[error("'{command}' needs an argument: {argument}")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("'{command}' cannot use '{value}'")]
    InvalidArgument { command: String, value: String },
}
