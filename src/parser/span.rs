//! The span value type and source-location parsing of span names.
//!
//! A span is one function invocation: `[start, end)` on one (pid, tid).
//! Names of the form `<file>(<line>).<function>` carry a source location;
//! anything else (builtins, native calls) is treated as opaque.

use crate::utils::config::LOCATION_PATTERN;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(LOCATION_PATTERN).expect("LOCATION_PATTERN is a valid regex"));

/// One execution span, normalised from a complete trace event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Process id
    pub pid: u64,

    /// Thread id
    pub tid: u64,

    /// Qualified name, conventionally `<file>(<line>).<function>`
    pub name: String,

    /// Start timestamp (trace units)
    pub start: f64,

    /// End timestamp, `end >= start`
    pub end: f64,

    /// Line in the caller from which this span was invoked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_line: Option<u32>,

    /// Raw argument payload recorded with the span
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
}

impl Span {
    pub fn new(pid: u64, tid: u64, name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            pid,
            tid,
            name: name.into(),
            start,
            end,
            caller_line: None,
            args: None,
        }
    }

    pub fn with_caller_line(mut self, line: u32) -> Self {
        self.caller_line = Some(line);
        self
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = Some(args);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Zero-duration span
    pub fn is_instant(&self) -> bool {
        self.end == self.start
    }

    /// Finite bounds with `end >= start`
    pub fn has_valid_interval(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end >= self.start
    }

    pub fn location(&self) -> Option<SourceLocation> {
        SourceLocation::parse(&self.name)
    }
}

/// Source location extracted from a span name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl SourceLocation {
    /// Parse `<file>(<line>).<function>`; `None` for opaque names
    pub fn parse(name: &str) -> Option<Self> {
        let caps = LOCATION_RE.captures(name)?;
        let line = caps[2].parse::<u32>().ok()?;

        Some(Self {
            file: caps[1].to_string(),
            line,
            function: caps[3].to_string(),
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        let loc = SourceLocation::parse("/src/demo.py(21).t").unwrap();
        assert_eq!(loc.file, "/src/demo.py");
        assert_eq!(loc.line, 21);
        assert_eq!(loc.function, "t");
    }

    #[test]
    fn test_parse_location_last_marker_wins() {
        let loc = SourceLocation::parse("pkg(1).mod.py(7).Class.method").unwrap();
        assert_eq!(loc.file, "pkg(1).mod.py");
        assert_eq!(loc.line, 7);
        assert_eq!(loc.function, "Class.method");
    }

    #[test]
    fn test_opaque_names() {
        assert!(SourceLocation::parse("builtins.exec").is_none());
        assert!(SourceLocation::parse("h (test.py:6)").is_none());
        assert!(SourceLocation::parse("file.py(abc).f").is_none());
    }

    #[test]
    fn test_span_interval_checks() {
        assert!(Span::new(1, 1, "a", 0.0, 1.0).has_valid_interval());
        assert!(Span::new(1, 1, "a", 2.0, 2.0).is_instant());
        assert!(!Span::new(1, 1, "a", 2.0, 1.0).has_valid_interval());
        assert!(!Span::new(1, 1, "a", f64::NAN, 1.0).has_valid_interval());
    }
}
