//! Input event schema (Chrome trace-event format).
//!
//! Events are decoded once, by their `ph` marker, into [`TraceEvent`].
//! Only the complete-span variant carries data into the call-tree builder.

use super::span::Span;
use serde::Deserialize;

/// A single decoded trace event
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "ph")]
pub enum TraceEvent {
    /// Complete span: start + duration
    #[serde(rename = "X")]
    Complete(CompleteEvent),

    /// Instant, counter, object and every other phase
    #[serde(other)]
    Other,
}

/// Raw complete event (`ph == "X"`)
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteEvent {
    pub pid: u64,
    pub tid: u64,

    /// Start timestamp
    pub ts: f64,

    /// Duration, same unit as `ts`
    pub dur: f64,

    pub name: String,

    /// Calling line; producers write -1 when unknown
    #[serde(default)]
    pub caller_lineno: Option<i64>,

    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

impl CompleteEvent {
    pub fn into_span(self) -> Span {
        let caller_line = self
            .caller_lineno
            .and_then(|line| u32::try_from(line).ok());

        Span {
            pid: self.pid,
            tid: self.tid,
            name: self.name,
            start: self.ts,
            end: self.ts + self.dur,
            caller_line,
            args: self.args,
        }
    }
}
