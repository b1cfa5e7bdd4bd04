//! Main trace parser for Chrome trace-event JSON.
//!
//! Parses the raw JSON written by the span-producing tracer into spans.
//! Handles layout detection and per-event validation.

use super::events::TraceEvent;
use super::schema::{Profile, TreeProfile};
use super::span::Span;
use crate::utils::config::{SCHEMA_VERSION, TRACE_EVENT_FIELD_NAMES};
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Parsed trace data (internal representation)
#[derive(Debug, Clone, Default)]
pub struct ParsedTrace {
    /// Complete spans, in file order
    pub spans: Vec<Span>,

    /// Events of other phases, ignored
    pub ignored_events: usize,

    /// Malformed events that failed to decode
    pub skipped_events: usize,

    /// `displayTimeUnit` from the trace object, if present
    pub display_time_unit: Option<String>,
}

/// Parse raw trace JSON
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `raw_trace` - Either `{"traceEvents": [...]}` or a bare event array
///
/// # Returns
/// Complete spans ready for call-tree reconstruction
///
/// # Errors
/// * `ParseError::InvalidFormat` - Not an object/array, no event array, or
///   every event failed to decode
pub fn parse_trace(raw_trace: &serde_json::Value) -> Result<ParsedTrace, ParseError> {
    let (events, display_time_unit) = detect_trace_layout(raw_trace)?;

    let mut parsed = parse_events_array(events)?;
    parsed.display_time_unit = display_time_unit;

    debug!(
        "Parsed {} spans ({} ignored, {} skipped)",
        parsed.spans.len(),
        parsed.ignored_events,
        parsed.skipped_events
    );

    Ok(parsed)
}

/// Parse trace JSON from a string
pub fn parse_trace_str(json: &str) -> Result<ParsedTrace, ParseError> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    parse_trace(&raw)
}

/// Read and parse a trace file
pub fn read_trace_file(path: impl AsRef<Path>) -> Result<ParsedTrace, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    parse_trace_str(&contents)
}

/// Locate the event array and trace-level metadata
///
/// **Private** - internal helper for parse_trace
fn detect_trace_layout(
    raw_trace: &serde_json::Value,
) -> Result<(&[serde_json::Value], Option<String>), ParseError> {
    match raw_trace {
        serde_json::Value::Object(obj) => {
            let unit = obj
                .get("displayTimeUnit")
                .and_then(|v| v.as_str())
                .map(str::to_string);

            for field in TRACE_EVENT_FIELD_NAMES {
                if let Some(events) = obj.get(*field).and_then(|v| v.as_array()) {
                    return Ok((events.as_slice(), unit));
                }
            }

            Err(ParseError::InvalidFormat(format!(
                "Trace object has none of the event fields {:?}",
                TRACE_EVENT_FIELD_NAMES
            )))
        }

        serde_json::Value::Array(events) => {
            debug!("Trace is a bare event array");
            Ok((events.as_slice(), None))
        }

        _ => Err(ParseError::InvalidFormat(
            "Trace must be a JSON object or array".to_string(),
        )),
    }
}

/// Decode every event, keeping complete spans
///
/// **Private** - internal parsing logic
fn parse_events_array(events: &[serde_json::Value]) -> Result<ParsedTrace, ParseError> {
    let mut parsed = ParsedTrace {
        spans: Vec::with_capacity(events.len()),
        ..Default::default()
    };

    for (index, value) in events.iter().enumerate() {
        match serde_json::from_value::<TraceEvent>(value.clone()) {
            Ok(TraceEvent::Complete(event)) => parsed.spans.push(event.into_span()),
            Ok(TraceEvent::Other) => {
                let phase = value.get("ph").and_then(|v| v.as_str()).unwrap_or("?");
                debug!("Ignoring event {} with phase '{}'", index, phase);
                parsed.ignored_events += 1;
            }
            Err(e) => {
                // Log but don't fail - some events may be malformed
                warn!("Failed to parse event {}: {}", index, e);
                parsed.skipped_events += 1;
            }
        }
    }

    if parsed.skipped_events == events.len() && !events.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All trace events failed to parse".to_string(),
        ));
    }

    if events.is_empty() {
        warn!("No events found in trace");
    }

    Ok(parsed)
}

/// Convert per-tree summaries into the output profile format
///
/// **Public** - used by commands to create final output
pub fn to_profile(source: &str, parsed_trace: &ParsedTrace, trees: Vec<TreeProfile>) -> Profile {
    use chrono::Utc;

    Profile {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        display_time_unit: parsed_trace.display_time_unit.clone(),
        trees,
        rejected: Vec::new(),
        generated_at: Utc::now().to_rfc3339(),
    }
}
