use calltrace_studio::parser::{parse_trace_str, read_trace_file, SourceLocation, Span};
use pretty_assertions::assert_eq;
use std::io::Write;

const TRACE: &str = r#"{
    "traceEvents": [
        {"ph": "M", "pid": 1, "tid": 1, "name": "process_name", "args": {"name": "python"}},
        {"ph": "X", "pid": 1, "tid": 1, "ts": 100.0, "dur": 50.0, "name": "/app/main.py(4).main", "cat": "FEE"},
        {"ph": "X", "pid": 1, "tid": 1, "ts": 110.5, "dur": 2.5, "name": "builtins.print", "caller_lineno": 6},
        {"ph": "X", "pid": 1, "tid": 2, "ts": 105.0, "dur": 10.0, "name": "/app/worker.py(12).run",
         "args": {"func_args": {"n": "3"}}},
        {"ph": "i", "pid": 1, "tid": 1, "ts": 120.0, "name": "marker", "s": "t"},
        {"ph": "X", "pid": 1, "tid": 1, "name": "no_timestamp"}
    ],
    "displayTimeUnit": "us"
}"#;

#[test]
fn test_parse_python_tracer_output() {
    let parsed = parse_trace_str(TRACE).unwrap();

    assert_eq!(parsed.spans.len(), 3);
    assert_eq!(parsed.ignored_events, 2);
    assert_eq!(parsed.skipped_events, 1);
    assert_eq!(parsed.display_time_unit.as_deref(), Some("us"));

    let print = &parsed.spans[1];
    assert_eq!(print.start, 110.5);
    assert_eq!(print.end, 113.0);
    assert_eq!(print.caller_line, Some(6));
    assert!(print.location().is_none());

    let run = &parsed.spans[2];
    assert_eq!(run.tid, 2);
    assert_eq!(run.args.as_ref().unwrap()["func_args"]["n"], "3");
}

#[test]
fn test_read_trace_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRACE.as_bytes()).unwrap();

    let parsed = read_trace_file(file.path()).unwrap();
    assert_eq!(parsed.spans[0].name, "/app/main.py(4).main");
}

#[test]
fn test_read_missing_file_fails() {
    assert!(read_trace_file("/definitely/not/here.json").is_err());
}

#[test]
fn test_empty_event_array_is_accepted() {
    let parsed = parse_trace_str(r#"{"traceEvents": []}"#).unwrap();
    assert!(parsed.spans.is_empty());
}

#[test]
fn test_invalid_json_fails() {
    assert!(parse_trace_str("{not json").is_err());
}

#[test]
fn test_source_locations() {
    let span = Span::new(1, 1, "/app/main.py(4).main", 0.0, 1.0);
    assert_eq!(
        span.location(),
        Some(SourceLocation {
            file: "/app/main.py".to_string(),
            line: 4,
            function: "main".to_string(),
        })
    );
    assert_eq!(span.location().unwrap().to_string(), "main (/app/main.py:4)");

    assert!(SourceLocation::parse("<frozen importlib._bootstrap>(1).find").is_some());
    assert!(SourceLocation::parse("time.sleep").is_none());
}

#[test]
fn test_span_intervals() {
    assert!(Span::new(1, 1, "f", 1.0, 1.0).is_instant());
    assert!(Span::new(1, 1, "f", 1.0, 1.0).has_valid_interval());
    assert!(!Span::new(1, 1, "f", 2.0, 1.0).has_valid_interval());
    assert!(!Span::new(1, 1, "f", f64::NAN, 1.0).has_valid_interval());
    assert_eq!(Span::new(1, 1, "f", 1.0, 3.5).duration(), 2.5);
}
