use calltrace_studio::calltree::Forest;
use calltrace_studio::commands::{
    execute_flame, load_forest, run_session, validate_args, validate_profile_file, FlameArgs,
};
use calltrace_studio::output::read_profile;
use calltrace_studio::parser::Span;
use calltrace_studio::replay::Navigator;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const TRACE: &str = r#"{"traceEvents": [
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1000, "dur": 120, "name": "demo.py(1).t"},
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1002, "dur": 88, "name": "demo.py(3).f1", "caller_lineno": 2},
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1003, "dur": 17, "name": "demo.py(4).g"},
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1003, "dur": 1, "name": "demo.py(4).h1"},
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1017, "dur": 2, "name": "demo.py(18).h2"},
    {"ph": "X", "pid": 1, "tid": 1, "ts": 1095, "dur": 15, "name": "demo.py(96).f2"},
    {"ph": "X", "pid": 1, "tid": 2, "ts": 1010, "dur": 40, "name": "demo.py(50).worker"}
]}"#;

fn write_trace(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("trace.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn scenario_forest() -> Forest {
    let located = |name: &str, line: u32, start: f64, end: f64| {
        Span::new(1, 1, format!("demo.py({}).{}", line, name), start, end)
    };
    Forest::from_spans(vec![
        located("t", 1, 0.0, 120.0),
        located("f1", 3, 2.0, 90.0).with_caller_line(2),
        located("g", 4, 3.0, 20.0),
        located("h1", 4, 3.0, 4.0),
        located("h2", 18, 17.0, 19.0),
        located("f2", 96, 95.0, 110.0),
        Span::new(1, 2, "demo.py(50).worker", 10.0, 50.0),
    ])
    .unwrap()
}

fn session(script: &str) -> Vec<String> {
    let forest = scenario_forest();
    let mut nav = Navigator::new(&forest).unwrap();
    let mut output = Vec::new();
    run_session(&mut nav, Cursor::new(script), &mut output, false).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_execute_flame_end_to_end() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = write_trace(temp_dir.path(), TRACE);

    let args = FlameArgs {
        trace,
        output_json: temp_dir.path().join("out/profile.json"),
        output_nested: Some(temp_dir.path().join("out/nested.json")),
        output_folded: Some(temp_dir.path().join("out/stacks.folded")),
        top_paths: 3,
        ..Default::default()
    };
    validate_args(&args).unwrap();
    execute_flame(args.clone()).unwrap();

    let profile = read_profile(&args.output_json).unwrap();
    assert_eq!(profile.trees.len(), 2);
    assert_eq!(profile.trees[0].key, "p1_t1");
    assert_eq!(profile.trees[0].span_count, 6);
    assert_eq!(profile.trees[0].total_time, 120.0);
    assert_eq!(profile.trees[0].hot_paths.len(), 3);
    assert_eq!(profile.trees[1].total_time, 40.0);

    let folded = std::fs::read_to_string(args.output_folded.unwrap()).unwrap();
    assert!(folded.lines().any(|line| line == "p1_t2;demo.py(50).worker 40"));

    assert!(args.output_nested.unwrap().exists());
    validate_profile_file(&args.output_json).unwrap();
}

#[test]
fn test_execute_flame_rejects_bad_nesting() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = write_trace(
        temp_dir.path(),
        r#"[
            {"ph": "X", "pid": 1, "tid": 1, "ts": 0, "dur": 10, "name": "a"},
            {"ph": "X", "pid": 1, "tid": 1, "ts": 5, "dur": 10, "name": "b"}
        ]"#,
    );

    let args = FlameArgs {
        trace,
        output_json: temp_dir.path().join("profile.json"),
        ..Default::default()
    };
    assert!(execute_flame(args.clone()).is_err());
    assert!(!args.output_json.exists());
}

#[test]
fn test_execute_flame_keeps_well_nested_threads() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = write_trace(
        temp_dir.path(),
        r#"[
            {"ph": "X", "pid": 1, "tid": 1, "ts": 0, "dur": 10, "name": "a"},
            {"ph": "X", "pid": 1, "tid": 1, "ts": 5, "dur": 10, "name": "b"},
            {"ph": "X", "pid": 1, "tid": 2, "ts": 0, "dur": 30, "name": "worker"},
            {"ph": "X", "pid": 1, "tid": 2, "ts": 5, "dur": 10, "name": "job"}
        ]"#,
    );

    let args = FlameArgs {
        trace,
        output_json: temp_dir.path().join("profile.json"),
        ..Default::default()
    };
    execute_flame(args.clone()).unwrap();

    let profile = read_profile(&args.output_json).unwrap();
    assert_eq!(profile.trees.len(), 1);
    assert_eq!(profile.trees[0].key, "p1_t2");
    assert_eq!(profile.trees[0].total_time, 30.0);
    assert_eq!(profile.rejected.len(), 1);
    assert_eq!(profile.rejected[0].key, "p1_t1");
    assert!(profile.rejected[0].reason.contains("partially overlaps"));
    validate_profile_file(&args.output_json).unwrap();
}

#[test]
fn test_load_forest_reports_rejected_trees() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = write_trace(
        temp_dir.path(),
        r#"[
            {"ph": "X", "pid": 1, "tid": 1, "ts": 100, "dur": 10, "name": "a"},
            {"ph": "X", "pid": 1, "tid": 1, "ts": 105, "dur": 10, "name": "b"},
            {"ph": "X", "pid": 1, "tid": 2, "ts": 120, "dur": 30, "name": "worker"}
        ]"#,
    );

    let (_, forest, rejected) = load_forest(&trace, false).unwrap();
    assert_eq!(forest.tids(1), vec![2]);
    assert_eq!(forest.first_ts(), Some(0.0));
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].key.tid, 1);

    let nav = Navigator::new(&forest).unwrap();
    assert_eq!(nav.key().tid, 2);
    assert_eq!(nav.current_node().name(), "worker");
}

#[test]
fn test_validate_args_rejects_large_top_paths() {
    let temp_dir = tempfile::tempdir().unwrap();
    let args = FlameArgs {
        trace: write_trace(temp_dir.path(), "[]"),
        top_paths: 1_000_000,
        ..Default::default()
    };
    assert!(validate_args(&args).is_err());
}

#[test]
fn test_load_forest_normalizes_timestamps() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = write_trace(temp_dir.path(), TRACE);

    let (parsed, forest, rejected) = load_forest(&trace, false).unwrap();
    assert!(parsed.spans.is_empty());
    assert!(rejected.is_empty());
    assert_eq!(forest.first_ts(), Some(0.0));
    assert_eq!(forest.last_ts(), Some(120.0));

    let (_, absolute, _) = load_forest(&trace, true).unwrap();
    assert_eq!(absolute.first_ts(), Some(1000.0));
}

#[test]
fn test_validate_rejects_non_profile() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_trace(temp_dir.path(), TRACE);
    assert!(validate_profile_file(&path).is_err());
}

#[test]
fn test_session_steps_and_reports() {
    let lines = session("step\nstep\n\nstep\ntimestamp\nwhere\nquit\nstep\n");

    assert_eq!(
        lines,
        vec![
            "[p1_t1] t (demo.py:1) @ 2, line 2",
            "[p1_t1] f1 (demo.py:3) @ 3",
            "[p1_t1] g (demo.py:4) @ 3",
            "[p1_t1] h1 (demo.py:4) @ 3",
            "3",
            "  t (demo.py:1), line 2",
            "  f1 (demo.py:3)",
            "  g (demo.py:4)",
            "> h1 (demo.py:4)",
        ]
    );
}

#[test]
fn test_session_reports_errors_and_continues() {
    let lines = session("step_back\ngoto 500\njump\ngoto\ngoto 100\nup\nargs\n");

    assert_eq!(
        lines,
        vec![
            "[p1_t1] t (demo.py:1) @ 2, line 2",
            "at the beginning of the trace",
            "timestamp 500 out of range [0, 120]",
            "Unknown command: jump (type 'help' for a list)",
            "'goto' needs an argument: timestamp",
            "[p1_t1] f2 (demo.py:96) @ 95",
            "[p1_t1] t (demo.py:1) @ 95",
            "No args",
        ]
    );
}

#[test]
fn test_session_switches_threads() {
    let lines = session("goto 30\ntid\nswitch_tid 2\nswitch_tid 9\npid\n");

    assert_eq!(lines[1], "[p1_t1] f1 (demo.py:3) @ 20");
    assert_eq!(lines[2], "> 1");
    assert_eq!(lines[3], "  2");
    assert_eq!(lines[4], "[p1_t2] worker (demo.py:50) @ 10");
    assert_eq!(lines[5], "No such tid: 9");
    assert_eq!(lines[6], "> 1");
}
