use crate::calltree::{Forest, RejectedTree};
use crate::output::read_profile;
use crate::parser::{read_trace_file, ParsedTrace};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

/// Read a trace file and reconstruct its call trees
///
/// Returns the parse metadata (with the spans moved out), the forest of
/// well-nested trees normalised to start at 0 unless `absolute` is set, and
/// the trees that were dropped.
///
/// # Errors
/// Fails when the trace cannot be read, or when every tree was rejected
pub fn load_forest(
    trace: &Path,
    absolute: bool,
) -> Result<(ParsedTrace, Forest, Vec<RejectedTree>)> {
    let mut parsed = read_trace_file(trace)
        .with_context(|| format!("Failed to read trace {}", trace.display()))?;

    info!(
        "Read {} spans ({} other events ignored, {} malformed skipped)",
        parsed.spans.len(),
        parsed.ignored_events,
        parsed.skipped_events
    );

    let spans = std::mem::take(&mut parsed.spans);
    let (mut forest, rejected) = Forest::ingest(spans);

    if forest.is_empty() {
        if let Some(first) = rejected.first() {
            return Err(first.error.clone())
                .with_context(|| format!("Failed to reconstruct call tree {}", first.key));
        }
    }

    if !absolute {
        let offset = forest.normalize();
        debug!("Timestamps shifted by {}", offset);
    }

    Ok((parsed, forest, rejected))
}

/// Validate a profile JSON file
pub fn validate_profile_file(file_path: &Path) -> Result<()> {
    println!("Validating profile: {}", file_path.display());

    let profile = read_profile(file_path)
        .with_context(|| format!("Invalid profile {}", file_path.display()))?;

    if profile.version != SCHEMA_VERSION {
        println!(
            "! Schema version {} differs from current {}",
            profile.version, SCHEMA_VERSION
        );
    }

    println!("✓ Valid profile JSON");
    println!("  Version: {}", profile.version);
    println!("  Source: {}", profile.source);
    println!("  Trees: {}", profile.trees.len());
    for tree in &profile.trees {
        println!(
            "    {}: {} spans, total {:.1}, {} records, {} anomalies",
            tree.key,
            tree.span_count,
            tree.total_time,
            tree.records.len(),
            tree.anomalies.len()
        );
    }
    if !profile.rejected.is_empty() {
        println!("  Rejected trees: {}", profile.rejected.len());
        for entry in &profile.rejected {
            println!("    {}: {}", entry.key, entry.reason);
        }
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Calltrace Studio Profile Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Trace file the profile was built from");
        println!("  display_time_unit: string? - Time unit declared by the trace");
        println!("  trees: array               - One entry per (pid, tid)");
        println!("    pid, tid: number         - Process and thread id");
        println!("    key: string              - 'p<pid>_t<tid>'");
        println!("    span_count: number       - Spans in the call tree");
        println!("    total_time: number       - Sum of top-level durations");
        println!("    records: array           - Flame nodes, breadth-first");
        println!("      id, parent_id, depth   - Position (parent_id -1 at top level)");
        println!("      name: string           - Function name");
        println!("      total_size: number     - Summed duration");
        println!("      self_size: number      - Duration minus children");
        println!("      count: number          - Merged invocations");
        println!("    hot_paths: array         - Top call paths by self time");
        println!("    anomalies: array         - Records with negative self size");
        println!("  rejected: array?           - Trees dropped for bad nesting (key, reason)");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Calltrace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Profile Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Call-tree reconstruction, flame summaries and time-travel replay");
    println!("for Chrome trace-event span files.");
}
