//! Flattened flame records and text summaries.
//!
//! Rendering front-ends consume flame data as a flat list of records
//! numbered breadth-first, each pointing at its parent by id. This module
//! produces those records, the per-tree profile entry, and a terminal
//! summary of the hottest paths.

use crate::aggregator::{build_collapsed_stacks, calculate_hot_paths, CollapsedStack, FlameTree};
use crate::calltree::CallTree;
use crate::parser::schema::{FlameAnomaly, FlameRecord, TreeProfile};
use crate::parser::SourceLocation;
use log::{debug, warn};
use std::collections::VecDeque;

/// Flatten a flame tree breadth-first
///
/// **Public** - main entry point for record generation
///
/// # Returns
/// Records numbered from 0 (top-level paths have `parent_id = -1` and
/// `depth = 0`), plus every record whose self size came out negative
pub fn generate_flame_records(flame: &FlameTree) -> (Vec<FlameRecord>, Vec<FlameAnomaly>) {
    let mut records = Vec::new();
    let mut anomalies = Vec::new();

    let mut queue: VecDeque<_> = flame
        .root
        .children
        .values()
        .map(|node| (node, -1_i64, 0_usize))
        .collect();

    while let Some((node, parent_id, depth)) = queue.pop_front() {
        let id = records.len();
        let self_size = node.self_value();

        if self_size < 0.0 {
            warn!(
                "Flame node '{}' in {} has negative self size {}",
                node.name, flame.key, self_size
            );
            anomalies.push(FlameAnomaly {
                id,
                name: node.name.clone(),
                self_size,
            });
        }

        records.push(FlameRecord {
            id,
            parent_id,
            depth,
            name: node.name.clone(),
            total_size: node.value,
            self_size,
            count: node.count,
        });

        queue.extend(
            node.children
                .values()
                .map(|child| (child, id as i64, depth + 1)),
        );
    }

    debug!(
        "Flattened {} into {} records ({} anomalies)",
        flame.key,
        records.len(),
        anomalies.len()
    );
    (records, anomalies)
}

/// Build the profile entry of one call tree
///
/// **Public** - used by the flame command
///
/// # Arguments
/// * `tree` - Reconstructed call tree
/// * `flame` - Its aggregated flame tree
/// * `top_n` - Number of hot paths to keep
pub fn build_tree_profile(tree: &CallTree, flame: &FlameTree, top_n: usize) -> TreeProfile {
    let (records, anomalies) = generate_flame_records(flame);
    let total_time = flame.total_time();
    let stacks = build_collapsed_stacks(flame);

    TreeProfile {
        pid: tree.pid(),
        tid: tree.tid(),
        key: flame.key.to_string(),
        span_count: tree.len(),
        total_time,
        records,
        hot_paths: calculate_hot_paths(&stacks, total_time, top_n),
        anomalies,
    }
}

/// ANSI color by the kind of the frame at the end of a stack
fn get_ansi_color(name: &str) -> &'static str {
    if SourceLocation::parse(name).is_none() {
        "\x1b[90m" // Gray (builtin / native)
    } else if name.contains("<module>") {
        "\x1b[36m" // Cyan
    } else if name.contains("__init__") || name.contains("__call__") {
        "\x1b[35m" // Magenta
    } else {
        "\x1b[33m" // Yellow
    }
}

/// Create a text summary of the hottest stacks with percentages
pub fn generate_text_summary(stacks: &[CollapsedStack], max_lines: usize, total_time: f64) -> String {
    let mut lines = Vec::new();

    lines.push("  HOT PATHS (self time)".to_string());
    lines.push(format!("  ┏{}┳{}┳{}┓", "━".repeat(44), "━".repeat(14), "━".repeat(9)));
    lines.push(format!(
        "  ┃ {:<42} ┃ {:^12} ┃ {:^7} ┃",
        "Call Stack (Hottest First)", "SELF", "%"
    ));
    lines.push(format!("  ┣{}╋{}╋{}┫", "━".repeat(44), "━".repeat(14), "━".repeat(9)));

    let total = if total_time > 0.0 { total_time } else { 1.0 };
    let reset = "\x1b[0m";

    for stack in stacks.iter().take(max_lines) {
        let percentage = stack.weight / total * 100.0;
        let leaf = stack.stack.rsplit(';').next().unwrap_or(&stack.stack);
        let color = get_ansi_color(leaf);

        lines.push(format!(
            "  ┃ {}{:<42}{} ┃ {:>12.1} ┃ {:>6.1}% ┃",
            color,
            truncate_left(&stack.stack, 42),
            reset,
            stack.weight,
            percentage
        ));
    }

    lines.push(format!("  ┗{}┻{}┻{}┛", "━".repeat(44), "━".repeat(14), "━".repeat(9)));

    if stacks.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing top {} of {} unique paths)",
            max_lines,
            stacks.len()
        ));
    }

    lines.join("\n")
}

/// Keep the last `width` characters, prefixed with "..." when cut
fn truncate_left(text: &str, width: usize) -> String {
    let chars = text.chars().count();
    if chars <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(chars - (width - 3)).collect();
    format!("...{}", tail)
}
