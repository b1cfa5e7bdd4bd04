//! Build collapsed stack format from a flame tree.
//!
//! Collapsed stacks are the input format for external flamegraph renderers.
//! Format: "parent;child;grandchild weight"
//!
//! Example: "main;run;read_config 1000"
//! This means: main called run which called read_config, spending 1000
//! trace units in read_config itself.

use super::flame::{FlameNode, FlameTree};
use log::debug;

/// A single collapsed stack entry
///
/// **Public** - used by metrics and the folded writer
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Self time at the end of this stack
    pub weight: f64,
}

impl CollapsedStack {
    pub fn new(stack: impl Into<String>, weight: f64) -> Self {
        Self {
            stack: stack.into(),
            weight,
        }
    }

    /// Folded line with the weight rounded to whole trace units
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight.round() as u64)
    }
}

/// Build collapsed stacks from a flame tree
///
/// **Public** - main entry point for stack building
///
/// # Arguments
/// * `flame` - Aggregated flame tree
///
/// # Returns
/// One stack per merged call path with self time, heaviest first
///
/// # Algorithm
/// 1. Walk the flame tree depth-first, tracking the path
/// 2. Emit each node's non-zero self time under its joined path
/// 3. Sort by weight (descending), ties by stack text
pub fn build_collapsed_stacks(flame: &FlameTree) -> Vec<CollapsedStack> {
    let mut stacks = collect(flame);

    stacks.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.stack.cmp(&b.stack))
    });

    debug!("Built {} collapsed stacks for {}", stacks.len(), flame.key);
    stacks
}

/// Pre-order walk with an explicit stack; `ends[d]` is the path length after depth `d`
fn collect(flame: &FlameTree) -> Vec<CollapsedStack> {
    let mut out = Vec::new();
    let mut path = String::new();
    let mut ends: Vec<usize> = Vec::new();
    let mut pending: Vec<(&FlameNode, usize)> = flame
        .root
        .children
        .values()
        .rev()
        .map(|node| (node, 0))
        .collect();

    while let Some((node, depth)) = pending.pop() {
        ends.truncate(depth);
        path.truncate(ends.last().copied().unwrap_or(0));
        if depth > 0 {
            path.push(';');
        }
        path.push_str(&node.name);
        ends.push(path.len());

        let weight = node.self_value();
        if weight != 0.0 {
            out.push(CollapsedStack::new(path.as_str(), weight));
        }

        pending.extend(node.children.values().rev().map(|child| (child, depth + 1)));
    }

    out
}
