//! Output JSON schema definitions for profile data.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use serde::{Deserialize, Serialize};

/// Top-level profile structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace file the profile was built from
    pub source: String,

    /// Time unit declared by the trace producer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_time_unit: Option<String>,

    /// One flame summary per (pid, tid)
    pub trees: Vec<TreeProfile>,

    /// Call trees left out because their spans do not nest
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedTreeEntry>,

    /// Timestamp when profile was generated
    pub generated_at: String,
}

/// A call tree that could not be reconstructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTreeEntry {
    /// Tree key in `p<pid>_t<tid>` form
    pub key: String,

    /// Why the tree was dropped
    pub reason: String,
}

/// Flame summary of a single call tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeProfile {
    pub pid: u64,
    pub tid: u64,

    /// `p{pid}_t{tid}`
    pub key: String,

    /// Number of spans in the call tree
    pub span_count: usize,

    /// Sum of top-level span durations
    pub total_time: f64,

    /// Flattened flame nodes, breadth-first
    pub records: Vec<FlameRecord>,

    /// Top call paths by self time
    pub hot_paths: Vec<HotPath>,

    /// Flame nodes whose children outlast them
    #[serde(default)]
    pub anomalies: Vec<FlameAnomaly>,
}

/// One flattened flame node, as consumed by rendering front-ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameRecord {
    pub id: usize,

    /// -1 for top-level nodes
    pub parent_id: i64,

    pub depth: usize,
    pub name: String,
    pub total_size: f64,

    /// `total_size` minus the children's `total_size`
    pub self_size: f64,

    /// Number of merged invocations
    pub count: u64,
}

/// A flame node with negative self size (malformed input durations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameAnomaly {
    pub id: usize,
    pub name: String,
    pub self_size: f64,
}

/// A hot path in the execution (call path with self time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotPath {
    /// Collapsed stack representation (e.g., "main;execute;read")
    pub stack: String,

    /// Self time spent at the end of this path
    pub self_time: f64,

    /// Percentage of the tree's total time
    pub percentage: f64,
}
