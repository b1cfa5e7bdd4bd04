//! Aggregation of call trees into flame trees, collapsed stacks and metrics.
//!
//! This module transforms reconstructed call trees into:
//! - Flame trees (call paths merged by name)
//! - Collapsed stack format (for external flamegraph renderers)
//! - Hot path analysis (top self-time consumers)
//! - Self-time distribution statistics

pub mod flame;
pub mod metrics;
pub mod stack_builder;

// Re-export main types and functions
pub use flame::{aggregate, aggregate_forest, FlameNode, FlameTree};
pub use metrics::{calculate_hot_paths, calculate_time_distribution, TimeDistribution};
pub use stack_builder::{build_collapsed_stacks, CollapsedStack};
