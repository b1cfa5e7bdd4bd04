//! Calculate performance metrics and hot paths from collapsed stacks.
//!
//! Hot paths are the call paths with the most self time.
//! These are the primary targets for optimization.

use super::stack_builder::CollapsedStack;
use crate::parser::schema::HotPath;
use log::debug;

/// Calculate hot paths from collapsed stacks
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `stacks` - Collapsed stacks from stack_builder, heaviest first
/// * `total_time` - Total time of the tree
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths with positive self time, heaviest first
pub fn calculate_hot_paths(stacks: &[CollapsedStack], total_time: f64, top_n: usize) -> Vec<HotPath> {
    debug!(
        "Calculating top {} hot paths from {} stacks",
        top_n,
        stacks.len()
    );

    stacks
        .iter()
        .filter(|stack| stack.weight > 0.0)
        .take(top_n)
        .map(|stack| create_hot_path(stack, total_time))
        .collect()
}

/// **Private** - internal conversion
fn create_hot_path(stack: &CollapsedStack, total_time: f64) -> HotPath {
    HotPath {
        stack: stack.stack.clone(),
        self_time: stack.weight,
        percentage: percentage_of(stack.weight, total_time),
    }
}

fn percentage_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Calculate self-time distribution statistics
///
/// **Public** - provides summary statistics
///
/// # Arguments
/// * `stacks` - Collapsed stacks, heaviest first
pub fn calculate_time_distribution(stacks: &[CollapsedStack]) -> TimeDistribution {
    if stacks.is_empty() {
        return TimeDistribution::default();
    }

    let total: f64 = stacks.iter().map(|s| s.weight).sum();
    let count = stacks.len();
    let mean = total / count as f64;

    let mut weights: Vec<f64> = stacks.iter().map(|s| s.weight).collect();
    weights.sort_unstable_by(f64::total_cmp);
    let median = weights[weights.len() / 2];

    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent_time: f64 = stacks
        .iter()
        .take(top_10_percent_count)
        .map(|s| s.weight)
        .sum();

    TimeDistribution {
        total_time: total,
        stack_count: count,
        mean_time_per_stack: mean,
        median_time_per_stack: median,
        top_10_percent_time,
        top_10_percent_percentage: percentage_of(top_10_percent_time, total),
    }
}

/// Self-time distribution statistics
///
/// **Public** - returned from calculate_time_distribution
#[derive(Debug, Clone, Default)]
pub struct TimeDistribution {
    /// Total self time across all stacks
    pub total_time: f64,

    /// Number of unique stacks
    pub stack_count: usize,

    pub mean_time_per_stack: f64,
    pub median_time_per_stack: f64,

    /// Self time of the heaviest 10% of stacks
    pub top_10_percent_time: f64,

    /// Percentage of total time in top 10%
    pub top_10_percent_percentage: f64,
}

impl TimeDistribution {
    /// Returns true if top 10% of stacks hold >80% of the time
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {:.1} | Stacks: {} | Mean: {:.1} | Median: {:.1} | Top 10%: {:.1}%",
            self.total_time,
            self.stack_count,
            self.mean_time_per_stack,
            self.median_time_per_stack,
            self.top_10_percent_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_hot_paths() {
        let stacks = vec![
            CollapsedStack::new("main;execute", 5000.0),
            CollapsedStack::new("main;storage", 3000.0),
            CollapsedStack::new("main;compute", 2000.0),
        ];

        let hot_paths = calculate_hot_paths(&stacks, 10000.0, 2);

        assert_eq!(hot_paths.len(), 2);
        assert_eq!(hot_paths[0].stack, "main;execute");
        assert_eq!(hot_paths[0].self_time, 5000.0);
        assert_eq!(hot_paths[0].percentage, 50.0);
    }

    #[test]
    fn test_hot_paths_skip_non_positive() {
        let stacks = vec![
            CollapsedStack::new("a", 10.0),
            CollapsedStack::new("a;b", 0.0),
            CollapsedStack::new("c", -2.0),
        ];
        assert_eq!(calculate_hot_paths(&stacks, 10.0, 10).len(), 1);
    }

    #[test]
    fn test_calculate_time_distribution() {
        let stacks = vec![
            CollapsedStack::new("stack1", 8000.0),
            CollapsedStack::new("stack2", 1000.0),
            CollapsedStack::new("stack3", 500.0),
            CollapsedStack::new("stack4", 500.0),
        ];

        let dist = calculate_time_distribution(&stacks);

        assert_eq!(dist.total_time, 10000.0);
        assert_eq!(dist.stack_count, 4);
        assert_eq!(dist.mean_time_per_stack, 2500.0);
        assert_eq!(dist.median_time_per_stack, 1000.0);
        assert!(!dist.is_highly_concentrated());
    }

    #[test]
    fn test_time_distribution_empty() {
        let dist = calculate_time_distribution(&[]);
        assert_eq!(dist.total_time, 0.0);
        assert_eq!(dist.stack_count, 0);
    }
}
