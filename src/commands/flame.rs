//! Flame command implementation.
//!
//! The flame command:
//! 1. Reads the trace and reconstructs one call tree per (pid, tid)
//! 2. Aggregates flame trees
//! 3. Flattens records and ranks hot paths
//! 4. Writes output files

use super::models::FlameArgs;
use super::utils::load_forest;
use crate::aggregator::{aggregate_forest, build_collapsed_stacks, calculate_time_distribution};
use crate::flamegraph::{build_tree_profile, generate_text_summary};
use crate::output::{write_folded, write_nested_flames, write_profile};
use crate::parser::{to_profile, RejectedTreeEntry};
use crate::utils::config::MAX_TOP_PATHS;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the flame command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace read or parse errors
/// * Every call tree improperly nested
/// * File write errors
pub fn execute_flame(args: FlameArgs) -> Result<()> {
    let start_time = Instant::now();
    info!("Building flame profile for: {}", args.trace.display());

    // Step 1: Parse and reconstruct
    info!("Step 1/4: Reading trace and reconstructing call trees...");
    let (parsed, forest, rejected) = load_forest(&args.trace, args.absolute)?;
    if !rejected.is_empty() {
        warn!(
            "{} of {} call trees rejected for bad nesting",
            rejected.len(),
            rejected.len() + forest.len()
        );
    }

    // Step 2: Aggregate
    info!("Step 2/4: Aggregating {} call trees...", forest.len());
    let flames = aggregate_forest(&forest);

    // Step 3: Flatten and rank
    info!("Step 3/4: Calculating top {} hot paths per tree...", args.top_paths);
    let trees: Vec<_> = forest
        .trees()
        .zip(&flames)
        .map(|((_, tree), flame)| build_tree_profile(tree, flame, args.top_paths))
        .collect();

    for tree in &trees {
        if !tree.anomalies.is_empty() {
            warn!(
                "{} has {} flame nodes with negative self size",
                tree.key,
                tree.anomalies.len()
            );
        }
        for (i, path) in tree.hot_paths.iter().take(3).enumerate() {
            debug!(
                "  {} #{}: {:.1} ({:.1}%): {}",
                tree.key,
                i + 1,
                path.self_time,
                path.percentage,
                path.stack
            );
        }
    }

    // Step 4: Write outputs
    info!("Step 4/4: Writing output files...");
    let source = args.trace.display().to_string();
    let mut profile = to_profile(&source, &parsed, trees);
    profile.rejected = rejected
        .iter()
        .map(|tree| RejectedTreeEntry {
            key: tree.key.to_string(),
            reason: tree.error.to_string(),
        })
        .collect();

    write_profile(&profile, &args.output_json).context("Failed to write profile JSON")?;
    info!("✓ Profile written to: {}", args.output_json.display());

    if let Some(path) = &args.output_nested {
        write_nested_flames(&flames, path).context("Failed to write nested flame JSON")?;
        info!("✓ Nested flame data written to: {}", path.display());
    }

    if let Some(path) = &args.output_folded {
        write_folded(&flames, path).context("Failed to write folded stacks")?;
        info!("✓ Folded stacks written to: {}", path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("PROFILE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Trace:  {}", source);
        println!("Trees:  {}", forest.len());
        println!("Spans:  {}", forest.span_count());
        for flame in &flames {
            let stacks = build_collapsed_stacks(flame);
            let distribution = calculate_time_distribution(&stacks);
            println!("\n[{}] {}", flame.key, distribution.summary());
            println!("{}", generate_text_summary(&stacks, 10, flame.total_time()));
        }
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Flame profile completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Validate flame arguments
///
/// **Public** - can be called before execute_flame for early validation
pub fn validate_args(args: &FlameArgs) -> Result<()> {
    if args.trace.as_os_str().is_empty() {
        anyhow::bail!("Trace path cannot be empty");
    }

    if !args.trace.exists() {
        anyhow::bail!("Trace file not found: {}", args.trace.display());
    }

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    if args.top_paths > MAX_TOP_PATHS {
        anyhow::bail!("top_paths is too large (max {})", MAX_TOP_PATHS);
    }

    for output in [args.output_nested.as_ref(), args.output_folded.as_ref()]
        .into_iter()
        .flatten()
    {
        if output == &args.output_json {
            anyhow::bail!(
                "Output {} is used for more than one format",
                output.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_args() {
        let trace = tempfile::NamedTempFile::new().unwrap();
        let args = FlameArgs {
            trace: trace.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());

        let missing = FlameArgs {
            trace: PathBuf::from("/definitely/not/here.json"),
            ..Default::default()
        };
        assert!(validate_args(&missing).is_err());

        let zero = FlameArgs {
            top_paths: 0,
            ..args.clone()
        };
        assert!(validate_args(&zero).is_err());

        let clash = FlameArgs {
            output_folded: Some(PathBuf::from("profile.json")),
            ..args
        };
        assert!(validate_args(&clash).is_err());
    }
}
