//! Folded-stack output writer.
//!
//! Writes one `a;b;c weight` line per call path, the input format of
//! external flamegraph renderers.

use super::json::{create_parent_dirs, validate_output_path};
use crate::aggregator::{build_collapsed_stacks, FlameTree};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Folded lines of every flame tree
///
/// With several trees each stack is prefixed by its tree key so the
/// renderer keeps threads apart. Paths whose rounded self time is not
/// positive are left out.
pub fn folded_lines(flames: &[FlameTree]) -> Vec<String> {
    let prefix_keys = flames.len() > 1;
    let mut lines = Vec::new();

    for flame in flames {
        for stack in build_collapsed_stacks(flame) {
            let weight = stack.weight.round();
            if weight <= 0.0 {
                continue;
            }
            if prefix_keys {
                lines.push(format!("{};{} {}", flame.key, stack.stack, weight as u64));
            } else {
                lines.push(stack.to_line());
            }
        }
    }

    lines
}

/// Write folded stacks to a file
///
/// **Public** - main entry point for folded output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_folded(flames: &[FlameTree], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing folded stacks to: {}", output_path.display());

    validate_output_path(output_path)?;
    if output_path.extension().map_or(true, |ext| ext != "folded") {
        debug!(
            "File does not have .folded extension: {}",
            output_path.display()
        );
    }
    create_parent_dirs(output_path)?;

    let lines = folded_lines(flames);
    let mut writer = BufWriter::new(File::create(output_path)?);
    for line in &lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    info!("Folded stacks written successfully ({} lines)", lines.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::calltree::CallTree;
    use crate::parser::Span;

    fn flame(tid: u64) -> FlameTree {
        let tree = CallTree::from_spans(
            1,
            tid,
            vec![
                Span::new(1, tid, "main", 0.0, 10.0),
                Span::new(1, tid, "work", 2.0, 8.0),
                Span::new(1, tid, "tick", 9.0, 9.2),
            ],
        )
        .unwrap();
        aggregate(&tree)
    }

    #[test]
    fn test_single_tree_lines() {
        let lines = folded_lines(&[flame(1)]);
        assert_eq!(lines, vec!["main;work 6", "main 4"]);
    }

    #[test]
    fn test_multiple_trees_are_prefixed() {
        let lines = folded_lines(&[flame(1), flame(2)]);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "p1_t1;main;work 6");
        assert_eq!(lines[3], "p1_t2;main 4");
    }

    #[test]
    fn test_write_folded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out/stacks.folded");

        write_folded(&[flame(1)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "main;work 6\nmain 4\n");
    }
}
