//! JSON profile and nested flame output.
//!
//! Writes Profile structs and nested flame trees to JSON files with
//! proper formatting.

use crate::aggregator::{FlameNode, FlameTree};
use crate::parser::schema::Profile;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a profile to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `profile` - Profile data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_profile(profile: &Profile, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing profile to: {}", output_path.display());

    write_json(profile, output_path)?;

    info!(
        "Profile written successfully ({} bytes)",
        calculate_file_size(output_path)
    );
    Ok(())
}

/// Write nested flame trees as one object keyed `p{pid}_t{tid}`
///
/// **Public** - consumed by nested flame viewers
pub fn write_nested_flames(
    flames: &[FlameTree],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing nested flame data to: {}", output_path.display());

    write_json(&nested_flames(flames), output_path)
}

/// Nested flame trees keyed by tree key
pub fn nested_flames(flames: &[FlameTree]) -> BTreeMap<String, &FlameNode> {
    flames
        .iter()
        .map(|flame| (flame.key.to_string(), &flame.root))
        .collect()
}

/// Serialize pretty JSON to a file, creating parent directories
///
/// **Private** - shared by the writers above
fn write_json<T: serde::Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<(), OutputError> {
    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;

    Ok(())
}

/// Validate that output path is writable
///
/// **Private** - internal validation
pub(crate) fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

pub(crate) fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a profile from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading profile from: {}", input_path.display());

    let file = File::open(input_path)?;
    let profile: Profile = serde_json::from_reader(file)?;

    debug!(
        "Profile loaded: version {}, {} trees",
        profile.version,
        profile.trees.len()
    );
    Ok(profile)
}
