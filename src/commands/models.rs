use crate::utils::config::DEFAULT_TOP_PATHS;
use std::path::PathBuf;

/// Arguments for the flame command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct FlameArgs {
    /// Chrome trace-event JSON to read
    pub trace: PathBuf,

    /// Output path for JSON profile
    pub output_json: PathBuf,

    /// Output path for nested flame JSON (optional)
    pub output_nested: Option<PathBuf>,

    /// Output path for folded stacks (optional)
    pub output_folded: Option<PathBuf>,

    /// Number of top hot paths to include per tree
    pub top_paths: usize,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Keep raw timestamps instead of starting at 0
    pub absolute: bool,
}

impl Default for FlameArgs {
    fn default() -> Self {
        Self {
            trace: PathBuf::new(),
            output_json: PathBuf::from("profile.json"),
            output_nested: None,
            output_folded: None,
            top_paths: DEFAULT_TOP_PATHS,
            print_summary: false,
            absolute: false,
        }
    }
}

/// Arguments for the replay command
#[derive(Debug, Clone, Default)]
pub struct ReplayArgs {
    /// Chrome trace-event JSON to read
    pub trace: PathBuf,

    /// Keep raw timestamps instead of starting at 0
    pub absolute: bool,

    /// Read commands from this file instead of stdin
    pub script: Option<PathBuf>,
}
