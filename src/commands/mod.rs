//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod flame;
pub mod models;
pub mod replay;
pub mod utils;

// Re-export main command functions
pub use flame::{execute_flame, validate_args};
pub use models::{FlameArgs, ReplayArgs};
pub use replay::{execute_replay, run_session, ReplayCommand};
pub use utils::{display_schema, display_version, load_forest, validate_profile_file};
