//! Calltrace Studio CLI
//!
//! Reconstructs call trees from span traces, writes flame profiles and
//! replays recorded executions forward and backward.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use calltrace_studio::commands::{
    display_schema, display_version, execute_flame, execute_replay, validate_args,
    validate_profile_file, FlameArgs, ReplayArgs,
};
use calltrace_studio::utils::config::DEFAULT_TOP_PATHS;

/// Calltrace Studio - call trees, flame profiles and replay for span traces
#[derive(Parser, Debug)]
#[command(name = "calltrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a flame profile from a trace
    Flame {
        /// Chrome trace-event JSON file
        #[arg(short, long)]
        trace: PathBuf,

        /// Output path for JSON profile
        #[arg(short, long, default_value = "profile.json")]
        output: PathBuf,

        /// Output path for nested flame JSON (optional)
        #[arg(long)]
        nested: Option<PathBuf>,

        /// Output path for folded stacks (optional)
        #[arg(long)]
        folded: Option<PathBuf>,

        /// Number of top hot paths to include per tree
        #[arg(long, default_value_t = DEFAULT_TOP_PATHS)]
        top_paths: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Keep raw timestamps instead of starting at 0
        #[arg(long)]
        absolute: bool,
    },

    /// Replay a trace interactively
    Replay {
        /// Chrome trace-event JSON file
        #[arg(short, long)]
        trace: PathBuf,

        /// Keep raw timestamps instead of starting at 0
        #[arg(long)]
        absolute: bool,

        /// Read commands from a file instead of stdin
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Validate a profile JSON file
    Validate {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Flame {
            trace,
            output,
            nested,
            folded,
            top_paths,
            summary,
            absolute,
        } => {
            let args = FlameArgs {
                trace,
                output_json: output,
                output_nested: nested,
                output_folded: folded,
                top_paths,
                print_summary: summary,
                absolute,
            };

            validate_args(&args)?;
            execute_flame(args)?;
        }

        Commands::Replay {
            trace,
            absolute,
            script,
        } => {
            execute_replay(ReplayArgs {
                trace,
                absolute,
                script,
            })?;
        }

        Commands::Validate { file } => {
            validate_profile_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
