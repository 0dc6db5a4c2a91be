//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use response_timing::Unit;

/// Keyboard and mouse response timing.
///
/// Collects key presses, mouse clicks and pointer motion with timestamps
/// relative to a resettable zero point.
#[derive(Debug, Parser)]
#[command(name = "response-timing", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the collected records to this path.
    #[arg(long, global = true)]
    pub export: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run reaction-time trials on the keyboard.
    React(ReactArgs),

    /// Record mouse clicks and motion for a fixed period.
    Track(TrackArgs),

    /// Correlate a JSON recording of raw events.
    Replay {
        /// Recording to read.
        file: PathBuf,
    },

    /// Show the effective configuration.
    Config {
        /// Save the effective configuration to the default location.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Args)]
pub struct ReactArgs {
    /// Number of trials.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub trials: u32,

    /// Keys that count as a response; defaults to the configured key list.
    #[arg(short, long, value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Give up on a trial after this many seconds.
    #[arg(short, long)]
    pub timeout: Option<f64>,
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Recording period in seconds.
    #[arg(short, long, default_value_t = 10.0)]
    pub seconds: f64,

    /// Reconstruct drag paths for clicks.
    #[arg(long)]
    pub drag: bool,

    /// Unit of reported positions (pix, cm, deg, norm).
    #[arg(short, long)]
    pub units: Option<Unit>,
}
