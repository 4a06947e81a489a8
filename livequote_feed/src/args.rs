//! Command-line arguments for the feed simulator.
use std::path::PathBuf;

use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Local IP address to bind; the port is always `FEED_PORT`.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Definition catalog whose instruments are simulated. Without it a small
    /// built-in currency and gold set is used.
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// Delay between two generated batches, in milliseconds.
    #[clap(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// Seconds without a ping after which a client is forgotten.
    #[clap(long, default_value_t = 5)]
    pub timeout_secs: u64,
}
