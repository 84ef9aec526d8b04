//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oustdom")]
#[command(author, version, about = "Blocklist fetcher and merger for DNS resolver filters")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only, for cron/systemd timer)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and merge on an interval until stopped
    Run,

    /// Run a single reload cycle and exit
    Once,

    /// Show version
    Version,
}
