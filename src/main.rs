//! oustdom - Blocklist Fetcher for DNS Filters
//!
//! Downloads domain blocklists on an interval and merges them into a single
//! deduplicated file for a downstream resolver.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oustdom::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run => oustdom::commands::run::run().await,
        Commands::Once => oustdom::commands::once::run().await,
        Commands::Version => {
            println!("oustdom {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
