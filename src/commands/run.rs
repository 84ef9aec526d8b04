//! Run command implementation: the long-running reload loop.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::lock::LockGuard;
use crate::metrics::Metrics;
use crate::signal::shutdown_signal;
use crate::utils::{format_count, remove_stale_temp_files};
use crate::{reload, server};

/// Run the reload loop until SIGINT/SIGTERM.
///
/// Startup failures (configuration, lock, metrics bind) abort the process;
/// everything after the first loop iteration is recoverable and only logged.
pub async fn run() -> Result<()> {
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.temp_dir).with_context(|| {
        format!(
            "Failed to create working directory {}",
            config.temp_dir.display()
        )
    })?;

    let _lock = LockGuard::acquire(&config.temp_dir)?;

    match remove_stale_temp_files(&config.temp_dir) {
        Ok(0) => {}
        Ok(n) => info!(
            "removed {n} stale temp files from {}",
            config.temp_dir.display()
        ),
        Err(e) => warn!("Failed to sweep stale temp files: {}", e),
    }

    let metrics = Arc::new(Metrics::new()?);

    if let Some(addr) = config.listen_addr {
        let listener = server::bind(addr).await?;
        let server_metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            if let Err(e) = server::serve_on(listener, server_metrics).await {
                error!("metrics server failed: {e:#}");
                std::process::exit(1);
            }
        });
    }

    let fetcher = Fetcher::new()?;
    info!(
        "watching {} lists every {:?}, publishing to {}",
        format_count(config.sources.len()),
        config.interval,
        config.target_file.display()
    );

    let mut shutdown = Box::pin(shutdown_signal());
    loop {
        reload::reload_all(&fetcher, &config, &metrics).await;

        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = &mut shutdown => break,
        }
    }

    info!("shutdown complete");
    Ok(())
}
