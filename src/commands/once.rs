//! Once command implementation: a single reload cycle for cron or
//! systemd-timer driven setups.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::lock::LockGuard;
use crate::metrics::Metrics;
use crate::reload;
use crate::utils::remove_stale_temp_files;

/// Run one reload cycle and exit.
///
/// Per-source failures follow the same rules as the daemon loop: logged and
/// recorded, never fatal. Only startup problems produce a non-zero exit.
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

    let metrics = Metrics::new()?;
    let fetcher = Fetcher::new()?;

    reload::reload_all(&fetcher, &config, &metrics).await;

    Ok(())
}
