//! One reload cycle: refresh every source, then merge once.

use std::time::Instant;
use tracing::{error, info};

use crate::config::Config;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::merge;
use crate::metrics::Metrics;

/// Run a full reload cycle.
///
/// Sources are fetched sequentially in configuration order. Individual
/// failures are logged and recorded in the status gauge; the merge runs
/// regardless, so the target keeps tracking whatever caches exist.
pub async fn reload_all(fetcher: &Fetcher, config: &Config, metrics: &Metrics) {
    for source in &config.sources {
        let start = Instant::now();
        let result = fetcher.refresh(config, source).await;
        let elapsed = start.elapsed();
        metrics.observe_reload_time(&source.name, elapsed.as_secs_f64());

        match result {
            Ok(FetchOutcome::Updated) => {
                metrics.set_status(&source.name, true);
                metrics.mark_fetched(&source.name);
                info!("{}: list reloaded in {:.2?}", source.name, elapsed);
            }
            Ok(FetchOutcome::NotModified) => {
                metrics.set_status(&source.name, true);
                info!("{}: list unchanged", source.name);
            }
            Err(e) => {
                metrics.set_status(&source.name, false);
                error!("{} ({}): reload failed: {e}", source.name, source.url);
            }
        }
    }

    if let Err(e) = merge::merge(config, metrics) {
        error!("Failed to merge lists: {e:#}");
    }
}
