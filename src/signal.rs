//! Signal handling for graceful shutdown.

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Resolve once SIGINT or SIGTERM is delivered.
///
/// If signal handlers cannot be registered (e.g., in restricted
/// environments), the future stays pending and shutdown requires killing
/// the process.
pub async fn shutdown_signal() {
    let sigint = signal(SignalKind::interrupt());
    let sigterm = signal(SignalKind::terminate());

    match (sigint, sigterm) {
        (Ok(mut int), Ok(mut term)) => {
            tokio::select! {
                _ = int.recv() => info!("Received SIGINT, shutting down..."),
                _ = term.recv() => info!("Received SIGTERM, shutting down..."),
            }
        }
        (Ok(mut int), Err(e)) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            int.recv().await;
            info!("Received SIGINT, shutting down...");
        }
        (Err(e), Ok(mut term)) => {
            warn!("Failed to register SIGINT handler: {}", e);
            term.recv().await;
            info!("Received SIGTERM, shutting down...");
        }
        (Err(e1), Err(e2)) => {
            warn!("No signal handlers registered ({e1}; {e2}) - graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
