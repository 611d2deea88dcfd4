use tracing::{info, warn};

use crate::observability::PotMetrics;

/// Resolves on Ctrl-C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Final bookkeeping once the server stopped accepting requests
///
/// Pending brew timers are simply dropped with the runtime; the pot keeps no
/// state across restarts.
pub fn finish_shutdown(metrics: &PotMetrics) {
    info!("Initiating graceful shutdown");
    metrics.log_stats();
    info!("Graceful shutdown completed successfully");
}
