use log::{error, info};
use std::future::Future;

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = wait_for_ctrl_c(tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// A handler that could not be installed never fires.
async fn wait_for_ctrl_c<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}
