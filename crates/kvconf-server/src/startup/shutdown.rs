//! Graceful shutdown handling
//!
//! SIGINT/SIGTERM are turned into a broadcast signal; the HTTP server is then
//! stopped gracefully, letting in-flight requests finish within the
//! configured shutdown timeout.

use actix_web::dev::Server;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Shutdown signal sender and receiver
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Get a receiver for shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Trigger shutdown
    pub fn shutdown(&self) {
        let _ = self.sender.send(());
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a listener for Ctrl+C and SIGTERM.
///
/// Returns the shutdown signal it triggers. If a handler cannot be installed
/// the failure is logged and that source never fires.
pub fn wait_for_shutdown_signal() -> ShutdownSignal {
    let shutdown = ShutdownSignal::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
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
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        shutdown_clone.shutdown();
    });

    shutdown
}

/// Run the server until it exits on its own or the signal fires
pub async fn run_until_shutdown(server: Server, signal: &ShutdownSignal) -> std::io::Result<()> {
    let handle = server.handle();
    let mut receiver = signal.subscribe();

    tokio::spawn(async move {
        if receiver.recv().await.is_ok() {
            info!("Stopping HTTP server gracefully");
            handle.stop(true).await;
        }
    });

    server.await?;
    info!("Shutdown complete");
    Ok(())
}
