//! Shutdown coordination for the proxy.

use tokio::sync::broadcast;

use crate::lifecycle::signals::terminate_signal;

/// Coordinator for graceful shutdown.
///
/// `HttpServer::run` listens on a receiver; tests and embedders call
/// `trigger` instead of sending an OS signal.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when `trigger` fires, the coordinator is dropped, or the process
/// receives SIGINT/SIGTERM.
pub async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = rx.recv() => tracing::info!("Shutdown triggered"),
        _ = terminate_signal() => {}
    }
}
