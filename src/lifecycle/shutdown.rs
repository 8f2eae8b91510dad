//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals::wait_for_signal;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the server and any background tasks
/// subscribe to.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger shutdown when the process receives SIGINT or SIGTERM.
    pub fn trigger_on_signal(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            tracing::info!(signal, "Shutdown signal received");
            this.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `rx` fires or its sender is gone.
pub async fn recv(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
