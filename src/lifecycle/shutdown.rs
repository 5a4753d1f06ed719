//! Shutdown coordination for the provider.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            fired: false,
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One task's view of the shutdown signal.
///
/// Once observed, the signal stays fired. Dropping the [`Shutdown`]
/// coordinator counts as a shutdown.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    fired: bool,
}

impl ShutdownSignal {
    /// Wait for shutdown. Cancel-safe, usable as a `select!` branch.
    pub async fn recv(&mut self) {
        if self.fired {
            return;
        }
        // Ok, Lagged and Closed all mean a shutdown was requested or the
        // coordinator is gone.
        let _ = self.rx.recv().await;
        self.fired = true;
    }

    /// Non-blocking check.
    pub fn is_shutdown(&mut self) -> bool {
        if !self.fired {
            match self.rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => self.fired = true,
            }
        }
        self.fired
    }
}
