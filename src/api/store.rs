//! Last published snapshot, shared with the API handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;

use crate::dynamic::Message;

/// Lock-free holder of the most recent [`Message`].
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<Message>,
    received: AtomicU64,
    last_update: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored message.
    pub fn update(&self, message: Message) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.current.store(Some(Arc::new(message)));
        self.received.fetch_add(1, Ordering::Relaxed);
        self.last_update.store(now, Ordering::Relaxed);
    }

    pub fn latest(&self) -> Option<Arc<Message>> {
        self.current.load_full()
    }

    /// Messages received since startup.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Unix time of the last update, `None` before the first.
    pub fn last_update(&self) -> Option<u64> {
        match self.received() {
            0 => None,
            _ => Some(self.last_update.load(Ordering::Relaxed)),
        }
    }
}

/// Drain the publish channel into `store` until every sender is gone.
pub async fn consume(mut rx: mpsc::Receiver<Message>, store: Arc<SnapshotStore>) {
    while let Some(message) = rx.recv().await {
        tracing::info!(
            provider = %message.provider_name,
            instances = message.snapshot.len(),
            "Received configuration snapshot"
        );
        store.update(message);
    }
    tracing::debug!("Snapshot channel closed");
}
