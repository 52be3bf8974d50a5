//! Transfer-Log Expiry
//!
//! Fires a one-shot cleanup per transfer batch: after the configured delay
//! the merchant's transfer log is cleared and persisted. Schedules are
//! coalesced per identity, so transfers arriving inside the window share one
//! eventual clear. Schedules are lost on restart; the log then persists
//! until the next transfer triggers a fresh one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::store::SharedMerchantStore;

/// Default delay before a transfer batch expires
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(120);

/// Schedules coalesced one-shot transfer-log clears
#[derive(Clone)]
pub struct ExpiryScheduler {
    store: SharedMerchantStore,
    delay: Duration,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ExpiryScheduler {
    pub fn new(store: SharedMerchantStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Schedule a clear of `identity`'s transfer log after the delay
    ///
    /// A no-op when a clear is already pending for that identity.
    pub async fn schedule(&self, identity: String) {
        {
            let mut pending = self.pending.lock().await;
            if !pending.insert(identity.clone()) {
                tracing::debug!(identity = %identity, "expiry already pending, coalescing");
                return;
            }
        }

        let scheduler = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(scheduler.delay).await;
            scheduler.fire(&identity).await;
        });
    }

    /// Number of identities with a pending clear
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn fire(&self, identity: &str) {
        self.pending.lock().await.remove(identity);

        let mut store = self.store.write().await;
        let mut record = match store.get(identity) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "expiry skipped, record unavailable");
                return;
            }
        };

        if record.transfers.is_empty() {
            return;
        }

        let cleared = record.transfers.len();
        record.transfers.clear();
        match store.save(identity, record) {
            Ok(()) => {
                tracing::info!(identity = %identity, cleared, "expired transfer batch");
            }
            Err(e) => {
                tracing::error!(identity = %identity, error = %e, "failed to persist transfer expiry");
            }
        }
    }
}
