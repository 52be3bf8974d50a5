//! Transfer Relay
//!
//! Accepts an inbound transfer event for a merchant, appends it to the
//! merchant's persisted record, fans it out to the merchant's room, and
//! schedules the batch expiry. The broadcast happens only after the record
//! is durably persisted, so a room member that receives the event can always
//! re-fetch consistent state.

use super::expiry::ExpiryScheduler;
use super::presence::PresenceRegistry;
use super::store::{SharedMerchantStore, StoreError};
use super::types::{OutboundEvent, RelayStats, TransferRecord};

/// Relays transfer events into a merchant's record and room
#[derive(Clone)]
pub struct TransferRelay {
    store: SharedMerchantStore,
    presence: PresenceRegistry,
    expiry: ExpiryScheduler,
}

impl TransferRelay {
    pub fn new(
        store: SharedMerchantStore,
        presence: PresenceRegistry,
        expiry: ExpiryScheduler,
    ) -> Self {
        Self {
            store,
            presence,
            expiry,
        }
    }

    /// Append a transfer for `identity`, persist, broadcast, schedule expiry
    ///
    /// On persistence failure nothing is appended or broadcast; the error
    /// belongs to the original sender, not the room.
    pub async fn relay(
        &self,
        identity: &str,
        file_name: String,
        file_data: String,
    ) -> Result<TransferRecord, StoreError> {
        let transfer = {
            let mut store = self.store.write().await;
            let mut record = store.get(identity)?;

            let transfer = TransferRecord::new(file_name, file_data);
            record.transfers.push(transfer.clone());
            store.save(identity, record)?;
            transfer
        };

        tracing::info!(
            identity = %identity,
            file_name = %transfer.file_name,
            "relaying file transfer"
        );

        self.presence
            .broadcast(identity, OutboundEvent::ReceiveFile(transfer.clone()))
            .await;
        self.expiry.schedule(identity.to_string()).await;

        Ok(transfer)
    }

    /// Snapshot of relay-wide statistics
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            merchants_cached: self.store.read().await.cached_count(),
            rooms_online: self.presence.room_count().await,
            pending_expiries: self.expiry.pending_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::expiry::DEFAULT_EXPIRY;
    use crate::session::store::MerchantStore;
    use crate::session::types::MerchantStatus;
    use std::fs;
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_relay_appends_persists_and_broadcasts() {
        let dir = tempdir().unwrap();
        let store = MerchantStore::new(dir.path()).unwrap().into_shared();
        let presence = PresenceRegistry::new();
        let expiry = ExpiryScheduler::new(store.clone(), DEFAULT_EXPIRY);
        let relay = TransferRelay::new(store.clone(), presence.clone(), expiry);
        let identity = "aa:bb:cc:dd:ee:ff";

        let (tx, mut rx) = mpsc::unbounded_channel();
        presence.join(identity, Uuid::new_v4(), tx).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundEvent::MerchantStatus(MerchantStatus::Online)
        );

        let transfer = relay
            .relay(identity, "receipt.pdf".to_string(), "cGRm".to_string())
            .await
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundEvent::ReceiveFile(transfer.clone())
        );

        // Durably persisted before the broadcast
        let mut cold = MerchantStore::new(dir.path()).unwrap();
        assert_eq!(cold.get(identity).unwrap().transfers, vec![transfer]);
    }

    #[tokio::test]
    async fn test_relay_is_room_scoped() {
        let dir = tempdir().unwrap();
        let store = MerchantStore::new(dir.path()).unwrap().into_shared();
        let presence = PresenceRegistry::new();
        let expiry = ExpiryScheduler::new(store.clone(), DEFAULT_EXPIRY);
        let relay = TransferRelay::new(store, presence.clone(), expiry);

        let (tx, mut rx) = mpsc::unbounded_channel();
        presence.join("bb:bb:bb:bb:bb:bb", Uuid::new_v4(), tx).await;
        rx.try_recv().unwrap();

        relay
            .relay("aa:aa:aa:aa:aa:aa", "a.txt".to_string(), "YQ==".to_string())
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_persistence_failure_rolls_back_and_skips_broadcast() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("store");
        let store = MerchantStore::new(&data_dir).unwrap().into_shared();
        let presence = PresenceRegistry::new();
        let expiry = ExpiryScheduler::new(store.clone(), DEFAULT_EXPIRY);
        let relay = TransferRelay::new(store.clone(), presence.clone(), expiry.clone());
        let identity = "aa:bb:cc:dd:ee:ff";

        let (tx, mut rx) = mpsc::unbounded_channel();
        presence.join(identity, Uuid::new_v4(), tx).await;
        rx.try_recv().unwrap();

        // Prime the cache, then replace the data directory with a plain
        // file so the save inside relay fails
        store.write().await.get(identity).unwrap();
        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"").unwrap();

        let result = relay
            .relay(identity, "a.txt".to_string(), "YQ==".to_string())
            .await;

        assert!(result.is_err());
        assert!(rx.try_recv().is_err());
        assert!(store.write().await.get(identity).unwrap().transfers.is_empty());
        assert_eq!(expiry.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_schedules_expiry() {
        let dir = tempdir().unwrap();
        let store = MerchantStore::new(dir.path()).unwrap().into_shared();
        let presence = PresenceRegistry::new();
        let expiry = ExpiryScheduler::new(store.clone(), DEFAULT_EXPIRY);
        let relay = TransferRelay::new(store.clone(), presence, expiry.clone());
        let identity = "aa:bb:cc:dd:ee:ff";

        relay
            .relay(identity, "a.txt".to_string(), "YQ==".to_string())
            .await
            .unwrap();
        assert_eq!(expiry.pending_count().await, 1);

        tokio::time::sleep(DEFAULT_EXPIRY + std::time::Duration::from_secs(1)).await;
        assert!(store.write().await.get(identity).unwrap().transfers.is_empty());
    }
}
