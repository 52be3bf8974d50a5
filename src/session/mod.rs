//! Merchant Session & Presence Coordination
//!
//! Core of the service: everything keyed by the merchant identity that the
//! transport layer resolves per request or connection.
//!
//! ## Components
//!
//! - **types**: persisted merchant record, transfer log entries, realtime events
//! - **store**: per-merchant durable JSON record with in-memory cache
//! - **token**: connect-token regeneration policy and the encoder seam
//! - **presence**: room membership, online/offline queries, room-scoped fan-out
//! - **relay**: append + persist + broadcast + schedule-expiry for transfers
//! - **expiry**: coalesced one-shot clearing of a merchant's transfer batch
//!
//! ## Flow Overview
//!
//! 1. The transport resolves the merchant identity (see `crate::identity`)
//! 2. `store` loads or creates the merchant's record
//! 3. `token::ensure_token` regenerates the connect token when stale
//! 4. Customers join the merchant's `presence` room via the scanned token
//! 5. `relay` persists inbound transfers and fans them out to the room
//! 6. `expiry` clears the transfer batch after the configured delay

pub mod expiry;
pub mod presence;
pub mod relay;
pub mod store;
pub mod token;
pub mod types;

// Re-exports
pub use expiry::{ExpiryScheduler, DEFAULT_EXPIRY};
pub use presence::PresenceRegistry;
pub use relay::TransferRelay;
pub use store::{sanitize_identity, MerchantStore, SharedMerchantStore, StoreError};
pub use token::{connect_url, ensure_token, Base64TokenEncoder, EncodeError, TokenEncoder};
pub use types::{MerchantRecord, MerchantStatus, OutboundEvent, RelayStats, TransferRecord};
