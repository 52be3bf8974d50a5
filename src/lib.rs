//! MerchLink - Merchant Session & Presence Coordinator
//!
//! Relays files from customers to a merchant endpoint over a realtime
//! channel, scoped to a location identified by a stable hardware address.
//! The merchant is shown a scannable connect code; customers who scan it
//! join the merchant's room and can send files that appear on the
//! merchant's dashboard.
//!
//! ## Core components
//!
//! 1. **IdentityResolver** - stable merchant identity from the host's
//!    hardware network address
//! 2. **MerchantStore** - per-merchant persisted record with in-memory cache
//! 3. **TokenCache** - connect-token invalidation and regeneration
//! 4. **PresenceRegistry** - room membership and online/offline tracking
//! 5. **TransferRelay** - persist-then-broadcast relay of transfer events
//! 6. **ExpiryScheduler** - coalesced batch expiry of transfer logs

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod session;

// Re-exports: configuration and errors
pub use config::{ConfigError, MerchLinkConfig};
pub use error::MerchLinkError;

// Re-exports: identity
pub use identity::{IdentityResolver, MacResolver, UNKNOWN_IDENTITY};

// Re-exports: session core
pub use session::{
    connect_url, ensure_token, Base64TokenEncoder, EncodeError, ExpiryScheduler, MerchantRecord,
    MerchantStatus, MerchantStore, OutboundEvent, PresenceRegistry, RelayStats,
    SharedMerchantStore, StoreError, TokenEncoder, TransferRecord, TransferRelay,
};

// Re-exports: API surface
pub use api::{create_router, AppState, SharedAppState};
