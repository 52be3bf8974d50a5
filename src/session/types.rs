//! Merchant Session Types
//!
//! The persisted merchant record, its transfer log entries, and the event
//! types carried over the realtime channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted state for one merchant identity
///
/// `token` is the cached connect token; `None` means "must regenerate".
/// `identity` is the identity the token was last generated for - a mismatch
/// with the resolver's current identity forces regeneration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Cached connect token (opaque encoder output)
    pub token: Option<String>,
    /// Identity this record was last generated for
    pub identity: Option<String>,
    /// Append-only transfer log, cleared in bulk by expiry
    #[serde(default)]
    pub transfers: Vec<TransferRecord>,
}

/// One relayed file, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub file_name: String,
    /// Opaque payload (base64 blob as sent by the customer)
    pub file_data: String,
    pub timestamp: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a record stamped with the current instant
    pub fn new(file_name: String, file_data: String) -> Self {
        Self {
            file_name,
            file_data,
            timestamp: Utc::now(),
        }
    }
}

/// Merchant presence as seen by room members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MerchantStatus {
    Online,
    Offline,
}

/// Event delivered to realtime connections
///
/// Serialized as `{"event": "...", "data": ...}` text frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    MerchantStatus(MerchantStatus),
    ReceiveFile(TransferRecord),
    Error(String),
}

/// Service statistics for the monitoring endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayStats {
    /// Merchant records held in the in-memory cache
    pub merchants_cached: usize,
    /// Rooms with at least one live connection
    pub rooms_online: usize,
    /// Merchants with a transfer batch awaiting expiry
    pub pending_expiries: usize,
}
