//! Common Error Types for MerchLink
//!
//! Provides unified error handling across all modules.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::session::store::StoreError;
use crate::session::token::EncodeError;

/// Root error type for the MerchLink service
#[derive(Debug, Error)]
pub enum MerchLinkError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Persisted merchant record errors
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Connect-token encoding errors
    #[error("token encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using MerchLinkError
pub type Result<T> = std::result::Result<T, MerchLinkError>;
