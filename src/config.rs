//! Environment-based Configuration for MerchLink
//!
//! # Environment Variables
//!
//! - `MERCHLINK_PORT` - HTTP/WebSocket listen port (default: 3000)
//! - `MERCHLINK_DATA_DIR` - Directory for persisted merchant records (default: "./data")
//! - `MERCHLINK_EXPIRY_SECS` - Transfer-log expiry delay in seconds (default: 120)
//! - `MERCHLINK_LOG_LEVEL` - Logging level (trace, debug, info, warn, error; default: info)
//! - `MERCHLINK_LOG_JSON` - Set to "1" for JSON log output

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct MerchLinkConfig {
    /// HTTP/WebSocket listen port
    pub port: u16,

    /// Directory holding one persisted record per merchant identity
    pub data_dir: PathBuf,

    /// Delay before a merchant's transfer batch is cleared
    pub expiry_secs: u64,

    /// Log level
    pub log_level: String,

    /// Emit JSON-formatted logs
    pub log_json: bool,
}

impl Default for MerchLinkConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: PathBuf::from("./data"),
            expiry_secs: 120,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl MerchLinkConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var("MERCHLINK_PORT", env::var("MERCHLINK_PORT").ok())?
            .unwrap_or(defaults.port);

        let data_dir = env::var("MERCHLINK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let expiry_secs = parse_var("MERCHLINK_EXPIRY_SECS", env::var("MERCHLINK_EXPIRY_SECS").ok())?
            .unwrap_or(defaults.expiry_secs);
        if expiry_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "MERCHLINK_EXPIRY_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let log_level = env::var("MERCHLINK_LOG_LEVEL").unwrap_or(defaults.log_level);
        let log_json = env::var("MERCHLINK_LOG_JSON").map(|v| v == "1").unwrap_or(false);

        Ok(Self {
            port,
            data_dir,
            expiry_secs,
            log_level,
            log_json,
        })
    }
}

/// Parse an optional environment value, reporting the variable name on failure
fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), value)),
        None => Ok(None),
    }
}
