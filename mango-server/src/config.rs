//! Server configuration, read from the environment at startup.

use mango_crypto::{CryptoError, EncryptionKey};
use mango_storage::DEFAULT_COLLECTION;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Hex-encoded 32-byte key. Required.
pub const ENCRYPTION_KEY_VAR: &str = "ENCRYPTION_KEY";
pub const DB_PATH_VAR: &str = "MANGO_DB_PATH";
pub const COLLECTION_VAR: &str = "MANGO_COLLECTION";
pub const BIND_ADDR_VAR: &str = "MANGO_BIND_ADDR";
pub const REQUEST_TIMEOUT_VAR: &str = "MANGO_REQUEST_TIMEOUT_SECS";
pub const SHUTDOWN_TIMEOUT_VAR: &str = "MANGO_SHUTDOWN_TIMEOUT_SECS";
pub const SITE_INDEX_VAR: &str = "MANGO_SITE_INDEX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{ENCRYPTION_KEY_VAR} environment variable not set")]
    MissingKey,

    #[error("{ENCRYPTION_KEY_VAR} is invalid: {0}")]
    InvalidKey(#[from] CryptoError),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the server needs except the encryption key, which is loaded
/// separately by [`load_encryption_key`] so it never sits in a serializable
/// struct.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// DuckDB database file, or `:memory:`.
    pub db_path: PathBuf,

    /// Collection (table) holding the credentials.
    pub collection: String,

    /// Deadline applied to each request's vault operation.
    pub request_timeout_secs: u64,

    /// How long in-flight requests get to finish after a shutdown signal.
    pub shutdown_timeout_secs: u64,

    /// Keep an in-process index of stored sites. Only safe when this process
    /// is the sole writer of the collection.
    pub site_index: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: PathBuf::from("mango.duckdb"),
            collection: DEFAULT_COLLECTION.to_string(),
            request_timeout_secs: 10,
            shutdown_timeout_secs: 5,
            site_index: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from `lookup`, falling back to the defaults for any
    /// variable it does not supply.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(collection) = lookup(COLLECTION_VAR) {
            if collection.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: COLLECTION_VAR,
                    value: collection,
                    reason: "must not be empty",
                });
            }
            config.collection = collection;
        }
        if let Some(value) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout_secs = parse_secs(REQUEST_TIMEOUT_VAR, value)?;
        }
        if let Some(value) = lookup(SHUTDOWN_TIMEOUT_VAR) {
            config.shutdown_timeout_secs = parse_secs(SHUTDOWN_TIMEOUT_VAR, value)?;
        }
        if let Some(value) = lookup(SITE_INDEX_VAR) {
            config.site_index = parse_flag(SITE_INDEX_VAR, value)?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Reads and validates the encryption key. A missing or malformed key is
/// fatal at startup.
pub fn load_encryption_key(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EncryptionKey, ConfigError> {
    let encoded = lookup(ENCRYPTION_KEY_VAR)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingKey)?;
    Ok(EncryptionKey::from_hex(&encoded)?)
}

fn parse_secs(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "must be at least 1 second",
        }),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected a whole number of seconds",
        }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected true or false",
        }),
    }
}
