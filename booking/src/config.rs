//! Configuration management for the booking client.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Local persistence configuration
    pub storage: StorageConfig,
    /// Seat map generation
    pub seats: SeatConfig,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, without trailing slash
    pub base_url: String,
    /// Base URL that bus picture file names are resolved against
    pub asset_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted session document
    pub dir: PathBuf,
}

/// Seat map generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatConfig {
    /// Seats per bus
    pub count: u32,
    /// Probability that a generated seat is available
    pub availability: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults; call [`Config::validate`]
    /// before use.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api: ApiConfig {
                base_url: lookup("BUSLINE_API_URL")
                    .map_or_else(|| "http://localhost:8000/api".to_string(), |url| {
                        url.trim_end_matches('/').to_string()
                    }),
                asset_url: lookup("BUSLINE_ASSET_URL")
                    .unwrap_or_else(|| "http://localhost:8000/storage/bus_pics".to_string()),
                timeout_secs: lookup("BUSLINE_HTTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            storage: StorageConfig {
                dir: lookup("BUSLINE_STORAGE_DIR")
                    .map_or_else(|| PathBuf::from(".busline"), PathBuf::from),
            },
            seats: SeatConfig {
                count: lookup("BUSLINE_SEAT_COUNT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(40),
                availability: lookup("BUSLINE_SEAT_AVAILABILITY")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.7),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "busline=info".to_string()),
        }
    }

    /// Reject settings the client cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero seat count, an availability
    /// outside `[0, 1]`, a zero timeout, or an empty API URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "BUSLINE_API_URL",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "BUSLINE_HTTP_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.seats.count == 0 {
            return Err(ConfigError::Invalid {
                key: "BUSLINE_SEAT_COUNT",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.seats.availability) {
            return Err(ConfigError::Invalid {
                key: "BUSLINE_SEAT_AVAILABILITY",
                reason: format!("{} is not within [0, 1]", self.seats.availability),
            });
        }
        Ok(())
    }
}
