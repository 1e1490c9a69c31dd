//! Error types for the booking client

use thiserror::Error;

/// Errors that can occur when talking to the booking backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// HTTP request failed (connection refused, timeout, ...)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Credentials rejected or token expired
    #[error("Unauthorized")]
    Unauthorized {
        /// Message from the backend, if it sent one
        message: Option<String>,
    },

    /// Backend returned a non-success status
    #[error("API error (status {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, if present
        message: Option<String>,
    },
}

impl ApiError {
    /// Message to show the user: the backend's own message when it sent one,
    /// `fallback` otherwise
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized { message: Some(message) }
            | Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Errors from local key-value storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document or value is not valid JSON
    #[error("Stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors building a seat inventory
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InventoryError {
    /// A seat map needs at least one seat
    #[error("Seat count must be at least 1")]
    NoSeats,

    /// Availability is a probability
    #[error("Seat availability must be within [0, 1], got {0}")]
    InvalidAvailability(f64),
}

/// Errors in loaded configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A setting holds a value the client cannot run with
    #[error("Invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_wins_over_fallback() {
        let error = ApiError::Api {
            status: 422,
            message: Some("The email has already been taken.".into()),
        };
        assert_eq!(
            error.user_message("Registration failed"),
            "The email has already been taken."
        );
    }

    #[test]
    fn fallback_used_without_backend_message() {
        let error = ApiError::RequestFailed("connection refused".into());
        assert_eq!(error.user_message("Login failed"), "Login failed");

        let blank = ApiError::Unauthorized {
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message("Login failed"), "Login failed");
    }
}
