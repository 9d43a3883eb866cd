//! Error types for registry-harvester
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Fetch, Database, Config)
//! - Classification of transient vs. permanent failures for retry logic
//!
//! Note that a missing or malformed detail payload is *not* an error
//! anywhere in this crate: extraction degrades to field defaults by
//! contract (see [`crate::entity`]).

use thiserror::Error;

/// Result type alias for registry-harvester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry-harvester
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "crawl.batch_size")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Listing or lookup fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Transient fetch failures on the listing and lookup APIs
///
/// Detail fetches never produce these: a failed detail request is absorbed
/// as an absent payload by [`crate::registry::RegistryClient::fetch_detail`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request failed at the transport level (connect, DNS, TLS)
    #[error("request failed for {url}: {reason}")]
    Request {
        /// The URL that was requested
        url: String,
        /// Underlying transport failure description
        reason: String,
    },

    /// Server responded with a non-success status code
    #[error("HTTP {status} from {url}")]
    Status {
        /// The HTTP status code returned
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Request exceeded its deadline
    #[error("request timed out for {url}")]
    Timeout {
        /// The URL that was requested
        url: String,
    },

    /// Response body could not be decoded as the expected JSON shape
    #[error("invalid response body from {url}: {reason}")]
    InvalidBody {
        /// The URL that was requested
        url: String,
        /// Decoding failure description
        reason: String,
    },
}

impl FetchError {
    /// Build a `FetchError` from a `reqwest::Error`, preserving the
    /// timeout/transport distinction for retry classification.
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_decode() {
            FetchError::InvalidBody {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let e = FetchError::Status {
            status: 503,
            url: "https://api.example.com/list".to_string(),
        };
        assert_eq!(e.to_string(), "HTTP 503 from https://api.example.com/list");
    }

    #[test]
    fn test_error_from_fetch() {
        let e: Error = FetchError::Timeout {
            url: "https://api.example.com/list".to_string(),
        }
        .into();
        assert!(matches!(e, Error::Fetch(FetchError::Timeout { .. })));
    }

    #[test]
    fn test_database_error_wrapping() {
        let e: Error = DatabaseError::QueryFailed("syntax error".to_string()).into();
        assert_eq!(e.to_string(), "database error: query failed: syntax error");
    }
}
